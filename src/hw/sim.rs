// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Simulated register file.
//!
//! Stores every logical register in RAM and models the one piece of hardware behaviour the
//! drivers depend on: the asynchronous clock reports ready only some number of status reads after
//! it has been enabled (or never, to exercise the timeout path).

use crate::hw::regs::{bits::clock_control, Register, RegisterFile};

/// When the simulated clock reports lock after being enabled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockBehavior {
    /// Ready after this many reads of `ClockControl` with the clock enabled. 0 = already ready.
    AfterPolls(u32),
    /// Ready immediately, but only from the n-th time the clock is switched on (1-based).
    OnEnable(u32),
    /// The clock never locks.
    Never,
}

/// In-memory register file.
#[derive(Clone, Debug)]
pub struct SimRegisterFile {
    regs: [u32; Register::COUNT],
    lock: LockBehavior,
    polls_since_enable: u32,
    enables: u32,
    writes: [u32; Register::COUNT],
}

impl SimRegisterFile {
    /// All registers at zero; the clock locks as soon as it is enabled.
    pub fn new() -> Self {
        Self::with_lock(LockBehavior::AfterPolls(0))
    }

    pub fn with_lock(lock: LockBehavior) -> Self {
        Self {
            regs: [0; Register::COUNT],
            lock,
            polls_since_enable: 0,
            enables: 0,
            writes: [0; Register::COUNT],
        }
    }

    /// Start from a clock that is already enabled and ready, as after a reset on HSI.
    pub fn clock_running() -> Self {
        let mut sim = Self::new();
        sim.regs[Register::ClockControl.index()] =
            clock_control::ON.mask() | clock_control::READY.mask();
        sim
    }

    /// Current value of a register without triggering any simulated behaviour.
    #[inline]
    pub fn peek(&self, reg: Register) -> u32 {
        self.regs[reg.index()]
    }

    /// Force a register value without counting it as a write.
    #[inline]
    pub fn poke(&mut self, reg: Register, value: u32) {
        self.regs[reg.index()] = value;
    }

    /// Number of writes (including read-modify-writes) a register has seen.
    #[inline]
    pub fn write_count(&self, reg: Register) -> u32 {
        self.writes[reg.index()]
    }

    /// Copy of the whole register file.
    pub fn snapshot(&self) -> [u32; Register::COUNT] {
        self.regs
    }

    fn poll_clock(&mut self) -> u32 {
        let ctrl = self.regs[Register::ClockControl.index()];
        let enabled = ctrl & clock_control::ON.mask() != 0;
        let ready = ctrl & clock_control::READY.mask() != 0;

        if enabled && !ready {
            let locked = match self.lock {
                LockBehavior::AfterPolls(n) => self.polls_since_enable >= n,
                LockBehavior::OnEnable(n) => self.enables >= n,
                LockBehavior::Never => false,
            };
            if locked {
                self.regs[Register::ClockControl.index()] |= clock_control::READY.mask();
            } else {
                self.polls_since_enable = self.polls_since_enable.saturating_add(1);
            }
        }

        self.regs[Register::ClockControl.index()]
    }
}

impl Default for SimRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile for SimRegisterFile {
    fn read(&mut self, reg: Register) -> u32 {
        match reg {
            Register::ClockControl => self.poll_clock(),
            _ => self.regs[reg.index()],
        }
    }

    fn write(&mut self, reg: Register, mut value: u32) {
        self.writes[reg.index()] += 1;

        if reg == Register::ClockControl {
            let old = self.regs[reg.index()];
            // READY is read-only; turning the clock off drops lock.
            value = (value & !clock_control::READY.mask()) | (old & clock_control::READY.mask());
            if value & !old & clock_control::ON.mask() != 0 {
                self.enables += 1;
            }
            if value & clock_control::ON.mask() == 0 {
                value &= !clock_control::READY.mask();
                self.polls_since_enable = 0;
            }
        }

        self.regs[reg.index()] = value;
    }

    fn apply(&mut self, reg: Register, clear_mask: u32, set_mask: u32) {
        // Status reads inside a read-modify-write are not lock polls.
        let value = self.regs[reg.index()];
        self.write(reg, (value & clear_mask) | set_mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_registers_round_trip() {
        let mut sim = SimRegisterFile::new();
        sim.write(Register::SyncCompare, 0x80);
        assert_eq!(sim.read(Register::SyncCompare), 0x80);
        assert_eq!(sim.write_count(Register::SyncCompare), 1);
        assert_eq!(sim.write_count(Register::AsyncCompare), 0);
    }

    #[test]
    fn clock_locks_after_configured_polls() {
        let mut sim = SimRegisterFile::with_lock(LockBehavior::AfterPolls(3));
        sim.set_bits(Register::ClockControl, clock_control::ON.mask());

        assert!(!sim.is_set(Register::ClockControl, clock_control::READY));
        assert!(!sim.is_set(Register::ClockControl, clock_control::READY));
        assert!(!sim.is_set(Register::ClockControl, clock_control::READY));
        assert!(sim.is_set(Register::ClockControl, clock_control::READY));
    }

    #[test]
    fn clock_locks_on_later_enable() {
        let mut sim = SimRegisterFile::with_lock(LockBehavior::OnEnable(2));
        sim.set_bits(Register::ClockControl, clock_control::ON.mask());
        assert!(!sim.is_set(Register::ClockControl, clock_control::READY));

        sim.clear_bits(Register::ClockControl, clock_control::ON.mask());
        sim.set_bits(Register::ClockControl, clock_control::ON.mask());
        assert!(sim.is_set(Register::ClockControl, clock_control::READY));
    }

    #[test]
    fn disabled_clock_never_locks() {
        let mut sim = SimRegisterFile::new();
        for _ in 0..10 {
            assert!(!sim.is_set(Register::ClockControl, clock_control::READY));
        }
    }

    #[test]
    fn ready_bit_is_read_only() {
        let mut sim = SimRegisterFile::with_lock(LockBehavior::Never);
        sim.write(
            Register::ClockControl,
            clock_control::ON.mask() | clock_control::READY.mask(),
        );
        assert!(!sim.is_set(Register::ClockControl, clock_control::READY));
    }

    #[test]
    fn switching_clock_off_drops_lock() {
        let mut sim = SimRegisterFile::clock_running();
        assert!(sim.is_set(Register::ClockControl, clock_control::READY));

        sim.clear_bits(Register::ClockControl, clock_control::ON.mask());
        assert_eq!(sim.peek(Register::ClockControl), 0);
    }
}
