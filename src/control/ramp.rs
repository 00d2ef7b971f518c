// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Duty-cycle sweep used during bring-up.
//!
//! Counts up from zero to full duty and wraps back to zero, forever. Useful for checking the main
//! drive on a scope before any charging logic exists.

use crate::control::duty::DutyCycle;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ramp {
    next: u8,
    step: u8,
}

impl Ramp {
    /// One count per step. A step of zero is treated as one.
    pub fn new(step: u8) -> Self {
        Self {
            next: 0,
            step: step.max(1),
        }
    }

    /// Start somewhere other than zero.
    pub fn starting_at(mut self, duty: DutyCycle) -> Self {
        self.next = duty.raw();
        self
    }

    #[inline]
    pub fn step(&self) -> u8 {
        self.step
    }

    /// Steps in one full sweep, rounded up.
    pub fn steps_per_sweep(&self) -> u32 {
        (256 + self.step as u32 - 1) / self.step as u32
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Iterator for Ramp {
    type Item = DutyCycle;

    fn next(&mut self) -> Option<DutyCycle> {
        let duty = DutyCycle::new(self.next);
        self.next = self.next.wrapping_add(self.step);
        Some(duty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_ramp_visits_every_value_then_wraps() {
        let mut ramp = Ramp::default();
        for expected in 0..=u8::MAX {
            assert_eq!(ramp.next(), Some(DutyCycle::new(expected)));
        }
        assert_eq!(ramp.next(), Some(DutyCycle::OFF));
        assert_eq!(ramp.steps_per_sweep(), 256);
    }

    #[test]
    fn coarse_ramp_wraps_modulo_256() {
        let values: Vec<u8> = Ramp::new(100).take(4).map(u8::from).collect();
        assert_eq!(values, [0, 100, 200, 44]);
        assert_eq!(Ramp::new(100).steps_per_sweep(), 3);
    }

    #[test]
    fn zero_step_still_moves() {
        let mut ramp = Ramp::new(0).starting_at(DutyCycle::FULL);
        assert_eq!(ramp.step(), 1);
        assert_eq!(ramp.next(), Some(DutyCycle::FULL));
        assert_eq!(ramp.next(), Some(DutyCycle::OFF));
    }
}
