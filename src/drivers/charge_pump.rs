// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Charge-pump PWM on the asynchronous timer (LPTIM1, 20 kHz).
//!
//! The charge pump boosts the gate voltage of the high-side switch. It runs from its own kernel
//! clock, so bring-up is split into the clock phase ([`ChargePump::enable_clock`] +
//! [`ChargePump::wait_for_lock`]) and the timer phase ([`ChargePump::configure_timer`]). The timer
//! phase must only run once the clock has reported lock.
//!
//! Once started, the output is a fixed 50 % square wave and is never touched again.

use embedded_hal::delay::DelayNs;

use crate::drivers::timing::AsyncTiming;
use crate::hw::regs::{
    bits::{
        ahb1, apb1, async_config, async_control, clock_control, kernel_clock, pin_function,
        pin_mode, pins,
    },
    Register, RegisterFile,
};

/// LPTIM1SEL value for the HSI kernel clock.
const KERNEL_CLOCK_HSI: u32 = 0b10;

/// Bounded polling of the clock lock bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LockPolicy {
    /// Delay between two checks of the lock bit.
    pub poll_interval_ms: u32,
    /// Failed checks tolerated before giving up.
    pub max_polls: u32,
}

impl LockPolicy {
    pub const fn new(poll_interval_ms: u32, max_polls: u32) -> Self {
        Self {
            poll_interval_ms,
            max_polls,
        }
    }
}

impl Default for LockPolicy {
    /// 10 ms between checks, one second in total.
    fn default() -> Self {
        Self::new(10, 100)
    }
}

/// Outcome of [`ChargePump::wait_for_lock`].
///
/// `polls` counts the checks that found the clock unlocked, each of which was followed by one
/// poll interval of delay.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockStatus {
    Locked { polls: u32 },
    TimedOut { polls: u32 },
}

impl LockStatus {
    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked { .. })
    }

    #[inline]
    pub fn polls(&self) -> u32 {
        match *self {
            LockStatus::Locked { polls } | LockStatus::TimedOut { polls } => polls,
        }
    }
}

/// Charge-pump channel driver.
///
/// The register file is passed in to every method so that the charge pump and the main drive can
/// share it.
pub struct ChargePump {
    timing: AsyncTiming,
    lock: LockPolicy,
}

impl ChargePump {
    pub fn new(timing: AsyncTiming, lock: LockPolicy) -> Self {
        Self { timing, lock }
    }

    #[inline]
    pub fn timing(&self) -> &AsyncTiming {
        &self.timing
    }

    #[inline]
    pub fn lock_policy(&self) -> &LockPolicy {
        &self.lock
    }

    /// Route the charge-pump pin to the timer output.
    pub fn configure_pin<R: RegisterFile>(&mut self, regs: &mut R) {
        regs.set_bits(Register::Ahb1Enable, ahb1::GPIOD_EN.mask());
        regs.write_field(
            Register::PinFunction,
            pin_function::pin(pins::CHARGE_PUMP),
            pin_function::AF_LPTIM1,
        );
        regs.write_field(
            Register::PinMode,
            pin_mode::pin(pins::CHARGE_PUMP),
            pin_mode::ALTERNATE,
        );
    }

    /// Switch the asynchronous clock on.
    pub fn enable_clock<R: RegisterFile>(&mut self, regs: &mut R) {
        regs.set_bits(Register::ClockControl, clock_control::ON.mask());
    }

    /// Switch the asynchronous clock off and on again, dropping any partial lock.
    pub fn restart_clock<R: RegisterFile>(&mut self, regs: &mut R) {
        regs.clear_bits(Register::ClockControl, clock_control::ON.mask());
        regs.set_bits(Register::ClockControl, clock_control::ON.mask());
    }

    /// Poll the lock bit, sleeping one poll interval after every failed check.
    ///
    /// Returns as soon as the bit reads set; with the bit already set no delay is spent.
    pub fn wait_for_lock<R: RegisterFile, D: DelayNs>(
        &mut self,
        regs: &mut R,
        delay: &mut D,
    ) -> LockStatus {
        let mut polls = 0;
        loop {
            if regs.is_set(Register::ClockControl, clock_control::READY) {
                return LockStatus::Locked { polls };
            }
            if polls >= self.lock.max_polls {
                return LockStatus::TimedOut { polls };
            }
            polls += 1;
            delay.delay_ms(self.lock.poll_interval_ms);
        }
    }

    /// Clock source, waveform, prescaler, period and 50 % compare; then start counting.
    ///
    /// The configuration register is only writable while the timer is disabled, and the period and
    /// compare registers only while it is enabled, hence the order below.
    pub fn configure_timer<R: RegisterFile>(&mut self, regs: &mut R) {
        regs.set_bits(Register::Apb1Enable, apb1::LPTIM1_EN.mask());
        regs.clear_bits(Register::AsyncControl, async_control::ENABLE.mask());

        // Clock source: asynchronous kernel clock, counted internally
        regs.write_field(Register::KernelClock, kernel_clock::LPTIM1_SEL, KERNEL_CLOCK_HSI);
        regs.clear_bits(Register::AsyncConfig, async_config::CKSEL.mask());

        // PWM waveform, non-inverted, updates at period end
        regs.apply(
            Register::AsyncConfig,
            !(async_config::WAVE.mask() | async_config::WAVPOL.mask()),
            async_config::PRELOAD.mask(),
        );

        regs.write_field(
            Register::AsyncConfig,
            async_config::PRESC,
            self.timing.prescaler.bits(),
        );

        regs.set_bits(Register::AsyncControl, async_control::ENABLE.mask());
        regs.write(Register::AsyncPeriod, self.timing.period);
        regs.write(Register::AsyncCompare, self.timing.compare());

        regs.set_bits(Register::AsyncControl, async_control::CNTSTRT.mask());
    }

    /// Full bring-up with a single lock wait.
    ///
    /// On timeout no timer register is touched and the lock status is returned as the error.
    pub fn init<R: RegisterFile, D: DelayNs>(
        &mut self,
        regs: &mut R,
        delay: &mut D,
    ) -> Result<LockStatus, LockStatus> {
        self.configure_pin(regs);
        self.enable_clock(regs);
        self.lock_and_start(regs, delay)
    }

    /// Another bring-up attempt after [`ChargePump::init`] timed out: restart the clock and wait
    /// for lock again.
    pub fn reinit<R: RegisterFile, D: DelayNs>(
        &mut self,
        regs: &mut R,
        delay: &mut D,
    ) -> Result<LockStatus, LockStatus> {
        self.restart_clock(regs);
        self.lock_and_start(regs, delay)
    }

    fn lock_and_start<R: RegisterFile, D: DelayNs>(
        &mut self,
        regs: &mut R,
        delay: &mut D,
    ) -> Result<LockStatus, LockStatus> {
        let status = self.wait_for_lock(regs, delay);
        if !status.is_locked() {
            return Err(status);
        }

        self.configure_timer(regs);
        Ok(status)
    }

    /// Compare value currently loaded in the hardware.
    pub fn compare<R: RegisterFile>(&self, regs: &mut R) -> u32 {
        regs.read(Register::AsyncCompare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::timing::AsyncPrescaler;
    use crate::hw::sim::{LockBehavior, SimRegisterFile};
    use fugit::HertzU32;

    /// Delay that only records how long it was asked to wait.
    #[derive(Default)]
    struct CountingDelay {
        calls: u32,
        total_ms: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.calls += 1;
            self.total_ms += ns / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.calls += 1;
            self.total_ms += ms;
        }
    }

    fn pump() -> ChargePump {
        let timing =
            AsyncTiming::for_frequency(HertzU32::from_raw(8_000_000), HertzU32::from_raw(20_000))
                .unwrap();
        ChargePump::new(timing, LockPolicy::new(10, 5))
    }

    #[test]
    fn lock_already_set_needs_no_delay() {
        let mut regs = SimRegisterFile::clock_running();
        let mut delay = CountingDelay::default();

        let status = pump().wait_for_lock(&mut regs, &mut delay);
        assert_eq!(status, LockStatus::Locked { polls: 0 });
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn lock_wait_sleeps_between_polls() {
        let mut regs = SimRegisterFile::with_lock(LockBehavior::AfterPolls(3));
        let mut delay = CountingDelay::default();
        let mut pump = pump();

        pump.enable_clock(&mut regs);
        let status = pump.wait_for_lock(&mut regs, &mut delay);
        assert_eq!(status, LockStatus::Locked { polls: 3 });
        assert_eq!(delay.calls, 3);
        assert_eq!(delay.total_ms, 30);
    }

    #[test]
    fn lock_wait_is_bounded() {
        let mut regs = SimRegisterFile::with_lock(LockBehavior::Never);
        let mut delay = CountingDelay::default();
        let mut pump = pump();

        pump.enable_clock(&mut regs);
        let status = pump.wait_for_lock(&mut regs, &mut delay);
        assert_eq!(status, LockStatus::TimedOut { polls: 5 });
        assert_eq!(delay.total_ms, 50);
    }

    #[test]
    fn timeout_leaves_timer_untouched() {
        let mut regs = SimRegisterFile::with_lock(LockBehavior::Never);
        let mut delay = CountingDelay::default();

        assert_eq!(
            pump().init(&mut regs, &mut delay),
            Err(LockStatus::TimedOut { polls: 5 })
        );
        for reg in Register::ALL {
            if reg.is_async_timer() {
                assert_eq!(regs.write_count(reg), 0, "{:?} was written", reg);
            }
        }
    }

    #[test]
    fn reinit_restarts_clock_and_configures_timer() {
        let mut regs = SimRegisterFile::with_lock(LockBehavior::OnEnable(2));
        let mut delay = CountingDelay::default();
        let mut pump = pump();

        assert_eq!(
            pump.init(&mut regs, &mut delay),
            Err(LockStatus::TimedOut { polls: 5 })
        );
        assert_eq!(regs.write_count(Register::AsyncPeriod), 0);

        assert_eq!(
            pump.reinit(&mut regs, &mut delay),
            Ok(LockStatus::Locked { polls: 0 })
        );
        assert_eq!(regs.peek(Register::AsyncPeriod), 199);
        assert_eq!(regs.peek(Register::AsyncCompare), 99);
    }

    #[test]
    fn init_programs_20khz_at_half_duty() {
        let mut regs = SimRegisterFile::new();
        let mut delay = CountingDelay::default();
        let mut pump = pump();

        assert_eq!(
            pump.init(&mut regs, &mut delay),
            Ok(LockStatus::Locked { polls: 0 })
        );

        assert_eq!(regs.peek(Register::AsyncPeriod), 199);
        assert_eq!(regs.peek(Register::AsyncCompare), 99);
        assert_eq!(pump.compare(&mut regs), 99);

        let cfg = regs.peek(Register::AsyncConfig);
        assert_eq!(async_config::PRESC.extract(cfg), AsyncPrescaler::Div2.bits());
        assert_eq!(async_config::CKSEL.extract(cfg), 0);
        assert_eq!(async_config::WAVE.extract(cfg), 0);
        assert_eq!(async_config::WAVPOL.extract(cfg), 0);
        assert_eq!(async_config::PRELOAD.extract(cfg), 1);

        let ctrl = regs.peek(Register::AsyncControl);
        assert_eq!(
            ctrl,
            async_control::ENABLE.mask() | async_control::CNTSTRT.mask()
        );

        assert_eq!(
            kernel_clock::LPTIM1_SEL.extract(regs.peek(Register::KernelClock)),
            KERNEL_CLOCK_HSI
        );
        assert_eq!(
            pin_mode::pin(pins::CHARGE_PUMP).extract(regs.peek(Register::PinMode)),
            pin_mode::ALTERNATE
        );
        assert_eq!(
            pin_function::pin(pins::CHARGE_PUMP).extract(regs.peek(Register::PinFunction)),
            pin_function::AF_LPTIM1
        );
    }

    #[test]
    fn restart_clock_drops_lock() {
        let mut regs = SimRegisterFile::with_lock(LockBehavior::AfterPolls(1));
        let mut delay = CountingDelay::default();
        let mut pump = pump();

        pump.enable_clock(&mut regs);
        assert!(pump.wait_for_lock(&mut regs, &mut delay).is_locked());

        pump.restart_clock(&mut regs);
        assert_eq!(
            pump.wait_for_lock(&mut regs, &mut delay),
            LockStatus::Locked { polls: 1 }
        );
    }
}
