// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Charger start-up sequencing and duty-cycle control.
//!
//! [`Charger`] owns the register file and both PWM drivers. It brings the PWM subsystem up once
//! and then accepts duty-cycle updates for the main drive:
//!
//! ```text
//! Uninitialized ──start()──▶ PllWait ──locked──▶ Running ◀─┐ set_duty_cycle()
//!                              │                   └───────┘
//!                              └──timed out on every attempt──▶ Faulted
//! ```
//!
//! Typical usage pattern:
//!
//! ```ignore
//! let mut charger = Charger::new(regs, &config)?;
//! let report = charger.start(&mut delay)?;
//!
//! loop {
//!     charger.set_duty_cycle(next_duty)?;
//!     delay.delay_ms(10);
//! }
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

use crate::config::ChargerConfig;
use crate::control::duty::{DutyCycle, MainDrivePwm};
use crate::drivers::{ChargePump, MainDrive, TimingError};
use crate::hw::regs::{Register, RegisterFile};

/// Subsystem state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChargerState {
    Uninitialized,
    /// Blocked on the asynchronous clock lock.
    PllWait,
    /// Both channels running; the main duty cycle may be changed.
    Running,
    /// Start-up gave up waiting for the clock.
    Faulted,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChargerError {
    Timing(TimingError),
    /// The asynchronous clock never locked.
    PllTimeout { attempts: u32, polls: u32 },
    /// Duty update before a successful start.
    NotRunning,
    AlreadyStarted,
}

impl From<TimingError> for ChargerError {
    fn from(e: TimingError) -> Self {
        ChargerError::Timing(e)
    }
}

impl fmt::Display for ChargerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargerError::Timing(e) => write!(f, "timing: {}", e),
            ChargerError::PllTimeout { attempts, polls } => write!(
                f,
                "clock not locked after {} attempts ({} polls)",
                attempts, polls
            ),
            ChargerError::NotRunning => f.write_str("charger not running"),
            ChargerError::AlreadyStarted => f.write_str("charger already started"),
        }
    }
}

/// What start-up did, for the debug console.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StartupReport {
    /// Lock waits made, including the successful one.
    pub attempts: u32,
    /// Failed lock checks over all attempts.
    pub lock_polls: u32,
    pub main_frequency: HertzU32,
    pub charge_pump_frequency: HertzU32,
}

pub struct Charger<R: RegisterFile> {
    regs: R,
    pump: ChargePump,
    drive: MainDrive,
    attempts: u32,
    state: ChargerState,
}

impl<R: RegisterFile> Charger<R> {
    /// Compute both channel timings from `config`. Nothing is written to the hardware yet.
    pub fn new(regs: R, config: &ChargerConfig) -> Result<Self, ChargerError> {
        let (main, pump) = config.timings()?;
        Ok(Self {
            regs,
            pump: ChargePump::new(pump, config.lock),
            drive: MainDrive::new(main),
            attempts: config.init_attempts.max(1),
            state: ChargerState::Uninitialized,
        })
    }

    #[inline]
    pub fn state(&self) -> ChargerState {
        self.state
    }

    /// Bring up the charge pump, then the main drive.
    ///
    /// The clock is restarted between lock attempts. If every attempt times out the charger ends
    /// in [`ChargerState::Faulted`] with neither timer configured; `start` may then be called
    /// again.
    pub fn start<D: DelayNs>(&mut self, delay: &mut D) -> Result<StartupReport, ChargerError> {
        if self.state == ChargerState::Running {
            return Err(ChargerError::AlreadyStarted);
        }

        self.state = ChargerState::PllWait;

        let mut polls = 0;
        for attempt in 1..=self.attempts {
            let pump = if attempt == 1 {
                self.pump.init(&mut self.regs, delay)
            } else {
                self.pump.reinit(&mut self.regs, delay)
            };

            match pump {
                Ok(status) => {
                    polls += status.polls();
                    self.drive.init(&mut self.regs);
                    self.state = ChargerState::Running;

                    return Ok(StartupReport {
                        attempts: attempt,
                        lock_polls: polls,
                        main_frequency: self.drive.timing().frequency(),
                        charge_pump_frequency: self.pump.timing().frequency(),
                    });
                }
                Err(status) => polls += status.polls(),
            }
        }

        self.state = ChargerState::Faulted;
        Err(ChargerError::PllTimeout {
            attempts: self.attempts,
            polls,
        })
    }

    /// Load a new main-drive duty cycle; applied at the next PWM period boundary.
    pub fn set_duty_cycle<T: Into<DutyCycle>>(&mut self, duty: T) -> Result<(), ChargerError> {
        if self.state != ChargerState::Running {
            return Err(ChargerError::NotRunning);
        }
        self.drive.set_duty(&mut self.regs, duty.into().raw());
        Ok(())
    }

    /// Duty cycle currently loaded in the main-drive compare register.
    pub fn duty_cycle(&mut self) -> DutyCycle {
        DutyCycle::new(self.drive.duty(&mut self.regs))
    }

    /// Compare value of the charge pump, fixed at 50 % output once running.
    pub fn charge_pump_compare(&mut self) -> u32 {
        self.pump.compare(&mut self.regs)
    }

    /// `embedded-hal` PWM handle on the main drive.
    pub fn pwm(&mut self) -> Result<MainDrivePwm<'_, R>, ChargerError> {
        if self.state != ChargerState::Running {
            return Err(ChargerError::NotRunning);
        }
        Ok(MainDrivePwm::new(&mut self.drive, &mut self.regs))
    }

    /// Raw register value, for diagnostics.
    pub fn read_register(&mut self, reg: Register) -> u32 {
        self.regs.read(reg)
    }

    #[inline]
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Consume the charger and return the register file. The PWM outputs keep running.
    pub fn release(self) -> R {
        self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::LockPolicy;
    use crate::hw::sim::{LockBehavior, SimRegisterFile};
    use embedded_hal::pwm::SetDutyCycle;

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u32,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    fn config() -> ChargerConfig {
        ChargerConfig::new(HertzU32::from_raw(1_000_000), HertzU32::from_raw(8_000_000))
            .with_lock_policy(LockPolicy::new(10, 5))
    }

    fn charger(lock: LockBehavior) -> Charger<SimRegisterFile> {
        Charger::new(SimRegisterFile::with_lock(lock), &config()).unwrap()
    }

    #[test]
    fn start_reaches_running() {
        let mut c = charger(LockBehavior::AfterPolls(2));
        let mut delay = CountingDelay::default();
        assert_eq!(c.state(), ChargerState::Uninitialized);

        let report = c.start(&mut delay).unwrap();
        assert_eq!(c.state(), ChargerState::Running);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.lock_polls, 2);
        assert_eq!(report.main_frequency.raw(), 3_921);
        assert_eq!(report.charge_pump_frequency.raw(), 20_000);
        assert_eq!(delay.total_ms, 20);

        assert_eq!(c.duty_cycle(), DutyCycle::OFF);
        assert_eq!(c.charge_pump_compare(), 99);
    }

    #[test]
    fn start_retries_with_clock_restart() {
        let mut c = charger(LockBehavior::OnEnable(2));
        let mut delay = CountingDelay::default();

        let report = c.start(&mut delay).unwrap();
        assert_eq!(report.attempts, 2);
        assert_eq!(report.lock_polls, 5);
        assert_eq!(c.state(), ChargerState::Running);
    }

    #[test]
    fn start_faults_when_clock_never_locks() {
        let mut c = charger(LockBehavior::Never);
        let mut delay = CountingDelay::default();

        assert_eq!(
            c.start(&mut delay),
            Err(ChargerError::PllTimeout {
                attempts: 3,
                polls: 15
            })
        );
        assert_eq!(c.state(), ChargerState::Faulted);
        assert_eq!(delay.total_ms, 150);

        let regs = c.registers();
        for reg in [
            Register::KernelClock,
            Register::AsyncConfig,
            Register::AsyncControl,
            Register::AsyncPeriod,
            Register::AsyncCompare,
            Register::SyncControl,
            Register::SyncModeA,
            Register::SyncModeB,
            Register::SyncPrescaler,
            Register::SyncPeriod,
            Register::SyncCompare,
            Register::SyncEvent,
        ] {
            assert_eq!(regs.write_count(reg), 0, "{:?} was written", reg);
        }

        assert_eq!(c.set_duty_cycle(10u8), Err(ChargerError::NotRunning));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let cfg = config().with_init_attempts(0);
        let mut c = Charger::new(SimRegisterFile::with_lock(LockBehavior::Never), &cfg).unwrap();

        assert_eq!(
            c.start(&mut CountingDelay::default()),
            Err(ChargerError::PllTimeout {
                attempts: 1,
                polls: 5
            })
        );
    }

    #[test]
    fn duty_rejected_before_start() {
        let mut c = charger(LockBehavior::AfterPolls(0));
        assert_eq!(c.set_duty_cycle(128u8), Err(ChargerError::NotRunning));
        assert!(c.pwm().is_err());
        assert_eq!(c.registers().write_count(Register::SyncCompare), 0);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut c = charger(LockBehavior::AfterPolls(0));
        let mut delay = CountingDelay::default();
        c.start(&mut delay).unwrap();
        c.set_duty_cycle(77u8).unwrap();

        assert_eq!(c.start(&mut delay), Err(ChargerError::AlreadyStarted));
        assert_eq!(c.state(), ChargerState::Running);
        assert_eq!(c.duty_cycle().raw(), 77);
    }

    #[test]
    fn duty_updates_leave_charge_pump_alone() {
        let mut c = charger(LockBehavior::AfterPolls(0));
        c.start(&mut CountingDelay::default()).unwrap();

        let pump_writes = c.registers().write_count(Register::AsyncCompare);
        for d in (0..=u8::MAX).rev().step_by(3) {
            c.set_duty_cycle(d).unwrap();
            assert_eq!(c.duty_cycle().raw(), d);
            assert_eq!(c.charge_pump_compare(), 99);
            assert_eq!(c.state(), ChargerState::Running);
        }
        assert_eq!(c.registers().write_count(Register::AsyncCompare), pump_writes);
        assert_eq!(c.registers().peek(Register::AsyncPeriod), 199);
    }

    #[test]
    fn pwm_handle_drives_main_channel() {
        let mut c = charger(LockBehavior::AfterPolls(0));
        c.start(&mut CountingDelay::default()).unwrap();

        c.pwm().unwrap().set_duty_cycle_fully_on().unwrap();
        assert_eq!(c.duty_cycle(), DutyCycle::FULL);

        assert_eq!(c.read_register(Register::SyncCompare), 255);
        let regs = c.release();
        assert_eq!(regs.peek(Register::SyncPeriod), 254);
    }

    #[test]
    fn timing_errors_surface_from_new() {
        let cfg = config().with_main_frequency(HertzU32::from_raw(1_000_000));
        assert!(matches!(
            Charger::new(SimRegisterFile::new(), &cfg),
            Err(ChargerError::Timing(TimingError::OutOfRange { .. }))
        ));
    }
}
