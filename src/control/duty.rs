// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Duty-cycle values and the `embedded-hal` PWM view of the main drive.
//!
//! The compare register is 8 bits wide, so [`DutyCycle`] wraps a `u8` and every value is valid.
//! Wider inputs are either clamped (`saturating_*`, `from_percent`, `from_fraction`) or rejected
//! (`TryFrom<u16>`); they are never truncated.

use core::fmt;

use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};

use crate::drivers::MainDrive;
use crate::hw::regs::RegisterFile;

/// Main-drive duty cycle, 0 (always off) to 255 (always on).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct DutyCycle(u8);

impl DutyCycle {
    pub const OFF: DutyCycle = DutyCycle(0);
    pub const FULL: DutyCycle = DutyCycle(u8::MAX);

    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Clamp a wide value into range.
    #[inline]
    pub fn saturating_from_u16(value: u16) -> Self {
        Self(value.min(u8::MAX as u16) as u8)
    }

    /// 0..=100 %, clamped, rounded to nearest.
    pub fn from_percent(percent: u8) -> Self {
        let p = percent.min(100) as u16;
        Self(((p * u8::MAX as u16 + 50) / 100) as u8)
    }

    /// 0.0..=1.0, clamped. NaN maps to off.
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction.is_nan() || fraction <= 0.0 {
            return Self::OFF;
        }
        if fraction >= 1.0 {
            return Self::FULL;
        }
        Self((fraction * u8::MAX as f32 + 0.5) as u8)
    }

    /// Fraction of the period the output is active.
    #[inline]
    pub fn fraction(self) -> f32 {
        self.0 as f32 / u8::MAX as f32
    }
}

impl From<u8> for DutyCycle {
    #[inline]
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<DutyCycle> for u8 {
    #[inline]
    fn from(duty: DutyCycle) -> Self {
        duty.0
    }
}

impl TryFrom<u16> for DutyCycle {
    type Error = DutyError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| DutyError::OutOfRange(value))
    }
}

/// A duty value that does not fit the compare register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DutyError {
    OutOfRange(u16),
}

impl fmt::Display for DutyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyError::OutOfRange(v) => write!(f, "duty {} exceeds {}", v, u8::MAX),
        }
    }
}

impl pwm::Error for DutyError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `SetDutyCycle` over the main drive, for code written against `embedded-hal`.
///
/// Borrows the driver and the register file for as long as it is used.
pub struct MainDrivePwm<'a, R: RegisterFile> {
    drive: &'a mut MainDrive,
    regs: &'a mut R,
}

impl<'a, R: RegisterFile> MainDrivePwm<'a, R> {
    pub fn new(drive: &'a mut MainDrive, regs: &'a mut R) -> Self {
        Self { drive, regs }
    }

    pub fn duty(&mut self) -> DutyCycle {
        DutyCycle(self.drive.duty(self.regs))
    }
}

impl<R: RegisterFile> ErrorType for MainDrivePwm<'_, R> {
    type Error = DutyError;
}

impl<R: RegisterFile> SetDutyCycle for MainDrivePwm<'_, R> {
    fn max_duty_cycle(&self) -> u16 {
        self.drive.max_duty() as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = DutyCycle::try_from(duty)?;
        self.drive.set_duty(self.regs, duty.raw());
        Ok(())
    }
}
