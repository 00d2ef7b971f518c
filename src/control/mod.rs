// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Charger Control
//!
//! This module sits on top of the PWM drivers and owns the charger's run-time behaviour.
//!
//! ## Modules
//!
//! - [`charger`] - Start-up sequencing and the duty-cycle control interface.
//! - [`duty`] - Duty-cycle values and the `embedded-hal` PWM adapter.
//! - [`ramp`] - Bring-up duty sweep.

pub mod charger;
pub mod duty;
pub mod ramp;

pub use charger::{Charger, ChargerError, ChargerState, StartupReport};
pub use duty::{DutyCycle, DutyError, MainDrivePwm};
pub use ramp::Ramp;
