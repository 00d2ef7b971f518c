// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # PWM Channel Drivers
//!
//! This module contains the two PWM channel drivers that sit above the register access layer in
//! `hw/` and below the charger control logic.
//!
//! ## Existing drivers
//!
//! - [`charge_pump`] – 20 kHz asynchronous PWM feeding the high-side gate-driver charge pump
//! - [`main_drive`] – ≈4 kHz fast PWM carrying the charging waveform
//! - [`timing`] – prescaler and period selection for both channels

pub mod charge_pump;
pub mod main_drive;
pub mod timing;

pub use charge_pump::{ChargePump, LockPolicy, LockStatus};
pub use main_drive::MainDrive;
pub use timing::{AsyncPrescaler, AsyncTiming, MainTiming, SyncPrescaler, TimingError};
