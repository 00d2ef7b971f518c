// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Charger Firmware
//!
//! Firmware for a lead-acid battery charger, written in Rust, targeting an STM32F777 MCU. Two PWM
//! outputs are generated: a 20 kHz charge pump for the high-side gate driver, on a timer clocked
//! asynchronously from its own oscillator, and a ≈4 kHz main drive whose duty cycle sets the
//! charging power.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Register access layer, STM32F7 and simulated backends, console, LEDs |
//! | [`drivers`] | Charge-pump and main-drive PWM drivers, prescaler selection |
//! | [`control`]   | Start-up sequencing and duty-cycle control |
//! | [`config`]   | Frequencies, lock polling and retry settings |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features rt --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod hw;
