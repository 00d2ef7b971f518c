// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Hardware Layer
//!
//! - [`regs`] - logical registers, bit fields and the [`RegisterFile`] trait
//! - [`stm32`] - STM32F7 backend over the PAC
//! - [`sim`] - in-memory backend for host tests
//! - [`delay`], [`led`], [`usart`], [`pins`] - board support for the firmware binary

pub mod delay;
pub mod led;
pub mod pins;
pub mod regs;
pub mod sim;
pub mod stm32;
pub mod usart;

pub use delay::SysDelay;
pub use led::Led;
pub use pins::BoardPins;
pub use regs::{Field, Register, RegisterFile};
pub use sim::{LockBehavior, SimRegisterFile};
pub use stm32::Stm32Registers;
pub use usart::Usart;
