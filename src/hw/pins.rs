// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the charger on a Nucleo-F767ZI.
//!
//! Only the console and status LEDs are handed out here. The two PWM outputs (PD12 main drive,
//! PD13 charge pump) are configured through the register layer, which owns all of GPIOD.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
}

/// User LEDs LD1-LD3, active high.
pub struct LedPins {
    pub green: gpiob::PB0<Output<PushPull>>,
    pub blue: gpiob::PB7<Output<PushPull>>,
    pub red: gpiob::PB14<Output<PushPull>>,
}

/// Debug console. The ST-LINK virtual COM port sits on PD8/PD9 (GPIOD), so USART1 is used.
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();

        Self {
            leds: LedPins {
                green: gpiob.pb0.into_push_pull_output(),
                blue: gpiob.pb7.into_push_pull_output(),
                red: gpiob.pb14.into_push_pull_output(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },
        }
    }
}
