// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LEDs.

use stm32f7xx_hal::gpio::{self, Output, PinState, PushPull};

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

impl ActiveLevel {
    fn state(self, on: bool) -> PinState {
        match (self, on) {
            (ActiveLevel::High, true) | (ActiveLevel::Low, false) => PinState::High,
            (ActiveLevel::High, false) | (ActiveLevel::Low, true) => PinState::Low,
        }
    }
}

/// LED on any GPIO pin that remembers its active level and last known state.
pub struct Led<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
    active: ActiveLevel,
    is_on: bool,
}

impl<const P: char, const N: u8> Led<P, N> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new<MODE>(pin: gpio::Pin<P, N, MODE>, active: ActiveLevel) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(active.state(false));
        Self {
            pin,
            active,
            is_on: false,
        }
    }

    pub fn active_high<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    /// Drive the LED logically ON (true) or OFF (false).
    pub fn set(&mut self, on: bool) {
        self.pin.set_state(self.active.state(on));
        self.is_on = on;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}
