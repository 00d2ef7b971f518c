// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Blocking SysTick delay exposed through `embedded_hal::delay::DelayNs`.

use cortex_m::delay::Delay;
use embedded_hal::delay::DelayNs;

/// Wrapper around the cortex-m SysTick delay.
pub struct SysDelay {
    delay: Delay,
}

impl SysDelay {
    /// `core_hz` is the core clock the SysTick counts at.
    pub fn new(syst: cortex_m::peripheral::SYST, core_hz: u32) -> Self {
        Self {
            delay: Delay::new(syst, core_hz),
        }
    }

    pub fn free(self) -> cortex_m::peripheral::SYST {
        self.delay.free()
    }
}

impl DelayNs for SysDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_us(ns.div_ceil(1_000));
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
