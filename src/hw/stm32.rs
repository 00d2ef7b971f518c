// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STM32F7 register backend using direct PAC register access.
//!
//! | Logical register | Peripheral register |
//! | ---------------- | ------------------- |
//! | `PinMode` / `PinFunction` | `GPIOD_MODER` / `GPIOD_AFRH` |
//! | `Ahb1Enable` / `Apb1Enable` | `RCC_AHB1ENR` / `RCC_APB1ENR` |
//! | `ClockControl` | `RCC_CR` (HSION, HSIRDY) |
//! | `KernelClock` | `RCC_DCKCFGR2` |
//! | `AsyncConfig` / `AsyncControl` | `LPTIM1_CFGR` / `LPTIM1_CR` |
//! | `AsyncPeriod` / `AsyncCompare` | `LPTIM1_ARR` / `LPTIM1_CMP` |
//! | `SyncControl` | `TIM4_CR1` |
//! | `SyncModeA` / `SyncModeB` | `TIM4_CCMR1` / `TIM4_CCER` |
//! | `SyncPrescaler` / `SyncPeriod` | `TIM4_PSC` / `TIM4_ARR` |
//! | `SyncCompare` / `SyncEvent` | `TIM4_CCR1` / `TIM4_EGR` |
//!
//! GPIOD, LPTIM1 and TIM4 are owned by this wrapper. RCC is shared with the HAL clock setup, so it
//! is reached through its raw pointer and only ever modified inside a critical section.

use stm32f7xx_hal::pac;

use crate::hw::regs::{Register, RegisterFile};

pub struct Stm32Registers {
    gpiod: pac::GPIOD,
    lptim: pac::LPTIM1,
    tim: pac::TIM4,
}

impl Stm32Registers {
    pub fn new(gpiod: pac::GPIOD, lptim1: pac::LPTIM1, tim4: pac::TIM4) -> Self {
        Self {
            gpiod,
            lptim: lptim1,
            tim: tim4,
        }
    }

    /// Consume the wrapper and return the underlying peripherals.
    pub fn free(self) -> (pac::GPIOD, pac::LPTIM1, pac::TIM4) {
        (self.gpiod, self.lptim, self.tim)
    }

    #[inline]
    fn rcc() -> &'static pac::rcc::RegisterBlock {
        unsafe { &*pac::RCC::ptr() }
    }
}

impl RegisterFile for Stm32Registers {
    fn read(&mut self, reg: Register) -> u32 {
        let rcc = Self::rcc();
        match reg {
            Register::PinMode => self.gpiod.moder.read().bits(),
            Register::PinFunction => self.gpiod.afrh.read().bits(),
            Register::Ahb1Enable => rcc.ahb1enr.read().bits(),
            Register::Apb1Enable => rcc.apb1enr.read().bits(),
            Register::ClockControl => rcc.cr.read().bits(),
            Register::KernelClock => rcc.dckcfgr2.read().bits(),
            Register::AsyncConfig => self.lptim.cfgr.read().bits(),
            Register::AsyncControl => self.lptim.cr.read().bits(),
            Register::AsyncPeriod => self.lptim.arr.read().bits(),
            Register::AsyncCompare => self.lptim.cmp.read().bits(),
            Register::SyncControl => self.tim.cr1.read().bits(),
            Register::SyncModeA => self.tim.ccmr1_output().read().bits(),
            Register::SyncModeB => self.tim.ccer.read().bits(),
            Register::SyncPrescaler => self.tim.psc.read().bits(),
            Register::SyncPeriod => self.tim.arr.read().bits(),
            Register::SyncCompare => self.tim.ccr1().read().bits(),
            // Write-only.
            Register::SyncEvent => 0,
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let rcc = Self::rcc();
        match reg {
            Register::PinMode => self.gpiod.moder.write(|w| unsafe { w.bits(value) }),
            Register::PinFunction => self.gpiod.afrh.write(|w| unsafe { w.bits(value) }),
            Register::Ahb1Enable => rcc.ahb1enr.write(|w| unsafe { w.bits(value) }),
            Register::Apb1Enable => rcc.apb1enr.write(|w| unsafe { w.bits(value) }),
            Register::ClockControl => rcc.cr.write(|w| unsafe { w.bits(value) }),
            Register::KernelClock => rcc.dckcfgr2.write(|w| unsafe { w.bits(value) }),
            Register::AsyncConfig => self.lptim.cfgr.write(|w| unsafe { w.bits(value) }),
            Register::AsyncControl => self.lptim.cr.write(|w| unsafe { w.bits(value) }),
            Register::AsyncPeriod => self.lptim.arr.write(|w| unsafe { w.bits(value) }),
            Register::AsyncCompare => self.lptim.cmp.write(|w| unsafe { w.bits(value) }),
            Register::SyncControl => self.tim.cr1.write(|w| unsafe { w.bits(value) }),
            Register::SyncModeA => self
                .tim
                .ccmr1_output()
                .write(|w| unsafe { w.bits(value) }),
            Register::SyncModeB => self.tim.ccer.write(|w| unsafe { w.bits(value) }),
            Register::SyncPrescaler => self.tim.psc.write(|w| unsafe { w.bits(value) }),
            Register::SyncPeriod => self.tim.arr.write(|w| unsafe { w.bits(value) }),
            Register::SyncCompare => self.tim.ccr1().write(|w| unsafe { w.bits(value) }),
            Register::SyncEvent => self.tim.egr.write(|w| unsafe { w.bits(value) }),
        }
    }

    /// Read-modify-write with interrupts masked.
    fn apply(&mut self, reg: Register, clear_mask: u32, set_mask: u32) {
        cortex_m::interrupt::free(|_| {
            let value = self.read(reg);
            self.write(reg, (value & clear_mask) | set_mask);
        });
    }
}
