// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Main charging waveform on TIM4 channel 1 (≈4 kHz, fast PWM).
//!
//! The timer counts up from 0 to [`MainTiming::top`] and restarts (edge-aligned, i.e. fast PWM).
//! Channel 1 is in PWM mode 1 with a preloaded compare register: the output is high while the
//! counter is below the compare value, and a new compare value takes effect at the next period
//! boundary. Channel 2 of the same timer is left disconnected.
//!
//! Bring-up is pure register writes; there is nothing to wait for.

use crate::drivers::timing::MainTiming;
use crate::hw::regs::{
    bits::{
        ahb1, apb1, pin_function, pin_mode, pins, sync_control, sync_event, sync_mode_a,
        sync_mode_b,
    },
    Register, RegisterFile,
};

/// Main-drive channel driver.
pub struct MainDrive {
    timing: MainTiming,
}

impl MainDrive {
    pub fn new(timing: MainTiming) -> Self {
        Self { timing }
    }

    #[inline]
    pub fn timing(&self) -> &MainTiming {
        &self.timing
    }

    /// Route the main-drive pin to the timer output.
    pub fn configure_pin<R: RegisterFile>(&mut self, regs: &mut R) {
        regs.set_bits(Register::Ahb1Enable, ahb1::GPIOD_EN.mask());
        regs.write_field(
            Register::PinFunction,
            pin_function::pin(pins::MAIN_DRIVE),
            pin_function::AF_TIM4,
        );
        regs.write_field(
            Register::PinMode,
            pin_mode::pin(pins::MAIN_DRIVE),
            pin_mode::ALTERNATE,
        );
    }

    /// Configure the timer and start it with a duty cycle of 0.
    ///
    /// Calling this again reprograms the same values; the result does not depend on how often it
    /// ran.
    pub fn init<R: RegisterFile>(&mut self, regs: &mut R) {
        self.configure_pin(regs);

        regs.set_bits(Register::Apb1Enable, apb1::TIM4_EN.mask());
        regs.clear_bits(Register::SyncControl, sync_control::CEN.mask());

        // Prescaler
        regs.write(Register::SyncPrescaler, self.timing.prescaler.bits());

        // Fast PWM: up-counting, edge-aligned, 8-bit top, buffered top
        regs.apply(
            Register::SyncControl,
            !(sync_control::DIR.mask() | sync_control::CMS.mask()),
            sync_control::ARPE.mask(),
        );
        regs.write(Register::SyncPeriod, self.timing.top());

        // CH1: output, PWM mode 1, preloaded compare
        regs.apply(
            Register::SyncModeA,
            !(sync_mode_a::CC1S.mask() | sync_mode_a::OC1M.mask()),
            sync_mode_a::OC1M.bits(sync_mode_a::OCM_PWM1) | sync_mode_a::OC1PE.mask(),
        );
        // CH2: frozen and disconnected
        regs.apply(
            Register::SyncModeA,
            !(sync_mode_a::CC2S.mask() | sync_mode_a::OC2M.mask() | sync_mode_a::OC2PE.mask()),
            sync_mode_a::OC2M.bits(sync_mode_a::OCM_FROZEN),
        );

        // CH1 enabled active-high, CH2 off
        regs.apply(
            Register::SyncModeB,
            !(sync_mode_b::CC1P.mask() | sync_mode_b::CC2E.mask() | sync_mode_b::CC2P.mask()),
            sync_mode_b::CC1E.mask(),
        );

        regs.write(Register::SyncCompare, 0);

        // Load prescaler and preloaded registers, then run
        regs.write(Register::SyncEvent, sync_event::UG.mask());
        regs.set_bits(Register::SyncControl, sync_control::CEN.mask());
    }

    /// Load a new compare value. Takes effect at the next period boundary.
    ///
    /// 0 keeps the output low, 255 keeps it high.
    #[inline]
    pub fn set_duty<R: RegisterFile>(&mut self, regs: &mut R, duty: u8) {
        regs.write(Register::SyncCompare, duty as u32);
    }

    /// Compare value currently loaded.
    #[inline]
    pub fn duty<R: RegisterFile>(&self, regs: &mut R) -> u8 {
        regs.read(Register::SyncCompare) as u8
    }

    /// Largest duty value; equals full on.
    #[inline]
    pub const fn max_duty(&self) -> u8 {
        u8::MAX
    }
}
