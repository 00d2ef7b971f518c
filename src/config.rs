// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Charger configuration.
//!
//! Clock rates are whatever the board actually runs at; prescalers and periods are derived from
//! them in [`ChargerConfig::timings`].

use fugit::HertzU32;

use crate::drivers::{AsyncTiming, LockPolicy, MainTiming, TimingError};

/// Main charging waveform frequency.
pub const MAIN_DRIVE_HZ: u32 = 4_000;

/// Charge-pump frequency.
pub const CHARGE_PUMP_HZ: u32 = 20_000;

/// Delay between two checks of the asynchronous clock lock bit.
pub const LOCK_POLL_INTERVAL_MS: u32 = 10;

/// Failed lock checks per attempt.
pub const LOCK_MAX_POLLS: u32 = 100;

/// Lock attempts before start-up is abandoned.
pub const INIT_ATTEMPTS: u32 = 3;

/// Dwell per step of the bring-up duty ramp.
pub const RAMP_STEP_MS: u32 = 10;

/// Debug console baud rate, for a console USART clocked at 1 MHz (0.2 % error).
pub const CONSOLE_BAUD: u32 = 38_400;

/// HSI oscillator, the asynchronous timer's kernel clock on STM32F7.
pub const HSI_HZ: u32 = 16_000_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChargerConfig {
    /// Input clock of the main-drive timer.
    pub sync_clock: HertzU32,
    /// Kernel clock of the charge-pump timer.
    pub async_clock: HertzU32,
    pub main_frequency: HertzU32,
    pub charge_pump_frequency: HertzU32,
    pub lock: LockPolicy,
    /// Lock waits before giving up; at least one is always made.
    pub init_attempts: u32,
}

impl ChargerConfig {
    /// Default frequencies and lock policy for the given clocks.
    pub fn new(sync_clock: HertzU32, async_clock: HertzU32) -> Self {
        Self {
            sync_clock,
            async_clock,
            main_frequency: HertzU32::from_raw(MAIN_DRIVE_HZ),
            charge_pump_frequency: HertzU32::from_raw(CHARGE_PUMP_HZ),
            lock: LockPolicy::new(LOCK_POLL_INTERVAL_MS, LOCK_MAX_POLLS),
            init_attempts: INIT_ATTEMPTS,
        }
    }

    pub fn with_main_frequency(mut self, freq: HertzU32) -> Self {
        self.main_frequency = freq;
        self
    }

    pub fn with_charge_pump_frequency(mut self, freq: HertzU32) -> Self {
        self.charge_pump_frequency = freq;
        self
    }

    pub fn with_lock_policy(mut self, lock: LockPolicy) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_init_attempts(mut self, attempts: u32) -> Self {
        self.init_attempts = attempts;
        self
    }

    /// Prescaler/period selection for both channels.
    pub fn timings(&self) -> Result<(MainTiming, AsyncTiming), TimingError> {
        let main = MainTiming::for_frequency(self.sync_clock, self.main_frequency)?;
        let pump = AsyncTiming::for_frequency(self.async_clock, self.charge_pump_frequency)?;
        Ok((main, pump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{AsyncPrescaler, SyncPrescaler};

    #[test]
    fn defaults() {
        let cfg = ChargerConfig::new(HertzU32::from_raw(1_000_000), HertzU32::from_raw(8_000_000));
        assert_eq!(cfg.main_frequency.raw(), 4_000);
        assert_eq!(cfg.charge_pump_frequency.raw(), 20_000);
        assert_eq!(cfg.lock, LockPolicy::new(10, 100));
        assert_eq!(cfg.init_attempts, 3);
    }

    #[test]
    fn timings_from_reference_clocks() {
        let cfg = ChargerConfig::new(HertzU32::from_raw(1_000_000), HertzU32::from_raw(8_000_000));
        let (main, pump) = cfg.timings().unwrap();

        assert_eq!(main.prescaler, SyncPrescaler::Div1);
        assert_eq!(pump.prescaler, AsyncPrescaler::Div2);
        assert_eq!(pump.period, 199);
    }

    #[test]
    fn builder_overrides() {
        let cfg = ChargerConfig::new(HertzU32::from_raw(1_000_000), HertzU32::from_raw(HSI_HZ))
            .with_main_frequency(HertzU32::from_raw(500))
            .with_charge_pump_frequency(HertzU32::from_raw(40_000))
            .with_lock_policy(LockPolicy::new(1, 3))
            .with_init_attempts(1);

        let (main, pump) = cfg.timings().unwrap();
        assert_eq!(main.prescaler, SyncPrescaler::Div8);
        assert_eq!(pump.frequency().raw(), 40_000);
        assert_eq!(cfg.lock.max_polls, 3);
        assert_eq!(cfg.init_attempts, 1);
    }

    #[test]
    fn console_baud_is_accurate_from_1mhz_bus() {
        let bus_hz = 1_000_000u32;
        let divider = (bus_hz + CONSOLE_BAUD / 2) / CONSOLE_BAUD;
        let actual = bus_hz / divider;
        let error_ppm = actual.abs_diff(CONSOLE_BAUD) as u64 * 1_000_000 / CONSOLE_BAUD as u64;
        assert_eq!(divider, 26);
        assert!(error_ppm < 5_000, "{} ppm", error_ppm);
    }

    #[test]
    fn unreachable_frequency_is_reported() {
        let cfg = ChargerConfig::new(HertzU32::from_raw(1_000_000), HertzU32::from_raw(HSI_HZ))
            .with_charge_pump_frequency(HertzU32::from_raw(10));
        assert!(matches!(cfg.timings(), Err(TimingError::OutOfRange { .. })));
    }
}
