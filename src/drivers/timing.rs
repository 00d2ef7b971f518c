// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Prescaler and period selection for the two PWM channels.
//!
//! The main channel runs an 8-bit counter with a fixed top, so only the prescaler is chosen. The
//! charge-pump channel has a free period register, so the prescaler is the smallest one that fits
//! the period in [`ASYNC_MAX_TICKS`].

use core::fmt;

use fugit::HertzU32;

/// Counter ticks per main-channel period (counter runs 0..=254).
///
/// A compare value of 255 lies above the top and keeps the output permanently active, so the full
/// `u8` duty range maps onto 0 %..=100 %.
pub const MAIN_PERIOD_TICKS: u32 = 255;

/// Longest charge-pump period, in ticks.
pub const ASYNC_MAX_TICKS: u32 = 256;

/// Shortest charge-pump period, in ticks, that can still produce a 50 % waveform with the compare
/// value below the period register.
pub const ASYNC_MIN_TICKS: u32 = 2;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimingError {
    /// A clock or target frequency of 0 Hz.
    ZeroFrequency,
    /// No prescaler brings the output within range of the target.
    OutOfRange { clock_hz: u32, target_hz: u32 },
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::ZeroFrequency => f.write_str("zero clock or target frequency"),
            TimingError::OutOfRange {
                clock_hz,
                target_hz,
            } => write!(f, "{} Hz not reachable from a {} Hz clock", target_hz, clock_hz),
        }
    }
}

/// Main-channel clock divider.
///
/// | variant | divider | `SyncPrescaler` register |
/// | ------- | ------- | ------------------------ |
/// | `Div1` | ÷1 | 0 |
/// | `Div8` | ÷8 | 7 |
/// | `Div64` | ÷64 | 63 |
/// | `Div256` | ÷256 | 255 |
/// | `Div1024` | ÷1024 | 1023 |
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SyncPrescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl SyncPrescaler {
    pub const ALL: [SyncPrescaler; 5] = [
        SyncPrescaler::Div1,
        SyncPrescaler::Div8,
        SyncPrescaler::Div64,
        SyncPrescaler::Div256,
        SyncPrescaler::Div1024,
    ];

    #[inline]
    pub const fn divisor(self) -> u32 {
        match self {
            SyncPrescaler::Div1 => 1,
            SyncPrescaler::Div8 => 8,
            SyncPrescaler::Div64 => 64,
            SyncPrescaler::Div256 => 256,
            SyncPrescaler::Div1024 => 1024,
        }
    }

    /// Value for the prescaler register (counter clock = input / (PSC + 1)).
    #[inline]
    pub const fn bits(self) -> u32 {
        self.divisor() - 1
    }
}

/// Charge-pump clock divider, ÷2^n.
///
/// | variant | divider | `PRESC` |
/// | ------- | ------- | ------- |
/// | `Div1` | ÷1 | 0b000 |
/// | `Div2` | ÷2 | 0b001 |
/// | `Div4` | ÷4 | 0b010 |
/// | `Div8` | ÷8 | 0b011 |
/// | `Div16` | ÷16 | 0b100 |
/// | `Div32` | ÷32 | 0b101 |
/// | `Div64` | ÷64 | 0b110 |
/// | `Div128` | ÷128 | 0b111 |
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AsyncPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl AsyncPrescaler {
    pub const ALL: [AsyncPrescaler; 8] = [
        AsyncPrescaler::Div1,
        AsyncPrescaler::Div2,
        AsyncPrescaler::Div4,
        AsyncPrescaler::Div8,
        AsyncPrescaler::Div16,
        AsyncPrescaler::Div32,
        AsyncPrescaler::Div64,
        AsyncPrescaler::Div128,
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn divisor(self) -> u32 {
        1 << self.bits()
    }
}

/// Main-channel timing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MainTiming {
    pub prescaler: SyncPrescaler,
    clock_hz: u32,
}

impl MainTiming {
    pub fn new(clock: HertzU32, prescaler: SyncPrescaler) -> Self {
        Self {
            prescaler,
            clock_hz: clock.raw(),
        }
    }

    /// Pick the prescaler whose output frequency is closest to `target`, measured as a ratio.
    ///
    /// Ties go to the smaller divider. Fails if even the closest one is off by more than a factor
    /// of two.
    pub fn for_frequency(clock: HertzU32, target: HertzU32) -> Result<Self, TimingError> {
        let clock_hz = clock.raw();
        let target_hz = target.raw();
        if clock_hz == 0 || target_hz == 0 {
            return Err(TimingError::ZeroFrequency);
        }

        // (larger, smaller) of achieved and target frequency
        let mut best: Option<(SyncPrescaler, u64, u64)> = None;
        for p in SyncPrescaler::ALL {
            let f = clock_hz / (p.divisor() * MAIN_PERIOD_TICKS);
            if f == 0 {
                break;
            }
            let (hi, lo) = (f.max(target_hz) as u64, f.min(target_hz) as u64);
            let closer = match best {
                None => true,
                Some((_, best_hi, best_lo)) => hi * best_lo < best_hi * lo,
            };
            if closer {
                best = Some((p, hi, lo));
            }
        }

        match best {
            Some((p, hi, lo)) if hi <= lo * 2 => Ok(Self::new(clock, p)),
            _ => Err(TimingError::OutOfRange {
                clock_hz,
                target_hz,
            }),
        }
    }

    /// Input clock of the timer.
    #[inline]
    pub fn clock(&self) -> HertzU32 {
        HertzU32::from_raw(self.clock_hz)
    }

    /// Value for the period register.
    #[inline]
    pub const fn top(&self) -> u32 {
        MAIN_PERIOD_TICKS - 1
    }

    /// Resulting PWM frequency, rounded down.
    pub fn frequency(&self) -> HertzU32 {
        HertzU32::from_raw(self.clock_hz / (self.prescaler.divisor() * MAIN_PERIOD_TICKS))
    }
}

/// Charge-pump timing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AsyncTiming {
    pub prescaler: AsyncPrescaler,
    /// Period register value; the period lasts `period + 1` ticks.
    pub period: u32,
    clock_hz: u32,
}

impl AsyncTiming {
    /// Explicit prescaler and period register value.
    pub fn new(
        clock: HertzU32,
        prescaler: AsyncPrescaler,
        period: u32,
    ) -> Result<Self, TimingError> {
        if clock.raw() == 0 {
            return Err(TimingError::ZeroFrequency);
        }
        let ticks = period.saturating_add(1);
        if !(ASYNC_MIN_TICKS..=ASYNC_MAX_TICKS).contains(&ticks) {
            return Err(TimingError::OutOfRange {
                clock_hz: clock.raw(),
                target_hz: clock.raw() / prescaler.divisor() / ticks,
            });
        }
        Ok(Self {
            prescaler,
            period,
            clock_hz: clock.raw(),
        })
    }

    /// Smallest prescaler whose rounded period fits in [`ASYNC_MAX_TICKS`].
    pub fn for_frequency(clock: HertzU32, target: HertzU32) -> Result<Self, TimingError> {
        let clock_hz = clock.raw();
        let target_hz = target.raw();
        if clock_hz == 0 || target_hz == 0 {
            return Err(TimingError::ZeroFrequency);
        }

        for p in AsyncPrescaler::ALL {
            let div = p.divisor() as u64 * target_hz as u64;
            let ticks = ((clock_hz as u64 + div / 2) / div) as u32;
            if ticks <= ASYNC_MAX_TICKS {
                if ticks < ASYNC_MIN_TICKS {
                    break;
                }
                return Self::new(clock, p, ticks - 1);
            }
        }

        Err(TimingError::OutOfRange {
            clock_hz,
            target_hz,
        })
    }

    #[inline]
    pub fn clock(&self) -> HertzU32 {
        HertzU32::from_raw(self.clock_hz)
    }

    /// Compare value for a 50 % duty cycle.
    ///
    /// The output is active while the counter is above the compare value, i.e. for
    /// `period - compare` of the `period + 1` ticks. Always below `period`.
    #[inline]
    pub const fn compare(&self) -> u32 {
        self.period - (self.period + 1) / 2
    }

    /// Ticks per period with the output active.
    #[inline]
    pub const fn active_ticks(&self) -> u32 {
        self.period - self.compare()
    }

    pub fn frequency(&self) -> HertzU32 {
        HertzU32::from_raw(self.clock_hz / (self.prescaler.divisor() * (self.period + 1)))
    }
}
