// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Register access layer.
//!
//! The PWM drivers never touch memory-mapped registers directly. They go through a
//! [`RegisterFile`], which exposes masked read-modify-write over the logical registers named by
//! [`Register`]. The hardware backend maps these onto STM32F7 peripherals (see
//! [`crate::hw::stm32`]); the simulated backend in [`crate::hw::sim`] keeps them in RAM so the
//! drivers can be exercised on the host.
//!
//! Bit layouts are described with [`Field`] constants grouped per register in [`bits`], in the
//! same spirit as the `reg` constants of a device driver.

/// Logical registers used by the charger PWM subsystem.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Register {
    /// Pin direction / mode for the PWM output port.
    PinMode,
    /// Alternate-function select for the PWM output pins.
    PinFunction,
    /// Bus clock gates for the GPIO port.
    Ahb1Enable,
    /// Bus clock gates for the two timers.
    Apb1Enable,
    /// Asynchronous clock (PLL) enable and lock status.
    ClockControl,
    /// Kernel clock source of the asynchronous timer.
    KernelClock,
    /// Asynchronous timer configuration: clock, waveform, polarity, prescaler.
    AsyncConfig,
    /// Asynchronous timer enable and counter start.
    AsyncControl,
    /// Asynchronous timer period (top value).
    AsyncPeriod,
    /// Asynchronous timer compare value (charge-pump duty).
    AsyncCompare,
    /// Synchronous timer control: counter enable, direction, preload.
    SyncControl,
    /// Synchronous timer control A: output-compare mode per channel.
    SyncModeA,
    /// Synchronous timer control B: output enable and polarity per channel.
    SyncModeB,
    /// Synchronous timer prescaler.
    SyncPrescaler,
    /// Synchronous timer period (top value).
    SyncPeriod,
    /// Synchronous timer compare value (main duty cycle).
    SyncCompare,
    /// Synchronous timer event generation.
    SyncEvent,
}

impl Register {
    /// Number of logical registers.
    pub const COUNT: usize = 17;

    /// Every register, in declaration order.
    pub const ALL: [Register; Register::COUNT] = [
        Register::PinMode,
        Register::PinFunction,
        Register::Ahb1Enable,
        Register::Apb1Enable,
        Register::ClockControl,
        Register::KernelClock,
        Register::AsyncConfig,
        Register::AsyncControl,
        Register::AsyncPeriod,
        Register::AsyncCompare,
        Register::SyncControl,
        Register::SyncModeA,
        Register::SyncModeB,
        Register::SyncPrescaler,
        Register::SyncPeriod,
        Register::SyncCompare,
        Register::SyncEvent,
    ];

    /// Dense index, usable for register-file arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Registers owned by the asynchronous (charge-pump) timer.
    pub fn is_async_timer(self) -> bool {
        matches!(
            self,
            Register::KernelClock
                | Register::AsyncConfig
                | Register::AsyncControl
                | Register::AsyncPeriod
                | Register::AsyncCompare
        )
    }
}

/// A contiguous bit field inside a 32-bit register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Field {
    offset: u8,
    width: u8,
}

impl Field {
    pub const fn new(offset: u8, width: u8) -> Self {
        Self { offset, width }
    }

    /// Single-bit field.
    pub const fn bit(offset: u8) -> Self {
        Self::new(offset, 1)
    }

    #[inline]
    pub const fn offset(&self) -> u8 {
        self.offset
    }

    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Mask of the field, in register position.
    #[inline]
    pub const fn mask(&self) -> u32 {
        let low = if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        low << self.offset
    }

    /// Shift `value` into register position, truncated to the field width.
    #[inline]
    pub const fn bits(&self, value: u32) -> u32 {
        (value << self.offset) & self.mask()
    }

    /// Extract the field value from a full register value.
    #[inline]
    pub const fn extract(&self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.offset
    }
}

/// Masked access to the logical register file.
///
/// Only [`read`](RegisterFile::read) and [`write`](RegisterFile::write) are required. Backends
/// whose registers can be touched from interrupt context should override
/// [`apply`](RegisterFile::apply) so the read-modify-write is atomic.
pub trait RegisterFile {
    fn read(&mut self, reg: Register) -> u32;

    fn write(&mut self, reg: Register, value: u32);

    /// Read-modify-write: `reg = (reg & clear_mask) | set_mask`.
    ///
    /// `clear_mask` is the complement of the bits being changed, so unrelated bits survive.
    fn apply(&mut self, reg: Register, clear_mask: u32, set_mask: u32) {
        let value = self.read(reg);
        self.write(reg, (value & clear_mask) | set_mask);
    }

    #[inline]
    fn set_bits(&mut self, reg: Register, bits: u32) {
        self.apply(reg, !bits, bits);
    }

    #[inline]
    fn clear_bits(&mut self, reg: Register, bits: u32) {
        self.apply(reg, !bits, 0);
    }

    /// Replace one field, leaving the rest of the register untouched.
    #[inline]
    fn write_field(&mut self, reg: Register, field: Field, value: u32) {
        self.apply(reg, !field.mask(), field.bits(value));
    }

    #[inline]
    fn read_field(&mut self, reg: Register, field: Field) -> u32 {
        field.extract(self.read(reg))
    }

    #[inline]
    fn is_set(&mut self, reg: Register, field: Field) -> bool {
        self.read(reg) & field.mask() == field.mask()
    }
}

impl<R: RegisterFile + ?Sized> RegisterFile for &mut R {
    #[inline]
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }

    #[inline]
    fn apply(&mut self, reg: Register, clear_mask: u32, set_mask: u32) {
        (**self).apply(reg, clear_mask, set_mask)
    }
}

/// Bit layouts of the logical registers (STM32F7 reference manual RM0410).
pub mod bits {
    use super::Field;

    /// PWM output pins on the GPIO port.
    pub mod pins {
        /// Main drive output: PD12 (TIM4_CH1).
        pub const MAIN_DRIVE: u8 = 12;
        /// Charge-pump output: PD13 (LPTIM1_OUT).
        pub const CHARGE_PUMP: u8 = 13;
    }

    /// `PinMode`: two bits per pin.
    ///
    /// | value | mode |
    /// | ----- | ---- |
    /// | 0b00 | input |
    /// | 0b01 | general-purpose output |
    /// | 0b10 | alternate function (driven by a peripheral) |
    /// | 0b11 | analog |
    pub mod pin_mode {
        use super::Field;

        pub const INPUT: u32 = 0b00;
        pub const OUTPUT: u32 = 0b01;
        pub const ALTERNATE: u32 = 0b10;
        pub const ANALOG: u32 = 0b11;

        pub const fn pin(n: u8) -> Field {
            Field::new(n * 2, 2)
        }
    }

    /// `PinFunction`: four bits per pin for pins 8..=15.
    pub mod pin_function {
        use super::Field;

        /// TIM4_CH1 on PD12.
        pub const AF_TIM4: u32 = 2;
        /// LPTIM1_OUT on PD13.
        pub const AF_LPTIM1: u32 = 3;

        pub const fn pin(n: u8) -> Field {
            Field::new((n - 8) * 4, 4)
        }
    }

    /// `Ahb1Enable`
    pub mod ahb1 {
        use super::Field;

        pub const GPIOD_EN: Field = Field::bit(3);
    }

    /// `Apb1Enable`
    pub mod apb1 {
        use super::Field;

        pub const TIM4_EN: Field = Field::bit(2);
        pub const LPTIM1_EN: Field = Field::bit(9);
    }

    /// `ClockControl`: the HSI oscillator that clocks the asynchronous timer.
    pub mod clock_control {
        use super::Field;

        /// Enable.
        pub const ON: Field = Field::bit(0);
        /// Lock/ready status, set by hardware.
        pub const READY: Field = Field::bit(1);
    }

    /// `KernelClock`
    ///
    /// | LPTIM1SEL | kernel clock |
    /// | --------- | ------------ |
    /// | 0b00 | APB1 (synchronous) |
    /// | 0b01 | LSI |
    /// | 0b10 | HSI (asynchronous) |
    /// | 0b11 | LSE |
    pub mod kernel_clock {
        use super::Field;

        pub const LPTIM1_SEL: Field = Field::new(24, 2);
    }

    /// `AsyncConfig` (LPTIM1_CFGR). Only writable while the timer is disabled.
    pub mod async_config {
        use super::Field;

        /// 0 = internal kernel clock, 1 = external input.
        pub const CKSEL: Field = Field::bit(0);
        /// Prescaler, ÷2^PRESC.
        pub const PRESC: Field = Field::new(9, 3);
        /// 0 = PWM waveform, 1 = set-once.
        pub const WAVE: Field = Field::bit(20);
        /// 0 = non-inverted, 1 = inverted output.
        pub const WAVPOL: Field = Field::bit(21);
        /// Period/compare update at the end of the current period.
        pub const PRELOAD: Field = Field::bit(22);
    }

    /// `AsyncControl` (LPTIM1_CR)
    pub mod async_control {
        use super::Field;

        pub const ENABLE: Field = Field::bit(0);
        pub const SNGSTRT: Field = Field::bit(1);
        pub const CNTSTRT: Field = Field::bit(2);
    }

    /// `SyncControl` (TIM4_CR1)
    pub mod sync_control {
        use super::Field;

        pub const CEN: Field = Field::bit(0);
        /// 0 = up-counting.
        pub const DIR: Field = Field::bit(4);
        /// 0b00 = edge-aligned (fast PWM).
        pub const CMS: Field = Field::new(5, 2);
        /// Auto-reload preload.
        pub const ARPE: Field = Field::bit(7);
    }

    /// `SyncModeA` (TIM4_CCMR1, output mode)
    ///
    /// | OCxM | effect |
    /// | ---- | ------ |
    /// | 0b000 | frozen, output disconnected from compare |
    /// | 0b110 | PWM mode 1: active while counter < compare |
    /// | 0b111 | PWM mode 2: inactive while counter < compare |
    pub mod sync_mode_a {
        use super::Field;

        pub const CC1S: Field = Field::new(0, 2);
        pub const OC1PE: Field = Field::bit(3);
        pub const OC1M: Field = Field::new(4, 3);
        pub const CC2S: Field = Field::new(8, 2);
        pub const OC2PE: Field = Field::bit(11);
        pub const OC2M: Field = Field::new(12, 3);

        pub const OCM_FROZEN: u32 = 0b000;
        pub const OCM_PWM1: u32 = 0b110;
    }

    /// `SyncModeB` (TIM4_CCER)
    pub mod sync_mode_b {
        use super::Field;

        pub const CC1E: Field = Field::bit(0);
        pub const CC1P: Field = Field::bit(1);
        pub const CC2E: Field = Field::bit(4);
        pub const CC2P: Field = Field::bit(5);
    }

    /// `SyncEvent` (TIM4_EGR)
    pub mod sync_event {
        use super::Field;

        /// Update generation: reloads prescaler and preloaded registers.
        pub const UG: Field = Field::bit(0);
    }
}
