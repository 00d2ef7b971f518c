// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Debug console on a USART.
//!
//! Transmit-only. Besides plain strings it can print decimal numbers, frequencies and register
//! values, which is all the charger ever reports.
//!
//! Note: When using `writeln!`, be sure to include `\r` (CR) in the format string to ensure correct
//! line endings on the terminal.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 38400
//! ```

use core::fmt;
use fugit::HertzU32;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

use crate::hw::regs::Register;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    /// Keep the transmitter; the receiver is dropped.
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        s.bytes().for_each(|b| self.write_byte(b));
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the last byte has left the shift register.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }

    pub fn print_u32(&mut self, n: u32) {
        let mut buf = [0u8; 10];
        let digits = format_u32(n, &mut buf);
        digits.iter().for_each(|&b| self.write_byte(b));
    }

    /// `0x0000_0000` form, as in the reference manual.
    pub fn print_hex_u32(&mut self, n: u32) {
        let mut buf = [0u8; 11];
        format_hex_u32(n, &mut buf)
            .iter()
            .for_each(|&b| self.write_byte(b));
    }

    /// Frequency in Hz, e.g. `20000 Hz`.
    pub fn print_hz(&mut self, f: HertzU32) {
        self.print_u32(f.raw());
        self.write_str(" Hz");
    }

    /// One line of a register dump: `SyncCompare = 0x0000_0080`.
    pub fn print_register(&mut self, reg: Register, value: u32) {
        let _ = fmt::Write::write_fmt(self, format_args!("{:?} = ", reg));
        self.print_hex_u32(value);
        self.write_str("\r\n");
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// Decimal digits of `n`, most significant first.
fn format_u32(mut n: u32, buf: &mut [u8; 10]) -> &[u8] {
    let mut i = buf.len();
    loop {
        i -= 1;
        buf[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[i..]
}

fn format_hex_u32(n: u32, buf: &mut [u8; 11]) -> &[u8] {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    buf[0] = b'0';
    buf[1] = b'x';
    let mut i = 2;
    for (nibble, shift) in (0..=28).rev().step_by(4).enumerate() {
        if nibble == 4 {
            buf[i] = b'_';
            i += 1;
        }
        buf[i] = HEX[((n >> shift) & 0xF) as usize];
        i += 1;
    }
    &buf[..i]
}
