// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Charger firmware entry point.
//!
//! Brings up the charge pump and the main drive, reports the result on the debug console and then
//! sweeps the main-drive duty cycle as a bring-up exercise.

#![no_main]
#![no_std]

use core::fmt::{self, Write};

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;
use fugit::HertzU32;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{self, Config, Serial},
};
use stm32f7xx_hal as hal;

use charger::config::{ChargerConfig, CONSOLE_BAUD, HSI_HZ, RAMP_STEP_MS};
use charger::control::{Charger, DutyCycle, Ramp};
use charger::hw::{BoardPins, Led, Register, Stm32Registers, SysDelay, Usart};

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks: HSI system clock, 1 MHz on the AHB and APB1 buses (and so on TIM4)
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.hclk(1.MHz()).freeze();
    let mut delay = SysDelay::new(cp.SYST, clocks.hclk().raw());

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB);

    // LED
    let mut led_green = Led::active_high(pins.leds.green);
    let mut led_blue = Led::active_high(pins.leds.blue);
    let mut led_red = Led::active_high(pins.leds.red);

    // USART1 (DBG)
    let usart_cfg = Config {
        baud_rate: CONSOLE_BAUD.bps(),
        ..Default::default()
    };
    let serial = Serial::new(
        dp.USART1,
        (pins.usart1.tx, pins.usart1.rx),
        &clocks,
        usart_cfg,
    );
    let mut console = Usart::new(serial);
    console.println("charger: boot");

    // PWM subsystem
    let regs = Stm32Registers::new(dp.GPIOD, dp.LPTIM1, dp.TIM4);
    let config = ChargerConfig::new(clocks.timclk1(), HertzU32::from_raw(HSI_HZ));

    let mut charger = match Charger::new(regs, &config) {
        Ok(charger) => charger,
        Err(e) => fault(&mut console, &mut led_red, e),
    };

    match charger.start(&mut delay) {
        Ok(report) => {
            let _ = write!(
                console,
                "charger: running after {} attempt(s), {} lock polls\r\n",
                report.attempts, report.lock_polls
            );
            console.write_str("  main drive   ");
            console.print_hz(report.main_frequency);
            console.write_str("\r\n  charge pump  ");
            console.print_hz(report.charge_pump_frequency);
            console.write_str("\r\n");
        }
        Err(e) => fault(&mut console, &mut led_red, e),
    }

    for reg in Register::ALL {
        if reg != Register::SyncEvent {
            console.print_register(reg, charger.read_register(reg));
        }
    }
    console.flush();

    led_green.on();

    let mut ramp = Ramp::default();
    loop {
        let duty = ramp.next().unwrap_or(DutyCycle::OFF);
        if let Err(e) = charger.set_duty_cycle(duty) {
            fault(&mut console, &mut led_red, e);
        }
        if duty == DutyCycle::OFF {
            led_blue.toggle();
        }
        delay.delay_ms(RAMP_STEP_MS);
    }
}

/// Report `err`, light the fault LED and stop.
fn fault<U, E>(console: &mut Usart<U>, led: &mut Led<'B', 14>, err: E) -> !
where
    U: serial::Instance,
    E: fmt::Display,
{
    let _ = write!(console, "charger: fault: {}\r\n", err);
    console.flush();
    led.on();

    loop {
        cortex_m::asm::nop();
    }
}
