//! HI-3593 ARINC429 transceiver driver for the a429 bridge
//!
//! The chip is accessed through an `embedded-hal` SPI device: every transfer is one chip-select
//! frame holding the opcode byte followed by the register data. The discrete status outputs are
//! read from twelve input pins.
//!
//! # Pin order
//!
//! Input pins are passed in `Discrete` index order:
//! MB1-1, MB1-2, MB1-3, MB2-1, MB2-2, MB2-3, R2INT, R2FLAG, R1INT, R1FLAG, TEMPTY, TFULL.
//!
//! # Limitations
//!
//! * The master reset uses the reset opcode. A board with the MR pin wired to the MCU should
//!   pulse it before handing the chip to the bridge.
//! * Pin read errors report the signal as low.
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod config;

use a429_driver::opcode::{self, MAX_DATA_LENGTH, READ_BIT};
use a429_driver::{Discrete, SpiError, Transceiver};
use embedded_hal::digital::InputPin;
use embedded_hal::spi::{Operation, SpiDevice};

pub use config::Config;

pub struct Hi3593<SPI, P> {
    spi: SPI,
    pins: [P; Discrete::COUNT],
    config: Config,
}

impl<SPI: SpiDevice, P: InputPin> Hi3593<SPI, P> {
    pub fn new(spi: SPI, pins: [P; Discrete::COUNT], config: Config) -> Self {
        Self { spi, pins, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn release(self) -> (SPI, [P; Discrete::COUNT]) {
        (self.spi, self.pins)
    }
}

impl<SPI: SpiDevice, P: InputPin> Transceiver for Hi3593<SPI, P> {
    fn write_register(&mut self, opcode: u8, data: &[u8]) -> Result<(), SpiError> {
        debug_assert!(data.len() <= MAX_DATA_LENGTH);
        debug_assert!(opcode & READ_BIT == 0);
        self.spi
            .transaction(&mut [Operation::Write(&[opcode]), Operation::Write(data)])
            .map_err(|_| {
                trace!("SPI write of {:#x} failed", opcode);
                SpiError
            })
    }

    fn read_register(&mut self, opcode: u8, data: &mut [u8]) -> Result<(), SpiError> {
        debug_assert!(data.len() <= MAX_DATA_LENGTH);
        self.spi
            .transaction(&mut [Operation::Write(&[opcode | READ_BIT]), Operation::Read(data)])
            .map_err(|_| {
                trace!("SPI read of {:#x} failed", opcode);
                SpiError
            })
    }

    fn discrete(&mut self, discrete: Discrete) -> bool {
        self.pins[discrete.index()].is_high().unwrap_or(false)
    }

    fn reset(&mut self) -> Result<(), SpiError> {
        self.write_register(opcode::MASTER_RESET, &[])?;
        self.write_register(opcode::WRITE_ACLK_DIV, &[self.config.aclk_div])?;
        self.write_register(opcode::WRITE_FLAG_IRQ, &[self.config.flag_irq])?;
        debug!("HI-3593 reset, ACLK div {}", self.config.aclk_div);
        Ok(())
    }
}
