//! Low-level chip access for debugging
//!
//! Register transfers are checked against the opcode table before they reach the chip, so a
//! typo on the host side cannot issue a transfer of the wrong direction or length.

use a429_driver::opcode::{self, Access};
use a429_driver::{Discrete, Transceiver};
use heapless::Vec;

/// Register access failure, reported to the host by code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RwError {
    /// The opcode is read-only
    NoWrite,
    /// The opcode is write-only
    NoRead,
    InvalidOpCode,
    InvalidLength,
    Spi,
}

impl RwError {
    /// Status code of a register access response, 0 being success
    pub const fn code(self) -> u8 {
        match self {
            RwError::NoWrite => 1,
            RwError::NoRead => 2,
            RwError::InvalidOpCode => 3,
            RwError::InvalidLength => 4,
            RwError::Spi => 5,
        }
    }
}

/// Discrete signal levels as bitmaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Discretes {
    /// Receiver signals, bit n being `RX_LAYOUT[n]`
    pub rx: u16,
    /// Bit n being `TX_LAYOUT[n]`
    pub tx: u16,
}

/// Receiver bitmap order, RX1 signals first with the mailboxes in descending order
pub const RX_LAYOUT: [Discrete; 10] = [
    Discrete::R1Int,
    Discrete::R1Flag,
    Discrete::Mb13,
    Discrete::Mb12,
    Discrete::Mb11,
    Discrete::R2Int,
    Discrete::R2Flag,
    Discrete::Mb23,
    Discrete::Mb22,
    Discrete::Mb21,
];

pub const TX_LAYOUT: [Discrete; 2] = [Discrete::TxEmpty, Discrete::TxFull];

fn pack<C: Transceiver + ?Sized>(chip: &mut C, layout: &[Discrete]) -> u16 {
    layout
        .iter()
        .enumerate()
        .fold(0, |bits, (bit, &discrete)| {
            bits | u16::from(chip.discrete(discrete)) << bit
        })
}

pub fn discretes<C: Transceiver + ?Sized>(chip: &mut C) -> Discretes {
    Discretes {
        rx: pack(chip, &RX_LAYOUT),
        tx: pack(chip, &TX_LAYOUT),
    }
}

pub fn read_register<C: Transceiver + ?Sized>(
    chip: &mut C,
    opcode: u8,
) -> Result<Vec<u8, { opcode::MAX_DATA_LENGTH }>, RwError> {
    let info = opcode::lookup(opcode).ok_or(RwError::InvalidOpCode)?;
    if info.access != Access::Read {
        return Err(RwError::NoRead);
    }
    let mut data = Vec::new();
    unwrap!(data.resize_default(info.length));
    chip.read_register(opcode, &mut data).map_err(|_| {
        warn!("debug read of {:#x} failed", opcode);
        RwError::Spi
    })?;
    Ok(data)
}

pub fn write_register<C: Transceiver + ?Sized>(
    chip: &mut C,
    opcode: u8,
    data: &[u8],
) -> Result<(), RwError> {
    let info = opcode::lookup(opcode).ok_or(RwError::InvalidOpCode)?;
    if info.access != Access::Write {
        return Err(RwError::NoWrite);
    }
    if data.len() != info.length {
        return Err(RwError::InvalidLength);
    }
    chip.write_register(opcode, data).map_err(|_| {
        warn!("debug write of {:#x} failed", opcode);
        RwError::Spi
    })
}
