//! Transceiver register map
//!
//! Opcodes follow the HI-3593 command set. Bit 7 of an opcode selects read access.

use a429_core::RxChannel;

pub const READ_BIT: u8 = 1 << 7;

/// Longest register payload (label filter memory)
pub const MAX_DATA_LENGTH: usize = 32;

pub const MASTER_RESET: u8 = 0x04;
pub const WRITE_TX_CONTROL: u8 = 0x08;
pub const WRITE_TX_FIFO: u8 = 0x0c;
pub const WRITE_FLAG_IRQ: u8 = 0x34;
pub const WRITE_ACLK_DIV: u8 = 0x38;
/// Starts transmission of the TX FIFO when the transmitter is not in automatic mode
pub const SEND_TX_FIFO: u8 = 0x40;

pub const READ_TX_STATUS: u8 = 0x80;
pub const READ_TX_CONTROL: u8 = 0x84;
pub const READ_FLAG_IRQ: u8 = 0xd0;
pub const READ_ACLK_DIV: u8 = 0xd4;

/// Register opcodes of one receiver
#[derive(Debug, Clone, Copy)]
pub struct RxOpcodes {
    pub write_control: u8,
    pub write_label_filter: u8,
    pub write_priority_labels: u8,
    pub read_status: u8,
    pub read_control: u8,
    pub read_label_filter: u8,
    pub read_priority_labels: u8,
    pub read_fifo: u8,
    pub read_mailbox: [u8; 3],
}

static RX_OPCODES: [RxOpcodes; 2] = [
    RxOpcodes {
        write_control: 0x10,
        write_label_filter: 0x14,
        write_priority_labels: 0x18,
        read_status: 0x90,
        read_control: 0x94,
        read_label_filter: 0x98,
        read_priority_labels: 0x9c,
        read_fifo: 0xa0,
        read_mailbox: [0xa4, 0xa8, 0xac],
    },
    RxOpcodes {
        write_control: 0x24,
        write_label_filter: 0x28,
        write_priority_labels: 0x2c,
        read_status: 0xb0,
        read_control: 0xb4,
        read_label_filter: 0xb8,
        read_priority_labels: 0xbc,
        read_fifo: 0xc0,
        read_mailbox: [0xc4, 0xc8, 0xcc],
    },
];

pub fn rx(channel: RxChannel) -> &'static RxOpcodes {
    &RX_OPCODES[channel.index()]
}

/// Transmitter control register bits
pub mod tx_control {
    /// Output stage in high impedance
    pub const HIZ: u8 = 1 << 7;
    /// Reverse label bit order
    pub const FLIP: u8 = 1 << 6;
    /// Transmit as soon as the FIFO holds data
    pub const AUTO_SEND: u8 = 1 << 5;
    pub const SELF_TEST: u8 = 1 << 4;
    pub const EVEN_PARITY: u8 = 1 << 3;
    /// Replace bit 32 with a generated parity bit
    pub const PARITY: u8 = 1 << 2;
    pub const LOW_SPEED: u8 = 1 << 0;
}

/// Receiver control register bits
pub mod rx_control {
    /// Reverse label bit order
    pub const FLIP: u8 = 1 << 7;
    pub const SD9: u8 = 1 << 6;
    pub const SD10: u8 = 1 << 5;
    pub const SD_ON: u8 = 1 << 4;
    /// Check parity, bit 32 then carries the parity error flag
    pub const PARITY: u8 = 1 << 3;
    /// Admit only labels set in the label filter memory
    pub const LABEL_RECOGNITION: u8 = 1 << 2;
    pub const PRIORITY_LABELS: u8 = 1 << 1;
    pub const LOW_SPEED: u8 = 1 << 0;
}

/// Bit 32 of a received frame when parity checking is enabled
pub const RX_PARITY_ERROR: u32 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
}

/// Register access properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpcodeInfo {
    pub access: Access,
    /// Number of data bytes following the opcode
    pub length: usize,
}

impl OpcodeInfo {
    const fn write(length: usize) -> Option<Self> {
        Some(Self {
            access: Access::Write,
            length,
        })
    }

    const fn read(length: usize) -> Option<Self> {
        Some(Self {
            access: Access::Read,
            length,
        })
    }
}

/// Access properties of a defined opcode, `None` for undefined opcodes
pub const fn lookup(opcode: u8) -> Option<OpcodeInfo> {
    match opcode {
        MASTER_RESET | SEND_TX_FIFO => OpcodeInfo::write(0),
        WRITE_TX_CONTROL | WRITE_FLAG_IRQ | WRITE_ACLK_DIV => OpcodeInfo::write(1),
        0x10 | 0x24 => OpcodeInfo::write(1),
        WRITE_TX_FIFO => OpcodeInfo::write(4),
        0x14 | 0x28 => OpcodeInfo::write(MAX_DATA_LENGTH),
        0x18 | 0x2c => OpcodeInfo::write(3),
        READ_TX_STATUS | READ_TX_CONTROL | READ_FLAG_IRQ | READ_ACLK_DIV => OpcodeInfo::read(1),
        0x90 | 0x94 | 0xb0 | 0xb4 => OpcodeInfo::read(1),
        0x98 | 0xb8 => OpcodeInfo::read(MAX_DATA_LENGTH),
        0x9c | 0xbc => OpcodeInfo::read(3),
        0xa0 | 0xc0 => OpcodeInfo::read(4),
        0xa4 | 0xa8 | 0xac | 0xc4 | 0xc8 | 0xcc => OpcodeInfo::read(3),
        _ => None,
    }
}
