/// Register transfer failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiError;

/// Discrete status signals of the transceiver
///
/// The numeric value is the position in the driver's input pin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Discrete {
    /// RX1 priority mailbox 1 holds a new frame
    Mb11 = 0,
    Mb12 = 1,
    Mb13 = 2,
    /// RX2 priority mailbox 1 holds a new frame
    Mb21 = 3,
    Mb22 = 4,
    Mb23 = 5,
    R2Int = 6,
    /// RX2 FIFO is not empty
    R2Flag = 7,
    R1Int = 8,
    /// RX1 FIFO is not empty
    R1Flag = 9,
    /// TX FIFO is empty
    TxEmpty = 10,
    /// TX FIFO is full
    TxFull = 11,
}

impl Discrete {
    pub const COUNT: usize = 12;

    pub const ALL: [Discrete; Self::COUNT] = [
        Discrete::Mb11,
        Discrete::Mb12,
        Discrete::Mb13,
        Discrete::Mb21,
        Discrete::Mb22,
        Discrete::Mb23,
        Discrete::R2Int,
        Discrete::R2Flag,
        Discrete::R1Int,
        Discrete::R1Flag,
        Discrete::TxEmpty,
        Discrete::TxFull,
    ];

    /// FIFO-not-empty signal of the given RX channel
    pub const fn rx_fifo_flag(channel: a429_core::RxChannel) -> Discrete {
        match channel.index() {
            0 => Discrete::R1Flag,
            _ => Discrete::R2Flag,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// ARINC429 transceiver chip
///
/// Registers are selected by opcode. Frames are exchanged in the chip's high-byte-first layout.
pub trait Transceiver {
    /// Writes `data` to the register selected by `opcode`
    fn write_register(&mut self, opcode: u8, data: &[u8]) -> Result<(), SpiError>;

    /// Fills `data` from the register selected by `opcode`
    fn read_register(&mut self, opcode: u8, data: &mut [u8]) -> Result<(), SpiError>;

    /// Current level of a discrete signal
    fn discrete(&mut self, discrete: Discrete) -> bool;

    /// Master-resets the chip and writes its board-level setup (clock divider, flag pins)
    ///
    /// Channel registers are left at their reset values; the core rewrites them afterwards.
    fn reset(&mut self) -> Result<(), SpiError>;
}
