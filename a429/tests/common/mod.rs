#![allow(dead_code)]

use std::collections::VecDeque;

use a429::core::RxChannel;
use a429::driver::{opcode, Discrete, SpiError, Transceiver, Transport};
use a429::format::fid;
use a429::time::Instant;
use a429::{Bridge, Config};

/// Transceiver with scripted receive FIFOs and a log of register writes
#[derive(Default)]
pub struct FakeChip {
    pub rx_fifo: [VecDeque<u32>; 2],
    pub tx_fifo: Vec<u32>,
    /// Levels of the signals not derived from the FIFOs
    pub levels: [bool; Discrete::COUNT],
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Opcodes of every successful read and write, in order
    pub transfers: Vec<u8>,
    pub fail_writes: bool,
    pub fail_reads: bool,
    pub resets: usize,
}

impl FakeChip {
    pub fn push_rx(&mut self, channel: RxChannel, frame: u32) {
        self.rx_fifo[channel.index()].push_back(frame);
    }

    /// Data of the last write to `opcode`
    pub fn last_write(&self, opcode: u8) -> Option<&[u8]> {
        self.writes
            .iter()
            .rev()
            .find(|(op, _)| *op == opcode)
            .map(|(_, data)| data.as_slice())
    }

    pub fn write_count(&self, opcode: u8) -> usize {
        self.writes.iter().filter(|(op, _)| *op == opcode).count()
    }
}

impl Transceiver for FakeChip {
    fn write_register(&mut self, opcode: u8, data: &[u8]) -> Result<(), SpiError> {
        if self.fail_writes {
            return Err(SpiError);
        }
        if opcode == opcode::WRITE_TX_FIFO {
            self.tx_fifo.push(u32::from_be_bytes(data.try_into().unwrap()));
        }
        self.writes.push((opcode, data.to_vec()));
        self.transfers.push(opcode);
        Ok(())
    }

    fn read_register(&mut self, opcode: u8, data: &mut [u8]) -> Result<(), SpiError> {
        if self.fail_reads {
            return Err(SpiError);
        }
        data.fill(0);
        for channel in RxChannel::all() {
            if opcode == opcode::rx(channel).read_fifo {
                if let Some(frame) = self.rx_fifo[channel.index()].pop_front() {
                    data.copy_from_slice(&frame.to_be_bytes());
                }
            }
        }
        self.transfers.push(opcode);
        Ok(())
    }

    fn discrete(&mut self, discrete: Discrete) -> bool {
        match discrete {
            Discrete::R1Flag => !self.rx_fifo[0].is_empty(),
            Discrete::R2Flag => !self.rx_fifo[1].is_empty(),
            _ => self.levels[discrete.index()],
        }
    }

    fn reset(&mut self) -> Result<(), SpiError> {
        if self.fail_writes {
            return Err(SpiError);
        }
        self.resets += 1;
        Ok(())
    }
}

/// Host link recording every message
#[derive(Default)]
pub struct FakeHost {
    pub messages: Vec<Vec<u8>>,
    pub busy: bool,
}

impl FakeHost {
    pub fn callbacks(&self) -> Vec<Callback> {
        self.messages.iter().map(|message| Callback::parse(message)).collect()
    }

    pub fn take(&mut self) -> Vec<Callback> {
        let callbacks = self.callbacks();
        self.messages.clear();
        callbacks
    }
}

impl Transport for FakeHost {
    fn send_possible(&mut self) -> bool {
        !self.busy
    }

    fn send(&mut self, message: &[u8]) {
        self.messages.push(message.to_vec());
    }
}

/// Decoded callback message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub fid: u8,
    pub channel: u8,
    pub status: u8,
    pub seq: u8,
    pub timestamp: u16,
    pub payload: Vec<u8>,
}

impl Callback {
    pub fn parse(message: &[u8]) -> Self {
        let expected = match message[0] {
            fid::HEARTBEAT => 10,
            fid::FRAME_MESSAGE => 12,
            fid::SCHEDULER_MESSAGE => 7,
            other => panic!("unknown function id {other}"),
        };
        assert_eq!(message.len(), expected);
        Self {
            fid: message[0],
            channel: message[1],
            status: message[2],
            seq: message[3],
            timestamp: u16::from_le_bytes([message[4], message[5]]),
            payload: message[6..].to_vec(),
        }
    }

    pub fn frame(&self) -> u32 {
        assert_eq!(self.fid, fid::FRAME_MESSAGE);
        u32::from_le_bytes(self.payload[..4].try_into().unwrap())
    }

    pub fn age(&self) -> u16 {
        assert_eq!(self.fid, fid::FRAME_MESSAGE);
        u16::from_le_bytes([self.payload[4], self.payload[5]])
    }

    pub fn processed(&self) -> u16 {
        assert_eq!(self.fid, fid::HEARTBEAT);
        u16::from_le_bytes([self.payload[0], self.payload[1]])
    }

    pub fn lost(&self) -> u16 {
        assert_eq!(self.fid, fid::HEARTBEAT);
        u16::from_le_bytes([self.payload[2], self.payload[3]])
    }

    pub fn userdata(&self) -> u8 {
        assert_eq!(self.fid, fid::SCHEDULER_MESSAGE);
        self.payload[0]
    }
}

pub struct Bench {
    pub bridge: Bridge,
    pub chip: FakeChip,
    pub host: FakeHost,
}

impl Bench {
    /// A bridge past its power-on resets at t = 0 ms
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut bench = Self {
            bridge: Bridge::new(config),
            chip: FakeChip::default(),
            host: FakeHost::default(),
        };
        bench.tick(0);
        bench.chip.writes.clear();
        bench.chip.transfers.clear();
        bench
    }

    pub fn tick(&mut self, ms: u64) {
        self.bridge
            .tick(Instant::from_millis(ms), &mut self.chip, &mut self.host);
    }

    /// Ticks every millisecond in `from..=to`
    pub fn run(&mut self, from: u64, to: u64) {
        for ms in from..=to {
            self.tick(ms);
        }
    }
}
