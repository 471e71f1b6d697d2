//! Transmit channels
//!
//! A TX channel sends frames from two sources: the immediate queue, drained one frame per tick,
//! and the scheduler, which walks the job table at the pace set by the job dwell times.

use a429_driver::opcode::{self, tx_control};
use a429_driver::{Discrete, Transceiver};

use crate::callback::CallbackQueue;
use crate::channel::{ChangeRequest, ChannelState};
use crate::consts::{TX_BUFFER_NUM, TX_QUEUE_SIZE};
use crate::core::{ChannelMode, FrameMode, Parity, Speed, TxChannel};
use crate::utils::{Bitmap, RingBuffer};

pub mod job;
pub mod scheduler;

pub use job::{Job, JobTable};
pub use scheduler::Scheduler;

const ELIGIBLE_WORDS: usize = TX_BUFFER_NUM / 32;

pub struct TxState {
    pub common: ChannelState,
    /// Frames written for immediate transmission
    pub queue: RingBuffer<u32, TX_QUEUE_SIZE>,
    pub jobs: JobTable,
    /// Frames sent by single and cyclic jobs
    pub frames: [u32; TX_BUFFER_NUM],
    /// Frame table entries a job may transmit
    pub eligible: Bitmap<ELIGIBLE_WORDS>,
    pub scheduler: Scheduler,
}

impl TxState {
    pub fn new() -> Self {
        Self {
            common: ChannelState::default(),
            queue: RingBuffer::new(),
            jobs: JobTable::new(),
            frames: [0; TX_BUFFER_NUM],
            eligible: Bitmap::new(),
            scheduler: Scheduler::default(),
        }
    }

    /// Queues a frame for immediate transmission, counting it lost if the queue is full
    pub fn write_direct(&mut self, frame: u32) {
        if self.queue.push(frame).is_err() {
            self.common.stats.count_lost();
        }
    }

    /// Stores a scheduled frame and arms it for transmission
    pub fn write_scheduled(&mut self, index: usize, frame: u32) {
        self.frames[index] = frame;
        self.eligible.set(index);
    }

    pub fn set_frame_mode(&mut self, index: usize, mode: FrameMode) {
        self.eligible.assign(index, mode == FrameMode::Transmit);
    }

    pub(crate) fn control_word(&self) -> u8 {
        let mut word = tx_control::FLIP | tx_control::AUTO_SEND;
        if self.common.mode == ChannelMode::Passive {
            word |= tx_control::HIZ;
        }
        if self.common.parity == Parity::Auto {
            word |= tx_control::PARITY;
        }
        if self.common.speed == Speed::Low {
            word |= tx_control::LOW_SPEED;
        }
        word
    }

    /// Applies pending configuration changes to the chip
    ///
    /// Requests whose register write failed stay pending and are retried on the next tick.
    pub(crate) fn apply_changes<C: Transceiver + ?Sized>(
        &mut self,
        channel: TxChannel,
        chip: &mut C,
        callbacks: &mut CallbackQueue,
        now: u32,
    ) {
        let request = self.common.change_request;
        if request.is_empty() {
            return;
        }
        debug!("TX{} apply {:?}", channel.index() + 1, request);
        let mut failed = ChangeRequest::NONE;

        if request.contains(ChangeRequest::OPERATING_MODE) {
            match self.common.mode {
                ChannelMode::Passive => self.common.stats.reset(),
                ChannelMode::Active => {}
                ChannelMode::Run => {
                    self.scheduler.start(now);
                    callbacks.reset_scheduler_sequence();
                    info!("TX{} scheduler started", channel.index() + 1);
                }
            }
        }

        let control_change = ChangeRequest::SPEED_PARITY | ChangeRequest::OPERATING_MODE;
        if request.intersects(control_change)
            && chip
                .write_register(opcode::WRITE_TX_CONTROL, &[self.control_word()])
                .is_err()
        {
            warn!("TX{} control write failed", channel.index() + 1);
            failed |= request & control_change;
        }

        self.common.change_request = failed;
    }

    /// Sends the oldest queued frame unless the chip FIFO is full
    pub(crate) fn send_direct<C: Transceiver + ?Sized>(&mut self, channel: TxChannel, chip: &mut C) {
        if !self.common.data_enabled() {
            return;
        }
        let Some(&frame) = self.queue.peek() else {
            return;
        };
        if chip.discrete(Discrete::TxFull) {
            return;
        }
        self.queue.pop();
        match chip.write_register(opcode::WRITE_TX_FIFO, &frame.to_be_bytes()) {
            Ok(()) => self.common.stats.count_processed(),
            Err(_) => {
                warn!("TX{} FIFO write failed", channel.index() + 1);
                self.common.stats.count_lost();
            }
        }
    }
}

impl Default for TxState {
    fn default() -> Self {
        Self::new()
    }
}
