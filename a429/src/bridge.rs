//! Tick orchestration
//!
//! One tick runs the phases in a fixed order:
//! 1. pending system requests (data reset, chip reset)
//! 2. channel configuration changes
//! 3. TX: one immediate frame, then the scheduler
//! 4. RX: FIFO ingestion
//! 5. RX: a slice of the timeout scan
//! 6. heartbeat
//! 7. at most one callback message to the host
//!
//! Configuration is applied before any data moves, so a channel never transfers frames under
//! stale chip settings. In debug mode only steps 1 and 7 run.

use a429_driver::{Transceiver, Transport};

use crate::callback::{CallbackQueue, Event};
use crate::channel::{ChangeRequest, Statistics};
use crate::config::Config;
use crate::consts::RX_BUFFER_NUM;
use crate::core::{
    A429Mode, Channel, ChannelMode, RxChannel, TxChannel, CHANNEL_COUNT, RX_CHANNEL_COUNT,
    TX_CHANNEL_COUNT,
};
use crate::format::{self, Header};
use crate::heartbeat::Heartbeat;
use crate::rx::RxState;
use crate::time::Instant;
use crate::tx::TxState;

/// Bridge-wide mode and reset requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemState {
    pub mode: A429Mode,
    /// Return all tables to their power-on state
    pub reset_data: bool,
    /// Reset and set up the transceiver chip
    pub reset_chip: bool,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            mode: A429Mode::Normal,
            reset_data: true,
            reset_chip: true,
        }
    }
}

/// Complete bridge state
///
/// The bridge owns no peripherals: the chip and the host link are passed into every tick.
pub struct Bridge {
    pub(crate) config: Config,
    pub(crate) tx: [TxState; TX_CHANNEL_COUNT],
    pub(crate) rx: [RxState; RX_CHANNEL_COUNT],
    pub(crate) heartbeat: Heartbeat,
    pub(crate) callbacks: CallbackQueue,
    pub(crate) system: SystemState,
    timeout_cursor: usize,
    /// Millisecond clock of the last tick
    pub(crate) now: u32,
}

impl Bridge {
    /// Creates a bridge with data and chip reset pending
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tx: core::array::from_fn(|_| TxState::new()),
            rx: core::array::from_fn(|_| RxState::new()),
            heartbeat: Heartbeat::default(),
            callbacks: CallbackQueue::new(),
            system: SystemState::default(),
            timeout_cursor: 0,
            now: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tx(&self, channel: TxChannel) -> &TxState {
        &self.tx[channel.index()]
    }

    pub fn rx(&self, channel: RxChannel) -> &RxState {
        &self.rx[channel.index()]
    }

    pub fn callbacks(&self) -> &CallbackQueue {
        &self.callbacks
    }

    pub fn system(&self) -> &SystemState {
        &self.system
    }

    pub fn statistics(&self, channel: Channel) -> Statistics {
        match channel {
            Channel::Tx(tx) => self.tx[tx.index()].common.stats,
            Channel::Rx(rx) => self.rx[rx.index()].common.stats,
        }
    }

    /// Runs one pass over all tick phases
    pub fn tick<C, T>(&mut self, now: Instant, chip: &mut C, host: &mut T)
    where
        C: Transceiver + ?Sized,
        T: Transport + ?Sized,
    {
        self.now = now.as_millis() as u32;

        self.process_system_requests(chip);
        if self.system.mode == A429Mode::Normal && !self.system.reset_chip {
            self.apply_changes(chip);
            self.transmit(chip);
            self.receive(chip);
            self.scan_timeouts();
            self.beat();
        }
        self.drain_callback(host);
    }

    fn process_system_requests<C: Transceiver + ?Sized>(&mut self, chip: &mut C) {
        if self.system.reset_data {
            info!("resetting bridge data");
            self.tx.iter_mut().for_each(|tx| *tx = TxState::new());
            self.rx.iter_mut().for_each(|rx| *rx = RxState::new());
            self.heartbeat = Heartbeat::default();
            self.callbacks.clear();
            self.timeout_cursor = 0;
            self.system.reset_data = false;
        }

        if self.system.reset_chip {
            match chip.reset() {
                Ok(()) => {
                    info!("chip reset");
                    self.tx.iter_mut().for_each(|tx| tx.common.request(ChangeRequest::ALL));
                    self.rx.iter_mut().for_each(|rx| rx.common.request(ChangeRequest::ALL));
                    self.system.reset_chip = false;
                }
                Err(_) => warn!("chip reset failed"),
            }
        }
    }

    fn apply_changes<C: Transceiver + ?Sized>(&mut self, chip: &mut C) {
        let now = self.now;
        for channel in TxChannel::all() {
            self.tx[channel.index()].apply_changes(channel, chip, &mut self.callbacks, now);
        }
        for channel in RxChannel::all() {
            self.rx[channel.index()].apply_changes(
                channel,
                chip,
                &mut self.callbacks,
                self.config.rx_fifo_drain_limit,
                now as u16,
            );
        }
    }

    fn transmit<C: Transceiver + ?Sized>(&mut self, chip: &mut C) {
        for channel in TxChannel::all() {
            let tx = &mut self.tx[channel.index()];
            tx.send_direct(channel, chip);
            tx.run_scheduler(
                channel,
                chip,
                &self.rx,
                &mut self.callbacks,
                &self.config,
                self.now,
            );
        }
    }

    fn receive<C: Transceiver + ?Sized>(&mut self, chip: &mut C) {
        for channel in RxChannel::all() {
            let rx = &mut self.rx[channel.index()];
            if !rx.common.data_enabled() {
                continue;
            }
            rx.ingest(
                channel,
                chip,
                &mut self.callbacks,
                self.config.rx_frame_budget,
                self.now as u16,
            );
        }
    }

    /// Checks the next slice of frame buffers for timeouts, round robin over all RX channels
    fn scan_timeouts(&mut self) {
        const POSITIONS: usize = RX_CHANNEL_COUNT * RX_BUFFER_NUM;

        for _ in 0..self.config.timeout_check_budget {
            let position = self.timeout_cursor;
            self.timeout_cursor = (position + 1) % POSITIONS;

            let channel = unwrap!(RxChannel::new(position / RX_BUFFER_NUM));
            let rx = &mut self.rx[channel.index()];
            if rx.common.mode == ChannelMode::Passive {
                continue;
            }
            rx.check_timeout(
                channel,
                position % RX_BUFFER_NUM,
                &mut self.callbacks,
                self.now as u16,
            );
        }
    }

    fn beat(&mut self) {
        if !self.heartbeat.poll(self.now) {
            return;
        }
        let on_change = self.heartbeat.mode.value_has_to_change();
        for flat_index in 0..CHANNEL_COUNT {
            let channel = unwrap!(Channel::from_flat_index(flat_index));
            let stats = match channel {
                Channel::Tx(tx) => &mut self.tx[tx.index()].common.stats,
                Channel::Rx(rx) => &mut self.rx[rx.index()].common.stats,
            };
            if on_change && !stats.changed() {
                continue;
            }
            if self
                .callbacks
                .enqueue(Event::Statistics(channel), self.now as u16, 0)
            {
                stats.mark_reported();
            } else {
                stats.count_lost();
            }
        }
    }

    /// Sends the oldest pending callback if the host link has room
    fn drain_callback<T: Transport + ?Sized>(&mut self, host: &mut T) {
        if self.callbacks.is_empty() || !host.send_possible() {
            return;
        }
        let Some(entry) = self.callbacks.pop() else {
            return;
        };

        let header = Header {
            channel: entry.event.channel().code(),
            status: entry.event.status(),
            seq: self.callbacks.next_sequence(entry.event),
            timestamp: entry.timestamp,
        };
        let message = match entry.event {
            Event::Statistics(channel) => {
                let stats = self.statistics(channel);
                format::statistics_message(header, stats.processed, stats.lost)
            }
            Event::FrameNew(rx) | Event::FrameUpdate(rx) | Event::FrameTimeout(rx) => {
                let buffer = self.rx[rx.index()].buffers.get(entry.payload);
                format::frame_message(header, buffer.frame, buffer.wire_age())
            }
            Event::Scheduler(_) => format::scheduler_message(header, entry.payload),
        };
        host.send(&message);
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
