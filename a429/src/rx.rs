//! Receive channels
//!
//! Frames read from the chip FIFO are routed by extended label through the software filter
//! table into per-label frame buffers. Unfiltered frames are dropped silently; the hardware
//! label filter keeps most of them out of the FIFO in the first place.

use a429_driver::opcode::{self, rx_control};
use a429_driver::{Discrete, Transceiver};

use crate::callback::{CallbackQueue, Event};
use crate::channel::{ChangeRequest, ChannelState};
use crate::core::{
    CallbackMode, ChannelMode, ExtendedLabel, FrameStatus, Label, Parity, RxChannel, Sdi, SdiMode,
    Speed,
};

pub mod buffer;
pub mod filter;

pub use buffer::{BufferPool, BufferState, FrameBuffer};
pub use filter::FilterTable;

/// Result of a frame readback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadFrame {
    /// A live frame is available
    pub status: bool,
    /// Last frame received, zero if none
    pub frame: u32,
    /// Milliseconds since the last receipt, or a buffer state marker
    pub age: u16,
}

pub struct RxState {
    pub common: ChannelState,
    /// Frame timeout in ms, zero disables timeout detection
    pub timeout_period: u16,
    pub buffers: BufferPool,
    pub filters: FilterTable,
}

impl RxState {
    pub fn new() -> Self {
        Self {
            common: ChannelState::default(),
            timeout_period: 0,
            buffers: BufferPool::new(),
            filters: FilterTable::new(),
        }
    }

    /// Routes `label` to a fresh frame buffer, replacing existing filters of the same SDI values
    ///
    /// Returns false if no buffer is left.
    pub fn set_filter(&mut self, label: Label, sdi: SdiMode, now: u16) -> bool {
        let sdis = sdi.sdis();
        if self.has_exact_filter(label, sdis) {
            return true;
        }

        let released: heapless::Vec<u8, 4> = sdis
            .iter()
            .filter_map(|&sdi| self.filters.lookup(ExtendedLabel::new(label, sdi)))
            .collect();
        if !self.buffers.can_allocate_releasing(&released) {
            return false;
        }
        for &sdi in sdis {
            if let Some(previous) = self.filters.remove(ExtendedLabel::new(label, sdi)) {
                self.buffers.release(previous);
            }
        }
        let index = unwrap!(self.buffers.allocate(now));
        for &sdi in sdis {
            self.filters.assign(ExtendedLabel::new(label, sdi), index);
            self.buffers.retain(index);
        }
        self.common.request(ChangeRequest::FIFO_FILTER);
        true
    }

    /// Returns false if no matching filter existed
    pub fn clear_filter(&mut self, label: Label, sdi: SdiMode) -> bool {
        let mut cleared = false;
        for &sdi in sdi.sdis() {
            if let Some(index) = self.filters.remove(ExtendedLabel::new(label, sdi)) {
                self.buffers.release(index);
                cleared = true;
            }
        }
        if cleared {
            self.common.request(ChangeRequest::FIFO_FILTER);
        }
        cleared
    }

    pub fn has_filter(&self, label: Label, sdi: SdiMode) -> bool {
        match sdi {
            SdiMode::Address(sdi) => self.filters.lookup(ExtendedLabel::new(label, sdi)).is_some(),
            SdiMode::Data => {
                let first = self.filters.lookup(ExtendedLabel::new(label, Sdi::Sdi0));
                first.is_some()
                    && Sdi::all()
                        .iter()
                        .all(|&sdi| self.filters.lookup(ExtendedLabel::new(label, sdi)) == first)
            }
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.buffers.clear();
        self.common.request(ChangeRequest::FIFO_FILTER);
    }

    /// Replaces all filters with an SDI-as-data filter per label
    ///
    /// Returns the number of labels that got a buffer. Labels are served in ascending order.
    pub fn set_standard_filters(&mut self, now: u16) -> usize {
        self.clear_filters();
        let count = Label::all()
            .take_while(|&label| self.set_filter(label, SdiMode::Data, now))
            .count();
        if count < 256 {
            warn!("standard filters stop at label {}", count);
        }
        count
    }

    fn has_exact_filter(&self, label: Label, sdis: &[Sdi]) -> bool {
        let Some(index) = self.filters.lookup(ExtendedLabel::new(label, sdis[0])) else {
            return false;
        };
        usize::from(self.buffers.refs(index)) == sdis.len()
            && sdis
                .iter()
                .all(|&sdi| self.filters.lookup(ExtendedLabel::new(label, sdi)) == Some(index))
    }

    /// Buffer an extended label is routed to
    pub fn lookup(&self, ext: ExtendedLabel) -> Option<&FrameBuffer> {
        self.filters.lookup(ext).map(|index| self.buffers.get(index))
    }

    pub fn read_frame(&self, label: Label, sdi: SdiMode, now: u16) -> ReadFrame {
        let sdi = match sdi {
            SdiMode::Address(sdi) => sdi,
            SdiMode::Data => Sdi::Sdi0,
        };
        let Some(buffer) = self.lookup(ExtendedLabel::new(label, sdi)) else {
            return ReadFrame {
                status: false,
                frame: 0,
                age: buffer::AGE_UNUSED,
            };
        };
        match buffer.state {
            BufferState::Live => ReadFrame {
                status: true,
                frame: buffer.frame,
                age: buffer.elapsed(now).min(buffer::AGE_MAX),
            },
            _ => ReadFrame {
                status: false,
                frame: buffer.frame,
                age: buffer.wire_age(),
            },
        }
    }

    /// Latest live frame for a retransmit job, `index` being the extended label
    pub fn retransmit_frame(&self, index: u16) -> Option<u32> {
        let buffer = self.lookup(ExtendedLabel::try_from_u16(index)?)?;
        (buffer.state == BufferState::Live).then_some(buffer.frame)
    }

    pub(crate) fn control_word(&self) -> u8 {
        let mut word = rx_control::FLIP | rx_control::LABEL_RECOGNITION;
        if self.common.parity == Parity::Auto {
            word |= rx_control::PARITY;
        }
        if self.common.speed == Speed::Low {
            word |= rx_control::LOW_SPEED;
        }
        word
    }

    /// Applies pending configuration changes to the chip
    ///
    /// Requests whose register write failed stay pending and are retried on the next tick.
    pub(crate) fn apply_changes<C: Transceiver + ?Sized>(
        &mut self,
        channel: RxChannel,
        chip: &mut C,
        callbacks: &mut CallbackQueue,
        drain_limit: u8,
        now: u16,
    ) {
        let request = self.common.change_request;
        if request.is_empty() {
            return;
        }
        debug!("RX{} apply {:?}", channel.index() + 1, request);
        let opcodes = opcode::rx(channel);
        let mut failed = ChangeRequest::NONE;

        if request.contains(ChangeRequest::OPERATING_MODE) {
            match self.common.mode {
                ChannelMode::Passive => self.common.stats.reset(),
                _ => self.buffers.reset_frames(now),
            }
        }

        let control_change = ChangeRequest::SPEED_PARITY | ChangeRequest::OPERATING_MODE;
        let mut control_written = false;
        if request.intersects(control_change) {
            control_written = chip
                .write_register(opcodes.write_control, &[self.control_word()])
                .is_ok();
            if !control_written {
                warn!("RX{} control write failed", channel.index() + 1);
                failed |= request & control_change;
            }
        }

        if request.contains(ChangeRequest::FIFO_FILTER)
            && chip
                .write_register(opcodes.write_label_filter, &self.filters.hardware_image())
                .is_err()
        {
            warn!("RX{} label filter write failed", channel.index() + 1);
            failed |= ChangeRequest::FIFO_FILTER;
        }

        // Words received under the previous settings are flushed once both registers are set
        if control_written {
            self.drain_fifo(channel, chip, drain_limit);
        }

        if request.contains(ChangeRequest::CALLBACK_MODE)
            && self.common.callback_mode == CallbackMode::Off
        {
            callbacks.reset_frame_sequence();
        }

        self.common.change_request = failed;
    }

    /// Discards the chip FIFO contents
    fn drain_fifo<C: Transceiver + ?Sized>(&mut self, channel: RxChannel, chip: &mut C, limit: u8) {
        let read_fifo = opcode::rx(channel).read_fifo;
        let mut data = [0; 4];
        for _ in 0..limit {
            if !chip.discrete(Discrete::rx_fifo_flag(channel)) {
                break;
            }
            if chip.read_register(read_fifo, &mut data).is_err() {
                break;
            }
        }
    }

    /// Reads up to `budget` frames from the chip FIFO
    pub(crate) fn ingest<C: Transceiver + ?Sized>(
        &mut self,
        channel: RxChannel,
        chip: &mut C,
        callbacks: &mut CallbackQueue,
        budget: u8,
        now: u16,
    ) {
        let read_fifo = opcode::rx(channel).read_fifo;
        for _ in 0..budget {
            if !chip.discrete(Discrete::rx_fifo_flag(channel)) {
                break;
            }
            let mut data = [0; 4];
            if chip.read_register(read_fifo, &mut data).is_err() {
                warn!("RX{} FIFO read failed", channel.index() + 1);
                self.common.stats.count_lost();
                break;
            }
            self.receive(channel, u32::from_be_bytes(data), callbacks, now);
        }
    }

    /// Routes one received frame, `frame` in host byte order
    pub(crate) fn receive(
        &mut self,
        channel: RxChannel,
        frame: u32,
        callbacks: &mut CallbackQueue,
        now: u16,
    ) {
        if self.common.parity == Parity::Auto && frame & opcode::RX_PARITY_ERROR != 0 {
            self.common.stats.count_lost();
            return;
        }

        let Some(index) = self.filters.lookup(ExtendedLabel::from_frame(frame)) else {
            return;
        };
        let reception = self.buffers.get_mut(index).receive(frame, now);
        let notify = match self.common.callback_mode {
            CallbackMode::Off => false,
            CallbackMode::On => true,
            CallbackMode::OnChange => reception.changed,
        };
        if notify {
            let event = match reception.status {
                FrameStatus::New => Event::FrameNew(channel),
                _ => Event::FrameUpdate(channel),
            };
            if !callbacks.enqueue(event, now, index) {
                self.common.stats.count_lost();
            }
        }
        self.common.stats.count_processed();
    }

    /// Timeout check of the buffer at `position`
    pub(crate) fn check_timeout(
        &mut self,
        channel: RxChannel,
        position: usize,
        callbacks: &mut CallbackQueue,
        now: u16,
    ) {
        if self.timeout_period == 0 {
            return;
        }
        if !self
            .buffers
            .by_position_mut(position)
            .time_out(now, self.timeout_period)
        {
            return;
        }
        if self.common.callback_mode.enabled()
            && !callbacks.enqueue(Event::FrameTimeout(channel), now, position as u8)
        {
            self.common.stats.count_lost();
        }
    }
}

impl Default for RxState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::RX_BUFFER_USABLE;

    const LABEL: Label = Label::new(0x13);

    #[test]
    fn test_sdi_data_filter_shares_one_buffer() {
        let mut rx = RxState::new();
        assert!(rx.set_filter(LABEL, SdiMode::Data, 0));
        let index = unwrap!(rx.filters.lookup(ExtendedLabel::new(LABEL, Sdi::Sdi0)));
        for &sdi in Sdi::all() {
            assert_eq!(rx.filters.lookup(ExtendedLabel::new(LABEL, sdi)), Some(index));
        }
        assert_eq!(rx.buffers.refs(index), 4);
        assert_eq!(rx.buffers.used(), 1);
        assert!(rx.has_filter(LABEL, SdiMode::Data));
        assert!(rx.has_filter(LABEL, SdiMode::Address(Sdi::Sdi3)));

        assert!(rx.clear_filter(LABEL, SdiMode::Data));
        assert_eq!(rx.buffers.used(), 0);
        assert!(!rx.filters.admits(LABEL));
        assert!(!rx.clear_filter(LABEL, SdiMode::Data));
    }

    #[test]
    fn test_address_filter_overrides_one_sdi() {
        let mut rx = RxState::new();
        assert!(rx.set_filter(LABEL, SdiMode::Data, 0));
        let shared = unwrap!(rx.filters.lookup(ExtendedLabel::new(LABEL, Sdi::Sdi0)));
        assert!(rx.set_filter(LABEL, SdiMode::Address(Sdi::Sdi1), 0));
        let own = unwrap!(rx.filters.lookup(ExtendedLabel::new(LABEL, Sdi::Sdi1)));
        assert_ne!(own, shared);
        assert_eq!(rx.buffers.refs(shared), 3);
        assert!(!rx.has_filter(LABEL, SdiMode::Data));

        // Clearing SDI1 leaves the shared buffer referenced by the other three
        assert!(rx.clear_filter(LABEL, SdiMode::Address(Sdi::Sdi1)));
        assert_eq!(rx.buffers.used(), 1);
        assert_eq!(rx.buffers.get(shared).state, BufferState::Empty);
        assert!(rx.filters.admits(LABEL));
    }

    #[test]
    fn test_repeated_filter_keeps_buffer() {
        let mut rx = RxState::new();
        assert!(rx.set_filter(LABEL, SdiMode::Address(Sdi::Sdi2), 0));
        rx.common.change_request = ChangeRequest::NONE;
        assert!(rx.set_filter(LABEL, SdiMode::Address(Sdi::Sdi2), 0));
        assert_eq!(rx.buffers.used(), 1);
        assert!(!rx.common.pending());
    }

    #[test]
    fn test_filter_allocation_exhaustion() {
        let mut rx = RxState::new();
        assert_eq!(rx.set_standard_filters(0), RX_BUFFER_USABLE);
        assert!(rx.has_filter(Label::new(0xfe), SdiMode::Data));
        assert!(!rx.has_filter(Label::new(0xff), SdiMode::Data));
        assert!(!rx.set_filter(Label::new(0xff), SdiMode::Address(Sdi::Sdi0), 0));
        assert_eq!(rx.filters.len(), RX_BUFFER_USABLE * 4);
    }

    #[test]
    fn test_merging_filters_in_full_pool() {
        let mut rx = RxState::new();
        for &sdi in Sdi::all() {
            assert!(rx.set_filter(LABEL, SdiMode::Address(sdi), 0));
        }
        let others = Label::all()
            .filter(|&label| label != LABEL)
            .take_while(|&label| rx.set_filter(label, SdiMode::Data, 0))
            .count();
        assert_eq!(others, RX_BUFFER_USABLE - 4);
        assert!(!rx.set_filter(Label::new(0xff), SdiMode::Data, 0));

        // The four SDI buffers are released before the shared one is taken
        assert!(rx.set_filter(LABEL, SdiMode::Data, 0));
        assert!(rx.has_filter(LABEL, SdiMode::Data));
        assert_eq!(usize::from(rx.buffers.used()), RX_BUFFER_USABLE - 3);

        // Splitting off one SDI needs a free buffer the shared one cannot provide
        let mut full = RxState::new();
        assert_eq!(full.set_standard_filters(0), RX_BUFFER_USABLE);
        assert!(!full.set_filter(LABEL, SdiMode::Address(Sdi::Sdi1), 0));
        assert!(full.has_filter(LABEL, SdiMode::Data));
    }

    #[test]
    fn test_receive_drops_unfiltered_and_parity_errors() {
        let mut rx = RxState::new();
        let mut callbacks = CallbackQueue::new();
        rx.common.callback_mode = CallbackMode::On;
        assert!(rx.set_filter(LABEL, SdiMode::Data, 0));

        rx.receive(RxChannel::RX1, 0x0000_0014, &mut callbacks, 1);
        assert_eq!(rx.common.stats.processed, 0);
        assert!(callbacks.is_empty());

        rx.receive(RxChannel::RX1, 0x8000_0013, &mut callbacks, 1);
        assert_eq!(rx.common.stats.lost, 1);
        assert!(callbacks.is_empty());

        rx.common.parity = Parity::Data;
        rx.receive(RxChannel::RX1, 0x8000_0113, &mut callbacks, 1);
        assert_eq!(rx.common.stats.processed, 1);
        assert_eq!(callbacks.len(), 1);
    }

    #[test]
    fn test_read_frame_states() {
        let mut rx = RxState::new();
        let mut callbacks = CallbackQueue::new();
        assert_eq!(rx.read_frame(LABEL, SdiMode::Data, 0).age, buffer::AGE_UNUSED);

        assert!(rx.set_filter(LABEL, SdiMode::Data, 0));
        let empty = rx.read_frame(LABEL, SdiMode::Data, 0);
        assert!(!empty.status);
        assert_eq!(empty.age, buffer::AGE_EMPTY);

        rx.receive(RxChannel::RX1, 0x0000_0213, &mut callbacks, 100);
        let live = rx.read_frame(LABEL, SdiMode::Address(Sdi::Sdi2), 130);
        assert_eq!(
            live,
            ReadFrame {
                status: true,
                frame: 0x213,
                age: 30
            }
        );
    }

    #[test]
    fn test_timeout_disabled_by_zero_period() {
        let mut rx = RxState::new();
        let mut callbacks = CallbackQueue::new();
        assert!(rx.set_filter(LABEL, SdiMode::Address(Sdi::Sdi0), 0));
        let position = usize::from(unwrap!(rx.filters.lookup(ExtendedLabel::new(LABEL, Sdi::Sdi0))));
        rx.check_timeout(RxChannel::RX1, position, &mut callbacks, 60_000);
        assert_eq!(rx.buffers.get(position as u8).state, BufferState::Empty);

        rx.timeout_period = 100;
        rx.check_timeout(RxChannel::RX1, position, &mut callbacks, 60_000);
        assert_eq!(rx.buffers.get(position as u8).state, BufferState::Timeout);
        assert!(callbacks.is_empty());
    }

    #[test]
    fn test_control_word() {
        let mut rx = RxState::new();
        rx.common.parity = Parity::Data;
        rx.common.speed = Speed::Low;
        assert_eq!(
            rx.control_word(),
            rx_control::FLIP | rx_control::LABEL_RECOGNITION | rx_control::LOW_SPEED
        );
    }
}
