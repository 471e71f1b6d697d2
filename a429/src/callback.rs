//! Pending host callbacks
//!
//! Producers record an event with the time and a one-byte payload. The message itself is built
//! when the entry is drained, so frame callbacks carry the buffer contents at send time.

use crate::consts::CB_QUEUE_SIZE;
use crate::core::{Channel, FrameStatus, RxChannel, TxChannel};
use crate::utils::{RingBuffer, SequenceNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Channel counters, sent by the heartbeat
    Statistics(Channel),
    FrameNew(RxChannel),
    FrameUpdate(RxChannel),
    FrameTimeout(RxChannel),
    /// Callback job of the TX scheduler
    Scheduler(TxChannel),
}

impl Event {
    pub fn status(self) -> FrameStatus {
        match self {
            Event::Statistics(_) => FrameStatus::Statistics,
            Event::FrameNew(_) => FrameStatus::New,
            Event::FrameUpdate(_) => FrameStatus::Update,
            Event::FrameTimeout(_) => FrameStatus::Timeout,
            Event::Scheduler(_) => FrameStatus::Scheduler,
        }
    }

    pub fn channel(self) -> Channel {
        match self {
            Event::Statistics(channel) => channel,
            Event::FrameNew(rx) | Event::FrameUpdate(rx) | Event::FrameTimeout(rx) => {
                Channel::Rx(rx)
            }
            Event::Scheduler(tx) => Channel::Tx(tx),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Entry {
    pub event: Event,
    /// Low 16 bits of the millisecond clock at enqueue time
    pub timestamp: u16,
    /// Buffer index for frame events, user data for scheduler events
    pub payload: u8,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            event: Event::Statistics(Channel::Tx(TxChannel::TX1)),
            timestamp: 0,
            payload: 0,
        }
    }
}

pub struct CallbackQueue {
    ring: RingBuffer<Entry, CB_QUEUE_SIZE>,
    /// One counter per message kind, shared by all channels
    frame_seq: SequenceNumber,
    scheduler_seq: SequenceNumber,
    statistics_seq: SequenceNumber,
}

impl CallbackQueue {
    pub fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            frame_seq: SequenceNumber::default(),
            scheduler_seq: SequenceNumber::default(),
            statistics_seq: SequenceNumber::default(),
        }
    }

    /// Returns false and leaves the queue untouched if it is full
    pub fn enqueue(&mut self, event: Event, timestamp: u16, payload: u8) -> bool {
        let entry = Entry {
            event,
            timestamp,
            payload,
        };
        match self.ring.push(entry) {
            Ok(()) => true,
            Err(_) => {
                trace!("callback queue full, {:?} dropped", event);
                false
            }
        }
    }

    pub fn peek(&self) -> Option<&Entry> {
        self.ring.peek()
    }

    pub fn pop(&mut self) -> Option<Entry> {
        self.ring.pop()
    }

    /// Sequence number for the next message of the event's kind
    pub fn next_sequence(&mut self, event: Event) -> u8 {
        match event {
            Event::Statistics(_) => self.statistics_seq.next(),
            Event::FrameNew(_) | Event::FrameUpdate(_) | Event::FrameTimeout(_) => {
                self.frame_seq.next()
            }
            Event::Scheduler(_) => self.scheduler_seq.next(),
        }
    }

    pub fn reset_frame_sequence(&mut self) {
        self.frame_seq.reset();
    }

    pub fn reset_scheduler_sequence(&mut self) {
        self.scheduler_seq.reset();
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Drops pending entries and restarts every sequence
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for CallbackQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_queue_rejects_without_mutation() {
        let mut queue = CallbackQueue::new();
        for i in 0..queue.capacity() {
            assert!(queue.enqueue(Event::FrameNew(RxChannel::RX1), i as u16, 0));
        }
        assert!(queue.is_full());
        assert!(!queue.enqueue(Event::FrameUpdate(RxChannel::RX2), 0xffff, 9));
        assert_eq!(queue.len(), CB_QUEUE_SIZE - 1);
        assert_eq!(unwrap!(queue.pop()).timestamp, 0);
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = CallbackQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.enqueue(Event::Scheduler(TxChannel::TX1), 5, 42));
        let entry = unwrap!(queue.pop());
        assert_eq!(entry.payload, 42);
        assert_eq!(entry.event.status(), FrameStatus::Scheduler);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_sequences_are_per_kind() {
        let mut queue = CallbackQueue::new();
        assert_eq!(queue.next_sequence(Event::FrameNew(RxChannel::RX1)), 1);
        assert_eq!(queue.next_sequence(Event::FrameTimeout(RxChannel::RX1)), 2);
        assert_eq!(queue.next_sequence(Event::FrameNew(RxChannel::RX2)), 3);
        assert_eq!(queue.next_sequence(Event::Scheduler(TxChannel::TX1)), 1);
        assert_eq!(
            queue.next_sequence(Event::Statistics(Channel::Rx(RxChannel::RX2))),
            1
        );

        queue.reset_frame_sequence();
        assert_eq!(queue.next_sequence(Event::FrameUpdate(RxChannel::RX2)), 1);
        assert_eq!(queue.next_sequence(Event::Scheduler(TxChannel::TX1)), 2);
    }
}
