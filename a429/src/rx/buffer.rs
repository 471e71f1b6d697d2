use crate::consts::{RX_BUFFER_NUM, RX_BUFFER_USABLE};
use crate::core::FrameStatus;

/// Largest age of a live frame, larger values are state markers
pub const AGE_MAX: u16 = 0xfffb;
/// Age of the first frame received into an empty or timed-out buffer
pub const AGE_NEW: u16 = 0xfffc;
pub const AGE_TIMEOUT: u16 = 0xfffd;
pub const AGE_EMPTY: u16 = 0xfffe;
pub const AGE_UNUSED: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferState {
    /// Not assigned to a filter
    #[default]
    Unused,
    /// Assigned, no frame received yet
    Empty,
    Live,
    /// No frame within the channel timeout period
    Timeout,
}

/// Outcome of storing a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reception {
    pub status: FrameStatus,
    /// Frame value differs from the stored one, or the buffer held no live frame
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameBuffer {
    pub frame: u32,
    /// Time since the previous frame at the last receipt
    pub age: u16,
    /// Low 16 bits of the millisecond clock at the last receipt
    pub last_rx_time: u16,
    pub state: BufferState,
    refs: u8,
}

impl FrameBuffer {
    /// Age as reported to the host, with markers for buffers without a live frame
    pub fn wire_age(&self) -> u16 {
        match self.state {
            BufferState::Unused => AGE_UNUSED,
            BufferState::Empty => AGE_EMPTY,
            BufferState::Timeout => AGE_TIMEOUT,
            BufferState::Live => self.age,
        }
    }

    pub fn elapsed(&self, now: u16) -> u16 {
        now.wrapping_sub(self.last_rx_time)
    }

    pub fn receive(&mut self, frame: u32, now: u16) -> Reception {
        let fresh = matches!(self.state, BufferState::Empty | BufferState::Timeout);
        let reception = Reception {
            status: if fresh {
                FrameStatus::New
            } else {
                FrameStatus::Update
            },
            changed: fresh || self.frame != frame,
        };

        self.age = if fresh {
            AGE_NEW
        } else {
            self.elapsed(now).min(AGE_MAX)
        };
        self.frame = frame;
        self.last_rx_time = now;
        self.state = BufferState::Live;
        reception
    }

    /// Marks a frame as overdue, returns false if the buffer had nothing to time out
    pub fn time_out(&mut self, now: u16, period: u16) -> bool {
        if !matches!(self.state, BufferState::Empty | BufferState::Live) {
            return false;
        }
        if self.elapsed(now) <= period {
            return false;
        }
        self.state = BufferState::Timeout;
        true
    }

    fn empty(now: u16) -> Self {
        Self {
            state: BufferState::Empty,
            last_rx_time: now,
            ..Default::default()
        }
    }
}

/// Received frame buffers of one channel
///
/// Buffers are shared among the filters of SDI-expanded labels and reference counted.
pub struct BufferPool {
    buffers: [FrameBuffer; RX_BUFFER_NUM],
    used: u16,
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            buffers: [FrameBuffer::default(); RX_BUFFER_NUM],
            used: 0,
        }
    }

    pub fn get(&self, index: u8) -> &FrameBuffer {
        &self.buffers[usize::from(index)]
    }

    pub fn get_mut(&mut self, index: u8) -> &mut FrameBuffer {
        &mut self.buffers[usize::from(index)]
    }

    pub fn by_position_mut(&mut self, position: usize) -> &mut FrameBuffer {
        &mut self.buffers[position]
    }

    pub fn used(&self) -> u16 {
        self.used
    }

    pub fn refs(&self, index: u8) -> u8 {
        self.buffers[usize::from(index)].refs
    }

    /// Takes an unused buffer, with no references yet
    pub fn allocate(&mut self, now: u16) -> Option<u8> {
        let position = self.buffers[..RX_BUFFER_USABLE]
            .iter()
            .position(|buffer| buffer.state == BufferState::Unused)?;
        self.buffers[position] = FrameBuffer::empty(now);
        self.used += 1;
        Some(unwrap!(u8::try_from(position)))
    }

    /// Whether `allocate` would succeed once every reference in `released` is dropped
    pub fn can_allocate_releasing(&self, released: &[u8]) -> bool {
        usize::from(self.used) < RX_BUFFER_USABLE
            || released.iter().any(|&index| {
                let dropped = released.iter().filter(|&&other| other == index).count();
                dropped >= usize::from(self.refs(index))
            })
    }

    pub fn retain(&mut self, index: u8) {
        let buffer = &mut self.buffers[usize::from(index)];
        debug_assert!(buffer.state != BufferState::Unused);
        buffer.refs += 1;
    }

    /// Drops a reference, returns true if the buffer became unused
    pub fn release(&mut self, index: u8) -> bool {
        let buffer = &mut self.buffers[usize::from(index)];
        buffer.refs = buffer.refs.saturating_sub(1);
        if buffer.refs > 0 {
            return false;
        }
        *buffer = FrameBuffer::default();
        self.used -= 1;
        true
    }

    /// Forgets all received frames, keeping the filter assignment
    pub fn reset_frames(&mut self, now: u16) {
        for buffer in self.buffers.iter_mut() {
            if buffer.state != BufferState::Unused {
                let refs = buffer.refs;
                *buffer = FrameBuffer::empty(now);
                buffer.refs = refs;
            }
        }
    }

    pub fn clear(&mut self) {
        self.buffers = [FrameBuffer::default(); RX_BUFFER_NUM];
        self.used = 0;
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
