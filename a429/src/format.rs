//! Callback message layout
//!
//! Every message starts with the function id, the channel code, the frame status code, the
//! sequence number and the 16-bit timestamp. Multi-byte fields are little-endian.

use heapless::Vec;

use crate::core::FrameStatus;

/// Longest callback message
pub const MAX_MESSAGE_LENGTH: usize = 12;

pub type Message = Vec<u8, MAX_MESSAGE_LENGTH>;

/// Function ids of the callback messages
pub mod fid {
    pub const HEARTBEAT: u8 = 4;
    pub const FRAME_MESSAGE: u8 = 17;
    pub const SCHEDULER_MESSAGE: u8 = 24;
}

/// Length of the common header
pub const HEADER_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub channel: u8,
    pub status: FrameStatus,
    pub seq: u8,
    pub timestamp: u16,
}

fn header(fid: u8, header: Header) -> Message {
    let mut message = Message::new();
    unwrap!(message.extend_from_slice(&[fid, header.channel, header.status.into_u8(), header.seq]));
    unwrap!(message.extend_from_slice(&header.timestamp.to_le_bytes()));
    message
}

pub fn statistics_message(header: Header, processed: u16, lost: u16) -> Message {
    let mut message = self::header(fid::HEARTBEAT, header);
    unwrap!(message.extend_from_slice(&processed.to_le_bytes()));
    unwrap!(message.extend_from_slice(&lost.to_le_bytes()));
    message
}

pub fn frame_message(header: Header, frame: u32, age: u16) -> Message {
    let mut message = self::header(fid::FRAME_MESSAGE, header);
    unwrap!(message.extend_from_slice(&frame.to_le_bytes()));
    unwrap!(message.extend_from_slice(&age.to_le_bytes()));
    message
}

pub fn scheduler_message(header: Header, userdata: u8) -> Message {
    let mut message = self::header(fid::SCHEDULER_MESSAGE, header);
    unwrap!(message.push(userdata));
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_message_layout() {
        let header = Header {
            channel: 33,
            status: FrameStatus::Update,
            seq: 7,
            timestamp: 0x1234,
        };
        let message = frame_message(header, 0xa1b2_c3d4, 0x0050);
        assert_eq!(
            message.as_slice(),
            &[17, 33, 1, 7, 0x34, 0x12, 0xd4, 0xc3, 0xb2, 0xa1, 0x50, 0x00]
        );
    }

    #[test]
    fn test_short_messages() {
        let header = Header {
            channel: 1,
            status: FrameStatus::Scheduler,
            seq: 1,
            timestamp: 2,
        };
        assert_eq!(scheduler_message(header, 9).as_slice(), &[24, 1, 3, 1, 2, 0, 9]);

        let header = Header {
            status: FrameStatus::Statistics,
            ..header
        };
        assert_eq!(
            statistics_message(header, 0x0102, 3).as_slice(),
            &[4, 1, 4, 1, 2, 0, 2, 1, 3, 0]
        );
    }
}
