use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::core::{CallbackMode, ChannelMode, Parity, Speed};

/// Pending configuration changes of a channel
///
/// Host commands set bits; the tick applies the flagged settings to the chip and clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeRequest(u8);

impl ChangeRequest {
    pub const NONE: Self = Self(0);
    pub const SPEED_PARITY: Self = Self(1 << 0);
    pub const FIFO_FILTER: Self = Self(1 << 1);
    pub const OPERATING_MODE: Self = Self(1 << 2);
    pub const CALLBACK_MODE: Self = Self(1 << 3);
    pub const ALL: Self = Self(0x0f);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn into_bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ChangeRequest {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeRequest {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChangeRequest {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for ChangeRequest {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0 & Self::ALL.0)
    }
}

/// Processed and lost frame counters
///
/// `*_last` hold the values of the last statistics report, so an on-change heartbeat can tell
/// whether anything happened since. Counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    pub processed: u16,
    pub lost: u16,
    processed_last: u16,
    lost_last: u16,
}

impl Statistics {
    pub fn count_processed(&mut self) {
        self.processed = self.processed.saturating_add(1);
    }

    pub fn count_lost(&mut self) {
        self.lost = self.lost.saturating_add(1);
    }

    pub fn changed(&self) -> bool {
        self.processed != self.processed_last || self.lost != self.lost_last
    }

    pub fn mark_reported(&mut self) {
        self.processed_last = self.processed;
        self.lost_last = self.lost;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Configuration and status shared by TX and RX channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    pub parity: Parity,
    pub speed: Speed,
    pub mode: ChannelMode,
    pub callback_mode: CallbackMode,
    pub change_request: ChangeRequest,
    pub stats: Statistics,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            parity: Parity::Auto,
            speed: Speed::High,
            mode: ChannelMode::Passive,
            callback_mode: CallbackMode::Off,
            change_request: ChangeRequest::ALL,
            stats: Statistics::default(),
        }
    }
}

impl ChannelState {
    pub fn request(&mut self, change: ChangeRequest) {
        self.change_request |= change;
    }

    pub fn pending(&self) -> bool {
        !self.change_request.is_empty()
    }

    /// Data may flow only with the chip configuration up to date
    pub fn data_enabled(&self) -> bool {
        self.mode != ChannelMode::Passive && !self.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_request_ops() {
        let mut request = ChangeRequest::NONE;
        assert!(request.is_empty());
        request |= ChangeRequest::FIFO_FILTER;
        request |= ChangeRequest::CALLBACK_MODE;
        assert!(request.contains(ChangeRequest::FIFO_FILTER));
        assert!(!request.intersects(ChangeRequest::SPEED_PARITY | ChangeRequest::OPERATING_MODE));
        let rest = request & !ChangeRequest::FIFO_FILTER;
        assert_eq!(rest, ChangeRequest::CALLBACK_MODE);
        assert_eq!(ChangeRequest::from_bits(0xff), ChangeRequest::ALL);
    }

    #[test]
    fn test_statistics_report_tracking() {
        let mut stats = Statistics::default();
        assert!(!stats.changed());
        stats.count_processed();
        assert!(stats.changed());
        stats.mark_reported();
        assert!(!stats.changed());
        stats.count_lost();
        assert!(stats.changed());
        stats.reset();
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_statistics_saturate() {
        let mut stats = Statistics {
            processed: u16::MAX,
            ..Default::default()
        };
        stats.count_processed();
        assert_eq!(stats.processed, u16::MAX);
    }
}
