use crate::consts::RX_FIFO_DEPTH;
use crate::time::Duration;

/// Per-tick work budgets
///
/// Budgets bound the duration of every tick phase. Smaller values lower the latency of the
/// other phases at the cost of throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct Config {
    /// Frames read from the chip per RX channel and tick
    pub rx_frame_budget: u8,
    /// Frame buffers checked for timeout per tick, shared by all RX channels
    pub timeout_check_budget: u16,
    /// Successive zero-dwell scheduler jobs executed per tick
    pub zero_dwell_budget: u8,
    /// Non-transmitting scheduler jobs (skip, callback, jump) executed per tick
    pub non_transmit_budget: u8,
    /// Words discarded from a receive FIFO after a configuration change
    pub rx_fifo_drain_limit: u8,
    /// Period of the background runner tick
    pub tick_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rx_frame_budget: 5,
            timeout_check_budget: 10,
            zero_dwell_budget: 4,
            non_transmit_budget: 4,
            rx_fifo_drain_limit: RX_FIFO_DEPTH as u8,
            tick_period: Duration::from_millis(1),
        }
    }
}
