//! Table capacities

/// Immediate transmit queue slots, one stays vacant
pub const TX_QUEUE_SIZE: usize = 16;
/// Scheduler job table entries, at most 4096 (12-bit job index)
pub const TX_JOBS_NUM: usize = 1000;
/// Scheduled frame table entries, at most 4096 (12-bit frame index)
pub const TX_BUFFER_NUM: usize = 256;

/// Received frame buffers per RX channel, at most 256 (8-bit buffer index)
pub const RX_BUFFER_NUM: usize = 256;
/// Buffers handed out to filters. The last index is kept as the "no buffer" marker.
pub const RX_BUFFER_USABLE: usize = RX_BUFFER_NUM - 1;
/// Software filters per RX channel, one per extended label
pub const RX_FILTERS_NUM: usize = 1024;
/// Depth of the chip receive FIFO
pub const RX_FIFO_DEPTH: usize = 32;

/// Callback queue entries, one stays vacant
pub const CB_QUEUE_SIZE: usize = 300;

const _: () = core::assert!(TX_JOBS_NUM <= 4096 && TX_BUFFER_NUM <= 4096);
const _: () = core::assert!(RX_BUFFER_NUM <= 256);
