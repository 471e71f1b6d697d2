//! # A429
//!
//! This library is the firmware core of an ARINC429 bridge: one HI-3593-class transceiver chip
//! with one transmit and two receive channels, controlled by a host over a message link. It
//! runs in no_std environments and uses fixed-size tables only, requiring no dynamic memory
//! allocation.
//!
//! ## Architecture
//!
//! ```text
//!   host commands                        callbacks
//!        │                                   ▲
//!        ▼                                   │
//! ┌─────────────┐   ┌──────────────────┐  ┌──┴────────┐
//! │   Control   ├──►│      Bridge      ├─►│ Transport │
//! └─────────────┘   │ ┌──────────────┐ │  └───────────┘
//!                   │ │ TX1 queue    │ │
//! ┌─────────────┐   │ │ TX1 jobs     │ │  ┌───────────┐
//! │   Runner    ├──►│ │ RX1 filters  │ ├─►│Transceiver│
//! └─────────────┘   │ │ RX2 filters  │ │◄─┤   chip    │
//!                   │ │ callbacks    │ │  └───────────┘
//!                   │ └──────────────┘ │
//!                   └──────────────────┘
//! ```
//! Components:
//! * _Bridge_ owns the state of every channel, the scheduler job table, the RX filter maps and
//!   frame buffers, the heartbeat and the callback queue. Its `tick` moves data between the
//!   chip and the tables, in bounded time.
//! * _Transceiver_ is the chip driver: opcode-addressed register transfers and discrete status
//!   signals.
//! * _Transport_ carries callback messages to the host.
//! * _Runner_ ticks the bridge periodically, _Control_ runs host commands between ticks.
//!
//! Host commands stage settings and set change request bits. The next tick writes the chip
//! registers before it moves any data, so frames never flow under stale chip settings.
//!
//! ## Bounded ticks
//!
//! Every tick phase has a work budget (see [`Config`]): RX frames per channel, timeout checks,
//! scheduler control jobs and zero-dwell jobs. A pathological job table or a flooded receiver
//! delays the work to later ticks instead of stretching one tick.
//!
//! ## Error handling
//!
//! Host commands validate their parameters and fail without side effects. Chip transfer
//! failures never escape a tick: failed configuration writes are retried on the next tick,
//! failed data transfers and overflowing queues count as lost frames in the channel
//! statistics.
#![no_std]

pub use a429_core as core;
pub use a429_driver as driver;
pub use a429_driver::time;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bridge;
pub mod callback;
pub mod channel;
pub mod command;
pub mod config;
pub mod consts;
pub mod debug;
pub mod format;
mod heartbeat;
pub mod runner;
pub mod rx;
pub mod tx;
mod utils;

pub use bridge::Bridge;
pub use command::CommandError;
pub use config::Config;
