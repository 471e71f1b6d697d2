//! ARINC429 bridge driver interface
//!
//! The crate provides the interfaces between the bridge core and its two collaborators:
//! * `Transceiver` is the ARINC429 chip, accessed through opcode-addressed registers and
//!   a fixed set of discrete status signals.
//! * `Transport` is the host link that carries callback messages.
//!
//! Chip driver crates should depend on this crate. Bridge users should depend on
//! the `a429` crate instead.
//!
//! Both interfaces are synchronous. Register transfers have chip-level bounded latency, so
//! the core calls them directly from its tick and never suspends mid-phase.

#![no_std]

pub mod chip;
pub mod host;
pub mod opcode;

pub use chip::{Discrete, SpiError, Transceiver};
pub use host::Transport;

pub mod time {
    pub use embassy_time::{Duration, Instant};
}
