//! Shared bridge access for async firmware
//!
//! The bridge and its chip live in a blocking mutex. The `Runner` ticks the bridge
//! periodically while `Control` handles run host commands between ticks.
//!
//! ```
//! # use a429::driver::{Discrete, SpiError, Transceiver, Transport};
//! # struct Chip;
//! # impl Transceiver for Chip {
//! #     fn write_register(&mut self, _: u8, _: &[u8]) -> Result<(), SpiError> { Ok(()) }
//! #     fn read_register(&mut self, _: u8, _: &mut [u8]) -> Result<(), SpiError> { Ok(()) }
//! #     fn discrete(&mut self, _: Discrete) -> bool { false }
//! #     fn reset(&mut self) -> Result<(), SpiError> { Ok(()) }
//! # }
//! # struct Host;
//! # impl Transport for Host {
//! #     fn send_possible(&mut self) -> bool { true }
//! #     fn send(&mut self, _: &[u8]) {}
//! # }
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex as Mutex;
//! use a429::core::{ChannelMode, ChannelSelector};
//! use a429::runner::Shared;
//! use a429::{Bridge, Config};
//! use static_cell::StaticCell;
//!
//! static SHARED: StaticCell<Shared<Mutex, Chip>> = StaticCell::new();
//! let shared = SHARED.init(Shared::new(Bridge::new(Config::default()), Chip));
//! let (control, runner) = shared.split(Host);
//! control
//!     .lock(|bridge| bridge.set_channel_mode(ChannelSelector::AllRx, ChannelMode::Active))
//!     .unwrap();
//! // spawn `runner.run()` on the executor
//! # drop(runner);
//! ```

use core::cell::RefCell;

use a429_driver::{Transceiver, Transport};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Ticker;

use crate::bridge::Bridge;
use crate::time::{Duration, Instant};

struct Inner<C> {
    bridge: Bridge,
    chip: C,
}

pub struct Shared<M: RawMutex, C> {
    inner: Mutex<M, RefCell<Inner<C>>>,
}

impl<M: RawMutex, C: Transceiver> Shared<M, C> {
    pub fn new(bridge: Bridge, chip: C) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner { bridge, chip })),
        }
    }

    /// Splits into a command handle and the tick runner
    pub fn split<T: Transport>(&self, transport: T) -> (Control<'_, M, C>, Runner<'_, M, C, T>) {
        let period = self
            .inner
            .lock(|cell| cell.borrow().bridge.config().tick_period);
        let control = Control { shared: self };
        let runner = Runner {
            shared: self,
            transport,
            period,
        };
        (control, runner)
    }
}

/// Host command handle
pub struct Control<'a, M: RawMutex, C> {
    shared: &'a Shared<M, C>,
}

impl<M: RawMutex, C> Clone for Control<'_, M, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, C> Copy for Control<'_, M, C> {}

impl<M: RawMutex, C> Control<'_, M, C> {
    pub fn lock<R>(&self, f: impl FnOnce(&mut Bridge) -> R) -> R {
        self.shared
            .inner
            .lock(|cell| f(&mut cell.borrow_mut().bridge))
    }

    /// Runs `f` with access to the chip, for the debug commands
    pub fn lock_with_chip<R>(&self, f: impl FnOnce(&mut Bridge, &mut C) -> R) -> R {
        self.shared.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let Inner { bridge, chip } = &mut *inner;
            f(bridge, chip)
        })
    }
}

/// Bridge background task runner
///
/// Run for proper bridge operation.
pub struct Runner<'a, M: RawMutex, C, T> {
    shared: &'a Shared<M, C>,
    transport: T,
    period: Duration,
}

impl<M: RawMutex, C: Transceiver, T: Transport> Runner<'_, M, C, T> {
    pub async fn run(&mut self) {
        let mut ticker = Ticker::every(self.period);
        loop {
            ticker.next().await;
            let now = Instant::now();
            let transport = &mut self.transport;
            self.shared.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                let Inner { bridge, chip } = &mut *inner;
                bridge.tick(now, chip, transport);
            });
        }
    }
}
