use crate::core::CallbackMode;

/// Statistics heartbeat timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Heartbeat {
    pub mode: CallbackMode,
    /// Period in ms
    pub period: u16,
    /// Reference time of the last beat, `None` until the first tick after enabling
    last_time: Option<u32>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            mode: CallbackMode::Off,
            period: 1000,
            last_time: None,
        }
    }
}

impl Heartbeat {
    pub fn configure(&mut self, mode: CallbackMode, period: u16) {
        self.mode = mode;
        self.period = period;
        self.last_time = None;
    }

    /// Returns true when a beat is due at `now`
    ///
    /// The reference time advances by exactly one period per beat, so a late tick does not
    /// shift the phase of later beats.
    pub fn poll(&mut self, now: u32) -> bool {
        if !self.mode.enabled() || self.period == 0 {
            return false;
        }
        let Some(last) = self.last_time else {
            self.last_time = Some(now);
            return false;
        };
        if now.wrapping_sub(last) < u32::from(self.period) {
            return false;
        }
        self.last_time = Some(last.wrapping_add(u32::from(self.period)));
        true
    }
}
