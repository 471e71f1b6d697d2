/// Board-level chip setup, written after every master reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct Config {
    /// ACLK division register. Zero selects no division, for a 1 MHz chip clock.
    pub aclk_div: u8,
    /// Flag and interrupt pin function register. Zero has R1FLAG and R2FLAG signal a non-empty
    /// receive FIFO.
    pub flag_irq: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aclk_div: 0x00,
            flag_irq: 0x00,
        }
    }
}
