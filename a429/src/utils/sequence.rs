/// Message sequence counter
///
/// Zero means "nothing sent yet" to the host and is skipped on wraparound.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceNumber(u8);

impl SequenceNumber {
    pub fn next(&mut self) -> u8 {
        self.0 = match self.0.wrapping_add(1) {
            0 => 1,
            n => n,
        };
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn last(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_zero() {
        let mut seq = SequenceNumber::default();
        assert_eq!(seq.next(), 1);
        for _ in 0..253 {
            seq.next();
        }
        assert_eq!(seq.last(), 254);
        assert_eq!(seq.next(), 255);
        assert_eq!(seq.next(), 1);
    }

    #[test]
    fn test_reset() {
        let mut seq = SequenceNumber::default();
        seq.next();
        seq.next();
        seq.reset();
        assert_eq!(seq.next(), 1);
    }
}
