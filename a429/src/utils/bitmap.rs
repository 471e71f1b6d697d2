/// Bitset over `WORDS` 32-bit words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bitmap<const WORDS: usize>([u32; WORDS]);

impl<const WORDS: usize> Bitmap<WORDS> {
    pub const BITS: usize = WORDS * 32;

    pub const fn new() -> Self {
        Self([0; WORDS])
    }

    pub fn get(&self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        self.0[word] & bit != 0
    }

    pub fn set(&mut self, index: usize) {
        let (word, bit) = Self::locate(index);
        self.0[word] |= bit;
    }

    pub fn clear(&mut self, index: usize) {
        let (word, bit) = Self::locate(index);
        self.0[word] &= !bit;
    }

    pub fn assign(&mut self, index: usize, value: bool) {
        if value {
            self.set(index);
        } else {
            self.clear(index);
        }
    }

    pub fn clear_all(&mut self) {
        self.0 = [0; WORDS];
    }

    pub fn count(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn words(&self) -> &[u32; WORDS] {
        &self.0
    }

    fn locate(index: usize) -> (usize, u32) {
        assert!(index < Self::BITS);
        (index / 32, 1 << (index % 32))
    }
}

impl<const WORDS: usize> Default for Bitmap<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear() {
        let mut map: Bitmap<2> = Bitmap::new();
        map.set(0);
        map.set(33);
        map.set(63);
        assert!(map.get(33));
        assert!(!map.get(32));
        assert_eq!(map.count(), 3);
        assert_eq!(map.words(), &[1, 0x8000_0002]);

        map.clear(33);
        map.assign(5, true);
        assert!(!map.get(33));
        assert!(map.get(5));
        map.clear_all();
        assert_eq!(map.count(), 0);
    }
}
