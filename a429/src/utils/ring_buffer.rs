/// Fixed-capacity FIFO over an array and two indices
///
/// Writes go to `head`, reads come from `tail`. The ring is full when advancing `head` would
/// reach `tail`, so one slot always stays vacant and at most `N - 1` items are held.
pub struct RingBuffer<T, const N: usize> {
    items: [T; N],
    head: usize,
    tail: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    const _ASSERT: () = core::assert!(N >= 2);

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::_ASSERT;
        Self {
            items: [T::default(); N],
            head: 0,
            tail: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        Self::advance(self.head) == self.tail
    }

    /// Appends an item, handing it back if the ring is full
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items[self.head] = item;
        self.head = Self::advance(self.head);
        Ok(())
    }

    pub fn peek(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.items[self.tail])
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.items[self.tail];
        self.tail = Self::advance(self.tail);
        Some(item)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    fn advance(index: usize) -> usize {
        if index + 1 == N { 0 } else { index + 1 }
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
