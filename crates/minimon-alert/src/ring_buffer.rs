//! Fixed-capacity cyclic buffer.

/// Cyclic buffer keeping the last `capacity` pushed values.
///
/// [`front`](Self::front) is the oldest retained value: slot 0 until the
/// buffer first fills, then the slot the next push will overwrite.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    index: usize,
    capacity: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Create an empty buffer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be strictly positive");
        Self {
            data: Vec::with_capacity(capacity),
            index: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.index] = value;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest retained value.
    pub fn front(&self) -> Option<T> {
        if self.is_full() {
            self.data.get(self.index).copied()
        } else {
            self.data.first().copied()
        }
    }

    /// Most recently pushed value.
    pub fn back(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let last = (self.index + self.capacity - 1) % self.capacity;
        self.data.get(last).copied()
    }
}
