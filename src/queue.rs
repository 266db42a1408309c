//! FIFO queue of `i32` over a circular buffer.
//!
//! # Invariants
//! - `buffer.len()` is the capacity; every slot is initialized.
//! - `head < capacity` whenever `capacity > 0`, and `len <= capacity`.
//! - The element at logical position `i` lives at `(head + i) % capacity`.
//!
//! # Threading
//! Not synchronized; mutation goes through `&mut self`.

use std::fmt;

use crate::array::{grown_capacity, required_capacity};
use crate::error::{Error, Result};

/// Growable circular queue of `i32`, used for breadth-first walks over
/// object ids.
///
/// ```rust
/// use heapgraph_collect::QueueInt;
///
/// let mut q = QueueInt::new(2);
/// q.put(1);
/// q.put(2);
/// q.put(3); // grows
/// assert_eq!(q.get(), Ok(1));
/// assert_eq!(q.get(), Ok(2));
/// assert_eq!(q.len(), 1);
/// ```
#[derive(Clone)]
pub struct QueueInt {
    buffer: Vec<i32>,
    head: usize,
    len: usize,
}

impl QueueInt {
    /// Creates an empty queue with room for `initial_capacity` elements.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            buffer: vec![0; initial_capacity.min(crate::constants::MAX_ARRAY_LEN)],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn wrap(&self, pos: usize) -> usize {
        let cap = self.capacity();
        if pos >= cap {
            pos - cap
        } else {
            pos
        }
    }

    /// Enqueues `element`, growing the buffer when full.
    ///
    /// # Panics
    ///
    /// Panics if the queue already holds
    /// [`MAX_ARRAY_LEN`](crate::constants::MAX_ARRAY_LEN) elements.
    pub fn put(&mut self, element: i32) {
        if self.len == self.capacity() {
            if let Err(e) = self.grow() {
                panic!("{e}");
            }
        }
        let tail = self.wrap(self.head + self.len);
        self.buffer[tail] = element;
        self.len += 1;
    }

    /// Dequeues the oldest element.
    pub fn get(&mut self) -> Result<i32> {
        if self.len == 0 {
            return Err(Error::QueueEmpty);
        }
        let element = self.buffer[self.head];
        self.head = self.wrap(self.head + 1);
        self.len -= 1;
        Ok(element)
    }

    /// Returns the oldest element without removing it.
    pub fn peek(&self) -> Result<i32> {
        if self.len == 0 {
            return Err(Error::QueueEmpty);
        }
        Ok(self.buffer[self.head])
    }

    /// Number of queued elements (writes minus reads).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops all queued elements, keeping the buffer.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterates over the queued elements oldest first without dequeuing.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.len).map(move |i| self.buffer[self.wrap(self.head + i)])
    }

    /// Reallocates with a larger buffer and unwraps the contents so the
    /// oldest element lands at slot 0.
    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let required = required_capacity(self.len, 1)?;
        let new_capacity = grown_capacity(old_capacity, required)?;

        let mut buffer = Vec::with_capacity(new_capacity);
        let first_run = (old_capacity - self.head).min(self.len);
        buffer.extend_from_slice(&self.buffer[self.head..self.head + first_run]);
        buffer.extend_from_slice(&self.buffer[..self.len - first_run]);
        buffer.resize(new_capacity, 0);

        self.buffer = buffer;
        self.head = 0;
        Ok(())
    }
}

impl Default for QueueInt {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for QueueInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
