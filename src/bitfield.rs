//! Fixed-size bit field safe for concurrent mutation.
//!
//! # Invariants
//! - Bits live in `AtomicU64` words; bit `i` is bit `i % 64` of word `i / 64`.
//! - `words.len() == ceil(len / 64)` and `len > 0`.
//! - Padding bits past `len` are never set.
//!
//! # Ordering
//! Single-bit writes are one `fetch_or` / `fetch_and` with `AcqRel`; reads
//! are `Acquire` loads. A bit written by one thread is visible to a thread
//! that later observes it, and each successful write is a single atomic step,
//! so writers to different bits of one word never lose each other's updates.
//! Whole-field snapshots read word by word and are not atomic as a whole.

#[cfg(loom)]
use loom::sync::atomic::{AtomicU64, Ordering};
#[cfg(not(loom))]
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::WORD_BITS;
use crate::error::{Error, Result};

/// Bit field shared between threads, e.g. the "visited" marks of a parallel
/// graph walk.
///
/// ```rust
/// use heapgraph_collect::ConcurrentBitField;
///
/// let bits = ConcurrentBitField::new(100).unwrap();
/// bits.set(42);
/// assert!(bits.get(42));
/// assert!(!bits.compare_and_set(42, false, true));
/// assert!(bits.compare_and_set(42, true, false));
/// assert!(!bits.get(42));
/// ```
pub struct ConcurrentBitField {
    words: Box<[AtomicU64]>,
    len: usize,
}

impl std::fmt::Debug for ConcurrentBitField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentBitField")
            .field("len", &self.len)
            .field("words", &self.words.len())
            .finish()
    }
}

impl ConcurrentBitField {
    /// Creates a field of `len` clear bits.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::EmptyBitField);
        }
        let words = (0..len.div_ceil(WORD_BITS))
            .map(|_| AtomicU64::new(0))
            .collect();
        Ok(Self { words, len })
    }

    /// Creates a field holding a copy of `bits`.
    pub fn from_bools(bits: &[bool]) -> Result<Self> {
        let field = Self::new(bits.len())?;
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                field.set(i);
            }
        }
        Ok(field)
    }

    /// Word holding bit `index` and the mask selecting it.
    #[inline(always)]
    fn locate(&self, index: usize) -> (&AtomicU64, u64) {
        assert!(
            index < self.len,
            "bit index {index} out of range for length {}",
            self.len
        );
        (&self.words[index / WORD_BITS], 1u64 << (index % WORD_BITS))
    }

    /// Returns bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);
        word.load(Ordering::Acquire) & mask != 0
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&self, index: usize) {
        let (word, mask) = self.locate(index);
        word.fetch_or(mask, Ordering::AcqRel);
    }

    /// Clears bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn clear(&self, index: usize) {
        let (word, mask) = self.locate(index);
        word.fetch_and(!mask, Ordering::AcqRel);
    }

    /// Atomically replaces bit `index` with `new` if it currently equals
    /// `expected`. Returns whether the bit held `expected`.
    ///
    /// Changes to other bits of the same word never cause a spurious
    /// failure: the exchange is retried against the observed word as long as
    /// the target bit still matches.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn compare_and_set(&self, index: usize, expected: bool, new: bool) -> bool {
        let (word, mask) = self.locate(index);
        let mut current = word.load(Ordering::Acquire);
        loop {
            if (current & mask != 0) != expected {
                return false;
            }
            if expected == new {
                return true;
            }
            let next = if new { current | mask } else { current & !mask };
            match word.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(witness) => current = witness,
            }
        }
    }

    /// Number of addressable bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; a field holds at least one bit.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Copies the bits out, one word at a time.
    pub fn to_bools_non_atomic(&self) -> Vec<bool> {
        let mut out = vec![false; self.len];
        self.fill_bools(&mut out);
        out
    }

    /// Copies the bits into `out`, which must be exactly `len()` long.
    pub fn into_bools_non_atomic(&self, out: &mut [bool]) -> Result<()> {
        if out.len() != self.len {
            return Err(Error::LengthMismatch {
                expected: self.len,
                actual: out.len(),
            });
        }
        self.fill_bools(out);
        Ok(())
    }

    fn fill_bools(&self, out: &mut [bool]) {
        for (chunk, word) in out.chunks_mut(WORD_BITS).zip(self.words.iter()) {
            let bits = word.load(Ordering::Acquire);
            for (bit, slot) in chunk.iter_mut().enumerate() {
                *slot = (bits >> bit) & 1 != 0;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Loom concurrency tests
// ---------------------------------------------------------------------------
