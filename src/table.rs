//! Open-addressing table shared by the sets and maps.
//!
//! Layout: parallel `keys` / `values` vectors of `capacity` slots plus an
//! [`Occupancy`] bitmap that alone decides whether a slot is live. Vacant
//! slots hold `Default` values.
//!
//! # Probing
//! `capacity` is prime and `0 < step < capacity`, so the sequence
//! `home, home + step, home + 2·step, …` (mod capacity) visits every slot
//! exactly once. `len < capacity` always holds (`limit` is 75% of capacity),
//! so every probe reaches a free slot.
//!
//! # Removal
//! There are no tombstones. Freeing a slot would cut the probe chains that
//! pass through it, so every occupied slot following it (up to the next free
//! slot) is lifted and reinserted from its home slot. Removal never changes
//! `limit`, which keeps the reinsertion loop finite.

use crate::constants::{BIG_CAPACITY, LOAD_FACTOR, MAX_ARRAY_LEN};
use crate::error::{Error, Result};

// =============================================================================
// Primes
// =============================================================================

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5usize;
    while d * d <= n {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}

/// Smallest prime `>= n` (2 for `n <= 2`).
pub(crate) fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Largest prime `<= n`, or `n` itself when `n < 2`.
pub(crate) fn prev_prime(n: usize) -> usize {
    let mut candidate = n;
    while candidate >= 2 && !is_prime(candidate) {
        candidate -= 1;
    }
    candidate
}

// =============================================================================
// Key hashing
// =============================================================================

const HASH_MASK: usize = i32::MAX as usize;

#[inline]
pub(crate) fn hash_i32(key: i32) -> usize {
    (key & i32::MAX) as usize
}

/// Folds the high word in so ids differing only above bit 31 spread out.
#[inline]
pub(crate) fn hash_i64(key: i64) -> usize {
    ((key ^ (key >> 32)) as usize) & HASH_MASK
}

#[inline]
pub(crate) fn hash_object<Q, S>(hash_builder: &S, key: &Q) -> usize
where
    Q: std::hash::Hash + ?Sized,
    S: std::hash::BuildHasher,
{
    (hash_builder.hash_one(key) as usize) & HASH_MASK
}

// =============================================================================
// Shape
// =============================================================================

/// Capacity, probe step and rehash threshold derived from a requested size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Shape {
    pub(crate) capacity: usize,
    pub(crate) step: usize,
    pub(crate) limit: usize,
}

impl Shape {
    pub(crate) fn for_request(requested: usize) -> Result<Shape> {
        if requested > MAX_ARRAY_LEN {
            return Err(Error::CapacityOverflow {
                requested,
                max: MAX_ARRAY_LEN,
            });
        }
        let capacity = next_prime(requested);
        if capacity > MAX_ARRAY_LEN {
            return Err(Error::CapacityOverflow {
                requested: capacity,
                max: MAX_ARRAY_LEN,
            });
        }
        let step = prev_prime(requested / 3).max(1);
        let limit = (capacity as f64 * LOAD_FACTOR) as usize;
        debug_assert!(step < capacity);
        Ok(Shape {
            capacity,
            step,
            limit,
        })
    }

    /// Shape for a constructor hint; oversized hints are clamped.
    pub(crate) fn for_hint(hint: usize) -> Shape {
        match Shape::for_request(hint.min(BIG_CAPACITY)) {
            Ok(shape) => shape,
            // BIG_CAPACITY rounds up to a prime below the array limit.
            Err(_) => unreachable!("BIG_CAPACITY shape must fit"),
        }
    }

    #[inline]
    pub(crate) fn home(&self, hash: usize) -> usize {
        hash % self.capacity
    }

    #[inline]
    pub(crate) fn next(&self, slot: usize) -> usize {
        let n = slot + self.step;
        if n >= self.capacity {
            n - self.capacity
        } else {
            n
        }
    }

    /// Requested size for the next rehash: double while that stays under
    /// `BIG_CAPACITY`, then `BIG_CAPACITY`, then one more slot (which fails
    /// to find a prime under the array limit).
    pub(crate) fn grown_request(&self) -> usize {
        if self.capacity <= BIG_CAPACITY >> 1 {
            self.capacity << 1
        } else if self.capacity < BIG_CAPACITY {
            BIG_CAPACITY
        } else {
            self.capacity + 1
        }
    }
}

// =============================================================================
// Occupancy bitmap
// =============================================================================

#[derive(Clone, Debug, Default)]
pub(crate) struct Occupancy {
    words: Vec<u64>,
}

impl Occupancy {
    pub(crate) fn new(slots: usize) -> Self {
        Self {
            words: vec![0; slots.div_ceil(64)],
        }
    }

    #[inline]
    pub(crate) fn get(&self, slot: usize) -> bool {
        (self.words[slot / 64] >> (slot % 64)) & 1 != 0
    }

    #[inline]
    pub(crate) fn set(&mut self, slot: usize) {
        self.words[slot / 64] |= 1 << (slot % 64);
    }

    #[inline]
    pub(crate) fn clear(&mut self, slot: usize) {
        self.words[slot / 64] &= !(1 << (slot % 64));
    }

    pub(crate) fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Occupied slots in ascending order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + bit)
            })
        })
    }
}

// =============================================================================
// RawTable
// =============================================================================

/// Slot storage and probing. Callers supply the hash of the key they look
/// up, a predicate recognizing it, and (for anything that moves entries) a
/// function recomputing the hash of a stored key.
#[derive(Clone, Debug)]
pub(crate) struct RawTable<K, V> {
    shape: Shape,
    len: usize,
    used: Occupancy,
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K: Default, V: Default> RawTable<K, V> {
    pub(crate) fn with_capacity(hint: usize) -> Self {
        Self::with_shape(Shape::for_hint(hint))
    }

    fn with_shape(shape: Shape) -> Self {
        let mut keys = Vec::with_capacity(shape.capacity);
        keys.resize_with(shape.capacity, K::default);
        let mut values = Vec::with_capacity(shape.capacity);
        values.resize_with(shape.capacity, V::default);
        Self {
            shape,
            len: 0,
            used: Occupancy::new(shape.capacity),
            keys,
            values,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }

    /// Asserts the structural invariants: `len` matches the bitmap, the load
    /// limit holds, and every key is reachable from its home slot.
    #[cfg(test)]
    pub(crate) fn validate(&self, rehash: impl Fn(&K) -> usize) {
        let occupied: Vec<usize> = self.used.iter().collect();
        assert_eq!(occupied.len(), self.len, "len must match occupied slots");
        assert!(self.len <= self.shape.limit, "load limit exceeded");
        assert!(occupied.iter().all(|&slot| slot < self.shape.capacity));
        for slot in occupied {
            let mut probe = self.shape.home(rehash(&self.keys[slot]));
            while probe != slot {
                assert!(
                    self.used.get(probe),
                    "probe chain to slot {slot} broken at free slot {probe}"
                );
                probe = self.shape.next(probe);
            }
        }
    }

    /// Slot holding the key matched by `is_key`, if any.
    pub(crate) fn find(&self, hash: usize, mut is_key: impl FnMut(&K) -> bool) -> Option<usize> {
        let mut slot = self.shape.home(hash);
        while self.used.get(slot) {
            if is_key(&self.keys[slot]) {
                return Some(slot);
            }
            slot = self.shape.next(slot);
        }
        None
    }

    /// First free slot on the probe sequence of `hash`.
    fn vacant(&self, hash: usize) -> usize {
        let mut slot = self.shape.home(hash);
        while self.used.get(slot) {
            slot = self.shape.next(slot);
        }
        slot
    }

    /// Inserts or replaces. Returns the previous value when an equal key was
    /// present. Rehashes first when the table is at its limit.
    pub(crate) fn insert(
        &mut self,
        hash: usize,
        key: K,
        value: V,
        rehash: impl Fn(&K) -> usize,
    ) -> Result<Option<V>>
    where
        K: PartialEq,
    {
        if self.len == self.shape.limit {
            self.grow(&rehash)?;
        }
        if let Some(slot) = self.find(hash, |stored| *stored == key) {
            return Ok(Some(std::mem::replace(&mut self.values[slot], value)));
        }
        let slot = self.vacant(hash);
        self.used.set(slot);
        self.keys[slot] = key;
        self.values[slot] = value;
        self.len += 1;
        Ok(None)
    }

    /// Removes the matched key and re-seats the rest of its chain.
    pub(crate) fn remove(
        &mut self,
        hash: usize,
        is_key: impl FnMut(&K) -> bool,
        rehash: impl Fn(&K) -> usize,
    ) -> Option<(K, V)> {
        let slot = self.find(hash, is_key)?;
        self.used.clear(slot);
        self.len -= 1;
        let removed = (
            std::mem::take(&mut self.keys[slot]),
            std::mem::take(&mut self.values[slot]),
        );

        let mut follower = self.shape.next(slot);
        while self.used.get(follower) {
            self.used.clear(follower);
            let key = std::mem::take(&mut self.keys[follower]);
            let value = std::mem::take(&mut self.values[follower]);
            let seat = self.vacant(rehash(&key));
            self.used.set(seat);
            self.keys[seat] = key;
            self.values[seat] = value;
            follower = self.shape.next(follower);
        }
        Some(removed)
    }

    fn grow(&mut self, rehash: &impl Fn(&K) -> usize) -> Result<()> {
        let shape = Shape::for_request(self.shape.grown_request())?;
        log::debug!(
            "rehashing {} entries: capacity {} -> {}",
            self.len,
            self.shape.capacity,
            shape.capacity
        );
        let mut grown = Self::with_shape(shape);
        for slot in self.used.iter() {
            let key = std::mem::take(&mut self.keys[slot]);
            let value = std::mem::take(&mut self.values[slot]);
            let seat = grown.vacant(rehash(&key));
            grown.used.set(seat);
            grown.keys[seat] = key;
            grown.values[seat] = value;
        }
        grown.len = self.len;
        *self = grown;
        Ok(())
    }

    /// Drops every entry, keeping the capacity.
    pub(crate) fn clear(&mut self) {
        for slot in self.used.iter() {
            self.keys[slot] = K::default();
            self.values[slot] = V::default();
        }
        self.used.clear_all();
        self.len = 0;
    }

    #[cfg(test)]
    pub(crate) fn key(&self, slot: usize) -> &K {
        &self.keys[slot]
    }

    #[inline]
    pub(crate) fn value(&self, slot: usize) -> &V {
        &self.values[slot]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, slot: usize) -> &mut V {
        &mut self.values[slot]
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.used.iter()
    }

    /// Occupied entries in slot order; every bulk view walks this sequence.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.used
            .iter()
            .map(move |slot| (&self.keys[slot], &self.values[slot]))
    }
}
