//! Hash sets of `i32` and `i64` keys.
//!
//! Both are thin wrappers over [`RawTable`](crate::table::RawTable) with a
//! zero-sized value. Iteration order is slot order and changes on rehash.

use std::fmt;

use crate::constants::DEFAULT_CAPACITY;
use crate::table::{hash_i32, hash_i64, RawTable};

macro_rules! primitive_set {
    ($(#[$meta:meta])* $name:ident, $key:ty, $hash:path) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            table: RawTable<$key, ()>,
        }

        impl $name {
            /// Creates an empty set with the default capacity.
            pub fn new() -> Self {
                Self::with_capacity(DEFAULT_CAPACITY)
            }

            /// Creates an empty set sized for `capacity` keys before the first
            /// rehash is considered.
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    table: RawTable::with_capacity(capacity),
                }
            }

            /// Adds `key`; returns `false` if it was already present.
            ///
            /// # Panics
            ///
            /// Panics if the table cannot grow any further.
            pub fn add(&mut self, key: $key) -> bool {
                match self.table.insert($hash(key), key, (), |k| $hash(*k)) {
                    Ok(previous) => previous.is_none(),
                    Err(e) => panic!("{e}"),
                }
            }

            /// Removes `key`; returns `false` if it was absent.
            pub fn remove(&mut self, key: $key) -> bool {
                self.table
                    .remove($hash(key), |k| *k == key, |k| $hash(*k))
                    .is_some()
            }

            #[inline]
            pub fn contains(&self, key: $key) -> bool {
                self.table.find($hash(key), |k| *k == key).is_some()
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.table.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.table.len() == 0
            }

            /// Removes every key, keeping the capacity.
            pub fn clear(&mut self) {
                self.table.clear();
            }

            /// Iterates over the keys in table order.
            pub fn iter(&self) -> impl Iterator<Item = $key> + '_ {
                self.table.iter().map(|(k, _)| *k)
            }

            #[cfg(test)]
            pub(crate) fn validate(&self) {
                self.table.validate(|k| $hash(*k));
            }

            /// Copies the keys into a new `Vec`, in the order of [`iter`](Self::iter).
            pub fn to_array(&self) -> Vec<$key> {
                let mut keys = Vec::with_capacity(self.len());
                keys.extend(self.iter());
                keys
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }

        impl Extend<$key> for $name {
            fn extend<I: IntoIterator<Item = $key>>(&mut self, iter: I) {
                for key in iter {
                    self.add(key);
                }
            }
        }

        impl FromIterator<$key> for $name {
            fn from_iter<I: IntoIterator<Item = $key>>(iter: I) -> Self {
                let mut set = Self::new();
                set.extend(iter);
                set
            }
        }
    };
}

primitive_set!(
    /// Set of `i32` keys, typically object ids.
    ///
    /// ```rust
    /// use heapgraph_collect::SetInt;
    ///
    /// let mut s = SetInt::with_capacity(4);
    /// assert!(s.add(10));
    /// assert!(s.add(20));
    /// assert!(!s.add(10));
    /// assert!(s.remove(20));
    /// assert!(s.contains(10));
    /// assert_eq!(s.len(), 1);
    /// ```
    SetInt,
    i32,
    hash_i32
);

primitive_set!(
    /// Set of `i64` keys, typically object addresses.
    SetLong,
    i64,
    hash_i64
);
