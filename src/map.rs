//! Hash maps keyed by primitives or by objects.
//!
//! All four share [`RawTable`] for probing, growth and chain-preserving
//! removal. Iteration follows slot order; `keys()`, `values()`, `iter()` and
//! the `get_all_*` snapshots walk the same slots, so their positions pair up
//! as long as the map is not mutated in between.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::constants::DEFAULT_CAPACITY;
use crate::error::{Error, Result};
use crate::table::{hash_i32, hash_i64, hash_object, RawTable};

// =============================================================================
// HashMapIntLong
// =============================================================================

/// Map from `i32` to `i64`, e.g. object id to retained size.
///
/// ```rust
/// use heapgraph_collect::{Error, HashMapIntLong};
///
/// let mut m = HashMapIntLong::new();
/// assert_eq!(m.put(7, 700), None);
/// assert_eq!(m.put(7, 701), Some(700));
/// assert_eq!(m.get(7), Ok(701));
/// assert_eq!(m.get(8), Err(Error::KeyNotFound));
/// ```
#[derive(Clone)]
pub struct HashMapIntLong {
    table: RawTable<i32, i64>,
}

impl HashMapIntLong {
    /// Empty map sized for [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Empty map that holds `capacity` entries before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
        }
    }

    /// Maps `key` to `value`, returning the value it replaced.
    ///
    /// # Panics
    ///
    /// Panics if the table cannot grow any further.
    pub fn put(&mut self, key: i32, value: i64) -> Option<i64> {
        match self.table.insert(hash_i32(key), key, value, |k| hash_i32(*k)) {
            Ok(previous) => previous,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn get(&self, key: i32) -> Result<i64> {
        self.table
            .find(hash_i32(key), |k| *k == key)
            .map(|slot| *self.table.value(slot))
            .ok_or(Error::KeyNotFound)
    }

    #[inline]
    pub fn contains_key(&self, key: i32) -> bool {
        self.table.find(hash_i32(key), |k| *k == key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: i32) -> Option<i64> {
        self.table
            .remove(hash_i32(key), |k| *k == key, |k| hash_i32(*k))
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.table.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.table.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i64)> + '_ {
        self.table.iter().map(|(k, v)| (*k, *v))
    }

    /// Same as [`iter`](Self::iter).
    pub fn entries(&self) -> impl Iterator<Item = (i32, i64)> + '_ {
        self.iter()
    }

    pub fn get_all_keys(&self) -> Vec<i32> {
        self.keys().collect()
    }

    pub fn get_all_values(&self) -> Vec<i64> {
        self.values().collect()
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        self.table.validate(|k| hash_i32(*k));
    }
}

impl Default for HashMapIntLong {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HashMapIntLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Extend<(i32, i64)> for HashMapIntLong {
    fn extend<I: IntoIterator<Item = (i32, i64)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

// =============================================================================
// HashMapIntObject / HashMapLongObject
// =============================================================================

macro_rules! primitive_object_map {
    ($(#[$meta:meta])* $name:ident, $key:ty, $hash:path) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name<V> {
            // Occupied slots always hold `Some`.
            table: RawTable<$key, Option<V>>,
        }

        impl<V> $name<V> {
            /// Empty map sized for [`DEFAULT_CAPACITY`] entries.
            pub fn new() -> Self {
                Self::with_capacity(DEFAULT_CAPACITY)
            }

            /// Empty map that holds `capacity` entries before growing.
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    table: RawTable::with_capacity(capacity),
                }
            }

            /// Maps `key` to `value`, returning the value it replaced.
            ///
            /// # Panics
            ///
            /// Panics if the table cannot grow any further.
            pub fn put(&mut self, key: $key, value: V) -> Option<V> {
                match self.table.insert($hash(key), key, Some(value), |k| $hash(*k)) {
                    Ok(previous) => previous.flatten(),
                    Err(e) => panic!("{e}"),
                }
            }

            pub fn get(&self, key: $key) -> Result<&V> {
                self.table
                    .find($hash(key), |k| *k == key)
                    .and_then(|slot| self.table.value(slot).as_ref())
                    .ok_or(Error::KeyNotFound)
            }

            pub fn get_mut(&mut self, key: $key) -> Result<&mut V> {
                match self.table.find($hash(key), |k| *k == key) {
                    Some(slot) => self
                        .table
                        .value_mut(slot)
                        .as_mut()
                        .ok_or(Error::KeyNotFound),
                    None => Err(Error::KeyNotFound),
                }
            }

            #[inline]
            pub fn contains_key(&self, key: $key) -> bool {
                self.table.find($hash(key), |k| *k == key).is_some()
            }

            /// Removes `key`, returning its value if it was present.
            pub fn remove(&mut self, key: $key) -> Option<V> {
                self.table
                    .remove($hash(key), |k| *k == key, |k| $hash(*k))
                    .and_then(|(_, v)| v)
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.table.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.table.len() == 0
            }

            /// Drops every entry, keeping the capacity.
            pub fn clear(&mut self) {
                self.table.clear();
            }

            pub fn keys(&self) -> impl Iterator<Item = $key> + '_ {
                self.table.iter().map(|(k, _)| *k)
            }

            pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
                self.table.iter().filter_map(|(_, v)| v.as_ref())
            }

            pub fn iter(&self) -> impl Iterator<Item = ($key, &V)> + '_ {
                self.table
                    .iter()
                    .filter_map(|(k, v)| v.as_ref().map(|v| (*k, v)))
            }

            /// Same as [`iter`](Self::iter).
            pub fn entries(&self) -> impl Iterator<Item = ($key, &V)> + '_ {
                self.iter()
            }

            pub fn get_all_keys(&self) -> Vec<$key> {
                self.keys().collect()
            }

            pub fn get_all_values(&self) -> Vec<&V> {
                self.values().collect()
            }

            #[cfg(test)]
            pub(crate) fn validate(&self) {
                self.table.validate(|k| $hash(*k));
            }
        }

        impl<V> Default for $name<V> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<V: fmt::Debug> fmt::Debug for $name<V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.iter()).finish()
            }
        }

        impl<V> Extend<($key, V)> for $name<V> {
            fn extend<I: IntoIterator<Item = ($key, V)>>(&mut self, iter: I) {
                for (k, v) in iter {
                    self.put(k, v);
                }
            }
        }
    };
}

primitive_object_map!(
    /// Map from `i32` object ids to owned values.
    HashMapIntObject,
    i32,
    hash_i32
);

primitive_object_map!(
    /// Map from `i64` addresses to owned values.
    ///
    /// ```rust
    /// use heapgraph_collect::HashMapLongObject;
    ///
    /// let mut m = HashMapLongObject::new();
    /// m.put(0x7f00_0000_1000, "java.lang.String");
    /// assert_eq!(m.get(0x7f00_0000_1000), Ok(&"java.lang.String"));
    /// assert_eq!(m.remove(0x7f00_0000_1000), Some("java.lang.String"));
    /// assert!(m.is_empty());
    /// ```
    HashMapLongObject,
    i64,
    hash_i64
);

// =============================================================================
// HashMapObjectLong
// =============================================================================

/// Map from object keys to `i64`.
///
/// Keys are compared by [`Eq`], not identity: an equal key instance
/// replaces or removes the stored entry. Lookups take any borrowed form of
/// the key, as with `std::collections::HashMap`.
///
/// ```rust
/// use heapgraph_collect::HashMapObjectLong;
///
/// let mut m: HashMapObjectLong<String> = HashMapObjectLong::new();
/// m.put("java.util.HashMap".to_string(), 48);
/// assert_eq!(m.get("java.util.HashMap"), Ok(48));
/// assert_eq!(m.remove("java.util.HashMap"), Some(48));
/// ```
#[derive(Clone)]
pub struct HashMapObjectLong<K, S = ahash::RandomState> {
    // Occupied slots always hold `Some`.
    table: RawTable<Option<K>, i64>,
    hash_builder: S,
}

impl<K: Eq + Hash> HashMapObjectLong<K> {
    /// Empty map with a randomly seeded hasher.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Like [`new`](Self::new), holding `capacity` entries before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, ahash::RandomState::new())
    }
}

impl<K: Eq + Hash, S: BuildHasher> HashMapObjectLong<K, S> {
    /// Empty map hashing keys with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: RawTable::with_capacity(capacity),
            hash_builder,
        }
    }

    #[inline]
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_object(&self.hash_builder, key);
        self.table.find(hash, |stored| {
            stored.as_ref().is_some_and(|k| k.borrow() == key)
        })
    }

    /// Maps `key` to `value`, returning the value it replaced.
    ///
    /// # Panics
    ///
    /// Panics if the table cannot grow any further.
    pub fn put(&mut self, key: K, value: i64) -> Option<i64> {
        let hash = hash_object(&self.hash_builder, &key);
        let hash_builder = &self.hash_builder;
        let rehash = |stored: &Option<K>| {
            stored
                .as_ref()
                .map_or(0, |k| hash_object(hash_builder, k))
        };
        match self.table.insert(hash, Some(key), value, rehash) {
            Ok(previous) => previous,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Result<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key)
            .map(|slot| *self.table.value(slot))
            .ok_or(Error::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry whose key equals `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = hash_object(&self.hash_builder, key);
        let hash_builder = &self.hash_builder;
        self.table
            .remove(
                hash,
                |stored| stored.as_ref().is_some_and(|k| k.borrow() == key),
                |stored| {
                    stored
                        .as_ref()
                        .map_or(0, |k| hash_object(hash_builder, k))
                },
            )
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Drops every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.iter().filter_map(|(k, _)| k.as_ref())
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.table.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i64)> + '_ {
        self.table
            .iter()
            .filter_map(|(k, v)| k.as_ref().map(|k| (k, *v)))
    }

    /// Same as [`iter`](Self::iter).
    pub fn entries(&self) -> impl Iterator<Item = (&K, i64)> + '_ {
        self.iter()
    }

    pub fn get_all_keys(&self) -> Vec<&K> {
        self.keys().collect()
    }

    pub fn get_all_values(&self) -> Vec<i64> {
        self.values().collect()
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        self.table.validate(|stored| {
            stored
                .as_ref()
                .map_or(0, |k| hash_object(&self.hash_builder, k))
        });
    }
}

impl<K: Eq + Hash, S: BuildHasher + Default> Default for HashMapObjectLong<K, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Eq + Hash + fmt::Debug, S: BuildHasher> fmt::Debug for HashMapObjectLong<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Eq + Hash, S: BuildHasher> Extend<(K, i64)> for HashMapObjectLong<K, S> {
    fn extend<I: IntoIterator<Item = (K, i64)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}
