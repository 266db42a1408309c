//! Growable primitive arrays.
//!
//! [`ArrayInt`] and [`ArrayLong`] hold unboxed `i32` / `i64` values in one
//! contiguous buffer. Capacity grows by half on demand and saturates at
//! [`MAX_ARRAY_LEN`]; growth past that limit is reported, never wrapped.
//!
//! # Threading
//! Mutation goes through `&mut self`; sharing across threads needs an
//! external lock.

use std::fmt;

use crate::constants::{DEFAULT_CAPACITY, MAX_ARRAY_LEN};
use crate::error::{Error, Result};

// =============================================================================
// Growth policy
// =============================================================================

/// Capacity to allocate when `min_capacity` elements must fit and the buffer
/// currently holds `old_capacity`.
///
/// Scales by 1.5; if that is still short, scales the requirement by 1.5. The
/// result is clamped to [`MAX_ARRAY_LEN`], and a requirement above the limit
/// is an error.
pub(crate) fn grown_capacity(old_capacity: usize, min_capacity: usize) -> Result<usize> {
    if min_capacity > MAX_ARRAY_LEN {
        return Err(Error::CapacityOverflow {
            requested: min_capacity,
            max: MAX_ARRAY_LEN,
        });
    }
    let mut new_capacity = old_capacity.saturating_mul(3) / 2;
    if new_capacity < min_capacity {
        new_capacity = min_capacity.saturating_mul(3) / 2;
    }
    if new_capacity > MAX_ARRAY_LEN {
        log::debug!(
            "array growth saturated at {MAX_ARRAY_LEN} elements (required {min_capacity})"
        );
        new_capacity = MAX_ARRAY_LEN;
    }
    Ok(new_capacity.max(min_capacity))
}

/// `len + additional`, or the overflow error when it cannot be represented.
#[inline]
pub(crate) fn required_capacity(len: usize, additional: usize) -> Result<usize> {
    match len.checked_add(additional) {
        Some(n) if n <= MAX_ARRAY_LEN => Ok(n),
        Some(n) => Err(Error::CapacityOverflow {
            requested: n,
            max: MAX_ARRAY_LEN,
        }),
        None => Err(Error::CapacityOverflow {
            requested: usize::MAX,
            max: MAX_ARRAY_LEN,
        }),
    }
}

// =============================================================================
// ArrayInt / ArrayLong
// =============================================================================

macro_rules! primitive_array {
    ($(#[$meta:meta])* $name:ident, $elem:ty) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            // `elements.len()` is the logical size; spare capacity is managed
            // by `try_reserve` so the growth policy stays ours.
            elements: Vec<$elem>,
        }

        impl $name {
            /// Creates an empty array with the default capacity.
            pub fn new() -> Self {
                Self::with_capacity(DEFAULT_CAPACITY)
            }

            /// Creates an empty array able to hold `capacity` elements before
            /// growing. Hints above [`MAX_ARRAY_LEN`] are clamped.
            pub fn with_capacity(capacity: usize) -> Self {
                Self {
                    elements: Vec::with_capacity(capacity.min(MAX_ARRAY_LEN)),
                }
            }

            /// Copies `values` into a new array.
            pub fn from_slice(values: &[$elem]) -> Self {
                Self {
                    elements: values.to_vec(),
                }
            }

            /// Appends `element`.
            ///
            /// # Panics
            ///
            /// Panics if the array already holds [`MAX_ARRAY_LEN`] elements.
            /// Use [`try_reserve`](Self::try_reserve) to check beforehand.
            #[inline]
            pub fn add(&mut self, element: $elem) {
                if self.elements.len() == self.elements.capacity() {
                    if let Err(e) = self.try_reserve(1) {
                        panic!("{e}");
                    }
                }
                self.elements.push(element);
            }

            /// Appends every value of `elements`.
            ///
            /// # Panics
            ///
            /// Panics if the result would exceed [`MAX_ARRAY_LEN`] elements.
            pub fn add_all(&mut self, elements: &[$elem]) {
                if let Err(e) = self.try_reserve(elements.len()) {
                    panic!("{e}");
                }
                self.elements.extend_from_slice(elements);
            }

            /// Appends every element of `other`.
            pub fn add_all_from(&mut self, other: &$name) {
                self.add_all(&other.elements);
            }

            /// Makes room for `additional` more elements using the 1.5x growth
            /// policy.
            pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
                let len = self.elements.len();
                let required = required_capacity(len, additional)?;
                let capacity = self.elements.capacity();
                if required > capacity {
                    let new_capacity = grown_capacity(capacity, required)?;
                    self.elements.reserve_exact(new_capacity - len);
                }
                Ok(())
            }

            /// Replaces the element at `index`, returning the previous value.
            pub fn set(&mut self, index: usize, element: $elem) -> Result<$elem> {
                let len = self.elements.len();
                let slot = self
                    .elements
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfBounds { index, len })?;
                Ok(std::mem::replace(slot, element))
            }

            /// Returns the element at `index`.
            #[inline]
            pub fn get(&self, index: usize) -> Result<$elem> {
                self.elements
                    .get(index)
                    .copied()
                    .ok_or(Error::IndexOutOfBounds {
                        index,
                        len: self.elements.len(),
                    })
            }

            /// Number of elements added.
            #[inline]
            pub fn len(&self) -> usize {
                self.elements.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.elements.is_empty()
            }

            /// Number of elements the buffer holds before it must grow.
            #[inline]
            pub fn capacity(&self) -> usize {
                self.elements.capacity()
            }

            /// Removes all elements, keeping the buffer.
            pub fn clear(&mut self) {
                self.elements.clear();
            }

            /// First element, or `IndexOutOfBounds` when empty.
            pub fn first_element(&self) -> Result<$elem> {
                self.get(0)
            }

            /// Last element, or `IndexOutOfBounds` when empty.
            pub fn last_element(&self) -> Result<$elem> {
                match self.elements.last() {
                    Some(&v) => Ok(v),
                    None => Err(Error::IndexOutOfBounds { index: 0, len: 0 }),
                }
            }

            /// Sorts the elements in ascending order.
            pub fn sort(&mut self) {
                self.elements.sort_unstable();
            }

            /// Shortens the array to `len` elements and releases spare capacity.
            pub fn truncate(&mut self, len: usize) {
                self.elements.truncate(len);
                self.elements.shrink_to_fit();
            }

            /// Iterates over the elements in index order.
            #[inline]
            pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, $elem>> {
                self.elements.iter().copied()
            }

            /// Copies the elements into a new `Vec`.
            pub fn to_array(&self) -> Vec<$elem> {
                self.elements.clone()
            }

            #[inline]
            pub fn as_slice(&self) -> &[$elem] {
                &self.elements
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.elements.iter()).finish()
            }
        }

        impl From<&[$elem]> for $name {
            fn from(values: &[$elem]) -> Self {
                Self::from_slice(values)
            }
        }

        impl Extend<$elem> for $name {
            fn extend<I: IntoIterator<Item = $elem>>(&mut self, iter: I) {
                for v in iter {
                    self.add(v);
                }
            }
        }

        impl FromIterator<$elem> for $name {
            fn from_iter<I: IntoIterator<Item = $elem>>(iter: I) -> Self {
                let mut array = Self::new();
                array.extend(iter);
                array
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = $elem;
            type IntoIter = std::iter::Copied<std::slice::Iter<'a, $elem>>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

primitive_array!(
    /// Growable array of `i32`.
    ///
    /// ```rust
    /// use heapgraph_collect::ArrayInt;
    ///
    /// let mut a = ArrayInt::with_capacity(2);
    /// a.add(3);
    /// a.add(1);
    /// a.add(2);
    /// assert_eq!(a.len(), 3);
    /// assert_eq!(a.get(1), Ok(1));
    /// assert_eq!(a.iter().collect::<Vec<_>>(), vec![3, 1, 2]);
    /// ```
    ArrayInt,
    i32
);

primitive_array!(
    /// Growable array of `i64`.
    ArrayLong,
    i64
);
