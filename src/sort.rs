//! Paired sorts: order a key array and permute a value array identically.
//!
//! Used to order object ids by retained size and similar index builds where
//! the arrays are too large for a `Vec<(K, V)>` copy.
//!
//! # Algorithm
//! - ranges of at most [`SortConfig::insertion_max`] elements: insertion sort
//! - ranges of at most [`SortConfig::radix_max`] elements: LSD byte radix sort
//!   (stable, one counting pass per key byte, passes where every key shares
//!   the byte are skipped)
//! - larger ranges: three-way quicksort partition around a median-of-three
//!   pivot, recursing into the smaller side and looping on the larger
//!
//! After a lopsided split the next pivot is taken from a scrambled index
//! instead. A range that keeps splitting badly (`2·log2(n)` times) is handed
//! to the radix sort whole, so the worst case stays `O(n log n)`.

use crate::error::{Error, Result};

// =============================================================================
// Keys and configuration
// =============================================================================

mod private {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// Key types the paired sort handles.
pub trait SortKey: private::Sealed + Copy + Ord {
    /// Number of radix passes.
    const BYTES: usize;

    /// Byte `n` (0 is least significant) of the key with the sign bit
    /// flipped, so unsigned byte order matches signed key order.
    fn radix_byte(self, n: usize) -> usize;
}

impl SortKey for i32 {
    const BYTES: usize = 4;

    #[inline]
    fn radix_byte(self, n: usize) -> usize {
        (((self as u32) ^ 0x8000_0000) >> (8 * n)) as usize & 0xff
    }
}

impl SortKey for i64 {
    const BYTES: usize = 8;

    #[inline]
    fn radix_byte(self, n: usize) -> usize {
        (((self as u64) ^ 0x8000_0000_0000_0000) >> (8 * n)) as usize & 0xff
    }
}

/// Direction keys are sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Whether `a` belongs strictly before `b`.
    #[inline(always)]
    fn before<K: Ord>(self, a: K, b: K) -> bool {
        match self {
            Order::Ascending => a < b,
            Order::Descending => a > b,
        }
    }
}

/// Switch points between the three sorting strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    /// Ranges up to this length use insertion sort.
    pub insertion_max: usize,
    /// Ranges up to this length use radix sort; longer ones are partitioned.
    pub radix_max: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            insertion_max: 12,
            radix_max: 1_000_000,
        }
    }
}

// =============================================================================
// Public entry points
// =============================================================================

/// Sorts `keys` ascending, applying the same permutation to `values`.
///
/// ```rust
/// use heapgraph_collect::sort;
///
/// let mut keys = [3, -1, 2];
/// let mut values = [30, -10, 20];
/// sort::sort(&mut keys, &mut values).unwrap();
/// assert_eq!(keys, [-1, 2, 3]);
/// assert_eq!(values, [-10, 20, 30]);
/// ```
pub fn sort(keys: &mut [i32], values: &mut [i32]) -> Result<()> {
    sort_with(keys, values, &SortConfig::default())
}

/// [`sort`] with explicit strategy switch points.
pub fn sort_with(keys: &mut [i32], values: &mut [i32], config: &SortConfig) -> Result<()> {
    sort_pairs(keys, values, Order::Ascending, config)
}

/// Sorts `keys[offset..offset + len]` ascending together with the same range
/// of `values`. Elements outside the range are untouched.
pub fn sort_range(keys: &mut [i32], values: &mut [i32], offset: usize, len: usize) -> Result<()> {
    check_lengths(keys.len(), values.len())?;
    let end = offset.checked_add(len).filter(|&end| end <= keys.len()).ok_or(
        Error::IndexOutOfBounds {
            index: offset.saturating_add(len),
            len: keys.len(),
        },
    )?;
    sort(&mut keys[offset..end], &mut values[offset..end])
}

/// Sorts `keys` descending, applying the same permutation to `values`.
pub fn sort_desc(keys: &mut [i64], values: &mut [i32]) -> Result<()> {
    sort_desc_with(keys, values, &SortConfig::default())
}

/// [`sort_desc`] with explicit strategy switch points.
pub fn sort_desc_with(keys: &mut [i64], values: &mut [i32], config: &SortConfig) -> Result<()> {
    sort_pairs(keys, values, Order::Descending, config)
}

/// [`sort_desc`] reusing caller-owned radix buffers across calls.
pub fn sort_desc_with_scratch(
    keys: &mut [i64],
    values: &mut [i32],
    scratch_keys: &mut Vec<i64>,
    scratch_values: &mut Vec<i32>,
) -> Result<()> {
    check_lengths(keys.len(), values.len())?;
    let budget = bad_split_budget(keys.len());
    let mut scratch = Scratch {
        keys: scratch_keys,
        values: scratch_values,
    };
    hybrid(
        keys,
        values,
        Order::Descending,
        &SortConfig::default(),
        &mut scratch,
        budget,
    );
    Ok(())
}

/// Sorts any supported key type in either order.
pub fn sort_pairs<K: SortKey, V: Copy>(
    keys: &mut [K],
    values: &mut [V],
    order: Order,
    config: &SortConfig,
) -> Result<()> {
    check_lengths(keys.len(), values.len())?;
    let budget = bad_split_budget(keys.len());
    let mut scratch_keys = Vec::new();
    let mut scratch_values = Vec::new();
    let mut scratch = Scratch {
        keys: &mut scratch_keys,
        values: &mut scratch_values,
    };
    hybrid(keys, values, order, config, &mut scratch, budget);
    Ok(())
}

fn check_lengths(keys: usize, values: usize) -> Result<()> {
    if keys != values {
        return Err(Error::LengthMismatch {
            expected: keys,
            actual: values,
        });
    }
    Ok(())
}

fn bad_split_budget(n: usize) -> u32 {
    2 * (usize::BITS - n.leading_zeros())
}

// =============================================================================
// Hybrid driver
// =============================================================================

struct Scratch<'a, K, V> {
    keys: &'a mut Vec<K>,
    values: &'a mut Vec<V>,
}

fn hybrid<K: SortKey, V: Copy>(
    mut keys: &mut [K],
    mut values: &mut [V],
    order: Order,
    config: &SortConfig,
    scratch: &mut Scratch<'_, K, V>,
    mut budget: u32,
) {
    let mut use_median = true;
    loop {
        let n = keys.len();
        if n <= 1 {
            return;
        }
        if n <= config.insertion_max {
            insertion_sort(keys, values, order);
            return;
        }
        if n <= config.radix_max {
            radix_sort(keys, values, order, scratch);
            return;
        }
        if budget == 0 {
            log::debug!("sort: {n} elements keep splitting badly, using radix sort");
            radix_sort(keys, values, order, scratch);
            return;
        }

        let pivot = if use_median {
            median_of_three(keys, values, order)
        } else {
            scrambled_index(n)
        };
        let (lt, gt) = partition(keys, values, pivot, order);
        let size_left = lt;
        let size_right = n - gt;
        use_median = good_split(size_left, size_right, n - 1);
        if !use_median {
            budget -= 1;
        }

        let (left_keys, rest_keys) = std::mem::take(&mut keys).split_at_mut(lt);
        let right_keys = &mut rest_keys[gt - lt..];
        let (left_values, rest_values) = std::mem::take(&mut values).split_at_mut(lt);
        let right_values = &mut rest_values[gt - lt..];

        if size_left <= size_right {
            hybrid(left_keys, left_values, order, config, scratch, budget);
            keys = right_keys;
            values = right_values;
        } else {
            hybrid(right_keys, right_values, order, config, scratch, budget);
            keys = left_keys;
            values = left_values;
        }
    }
}

/// Whether neither side took (nearly) everything.
#[inline]
fn good_split(size_left: usize, size_right: usize, size_all: usize) -> bool {
    size_all - size_left.max(size_right) + 50 > size_all / 10
}

#[inline]
fn scrambled_index(n: usize) -> usize {
    let right = n - 1;
    ((right >> 2) ^ right) % right
}

// =============================================================================
// Strategies
// =============================================================================

#[inline(always)]
fn swap_pair<K, V>(keys: &mut [K], values: &mut [V], a: usize, b: usize) {
    keys.swap(a, b);
    values.swap(a, b);
}

fn insertion_sort<K: SortKey, V: Copy>(keys: &mut [K], values: &mut [V], order: Order) {
    for i in 1..keys.len() {
        let mut j = i;
        while j > 0 && order.before(keys[j], keys[j - 1]) {
            swap_pair(keys, values, j, j - 1);
            j -= 1;
        }
    }
}

/// Orders the first, middle and last keys in place and returns the middle.
fn median_of_three<K: SortKey, V: Copy>(keys: &mut [K], values: &mut [V], order: Order) -> usize {
    let last = keys.len() - 1;
    let middle = last / 2;
    if order.before(keys[middle], keys[0]) {
        swap_pair(keys, values, 0, middle);
    }
    if order.before(keys[last], keys[middle]) {
        swap_pair(keys, values, middle, last);
    }
    if order.before(keys[middle], keys[0]) {
        swap_pair(keys, values, 0, middle);
    }
    middle
}

/// Three-way partition around `keys[pivot]`. Returns `(lt, gt)` with
/// `keys[..lt]` before the pivot, `keys[lt..gt]` equal to it and `keys[gt..]`
/// after it.
fn partition<K: SortKey, V: Copy>(
    keys: &mut [K],
    values: &mut [V],
    pivot: usize,
    order: Order,
) -> (usize, usize) {
    let last = keys.len() - 1;
    let pivot_key = keys[pivot];
    swap_pair(keys, values, pivot, last);
    // [0, i) before, [i, i + equal) equal, [i + equal, j) after
    let mut i = 0;
    let mut equal = 0;
    for j in 0..last {
        if order.before(keys[j], pivot_key) {
            swap_pair(keys, values, i, j);
            if equal > 0 {
                swap_pair(keys, values, i + equal, j);
            }
            i += 1;
        } else if keys[j] == pivot_key {
            swap_pair(keys, values, i + equal, j);
            equal += 1;
        }
    }
    swap_pair(keys, values, i + equal, last);
    (i, i + equal + 1)
}

fn radix_sort<K: SortKey, V: Copy>(
    keys: &mut [K],
    values: &mut [V],
    order: Order,
    scratch: &mut Scratch<'_, K, V>,
) {
    scratch.keys.clear();
    scratch.keys.extend_from_slice(keys);
    scratch.values.clear();
    scratch.values.extend_from_slice(values);

    // Which buffer holds the current permutation.
    let mut in_scratch = false;
    for byte in 0..K::BYTES {
        let moved = if in_scratch {
            counting_pass(&scratch.keys[..], &scratch.values[..], keys, values, byte, order)
        } else {
            counting_pass(
                keys,
                values,
                &mut scratch.keys[..],
                &mut scratch.values[..],
                byte,
                order,
            )
        };
        if moved {
            in_scratch = !in_scratch;
        }
    }
    if in_scratch {
        keys.copy_from_slice(&scratch.keys[..]);
        values.copy_from_slice(&scratch.values[..]);
    }
}

/// One stable counting pass on `byte`. Returns `false` without writing when
/// every key has the same digit.
fn counting_pass<K: SortKey, V: Copy>(
    src_keys: &[K],
    src_values: &[V],
    dst_keys: &mut [K],
    dst_values: &mut [V],
    byte: usize,
    order: Order,
) -> bool {
    let digit = |k: K| match order {
        Order::Ascending => k.radix_byte(byte),
        Order::Descending => 255 - k.radix_byte(byte),
    };

    let mut count = [0usize; 256];
    for &k in src_keys {
        count[digit(k)] += 1;
    }
    if count.iter().any(|&c| c == src_keys.len()) {
        return false;
    }

    let mut next = [0usize; 256];
    for d in 1..256 {
        next[d] = next[d - 1] + count[d - 1];
    }
    for (&k, &v) in src_keys.iter().zip(src_values) {
        let d = digit(k);
        dst_keys[next[d]] = k;
        dst_values[next[d]] = v;
        next[d] += 1;
    }
    true
}
