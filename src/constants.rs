//! Limits and tunables shared by the containers.

/// Largest element count any container will allocate.
///
/// Element indices stay within the signed 32-bit domain the object graph uses
/// for its ids; the small headroom below `i32::MAX` matches what managed
/// runtimes reserve for array headers.
pub const MAX_ARRAY_LEN: usize = i32::MAX as usize - 8;

/// Largest prime not above `MAX_ARRAY_LEN + 1`, minus one.
///
/// Hash-table capacities are rounded up to the next prime, so requesting this
/// value yields the largest prime table that still fits.
pub const BIG_CAPACITY: usize = 2_147_483_628;

/// Capacity used by the `new()` constructors.
pub const DEFAULT_CAPACITY: usize = 10;

/// Fraction of hash-table slots that may be occupied before a rehash.
pub const LOAD_FACTOR: f64 = 0.75;

/// Bits per concurrently mutable word of a bit field.
pub const WORD_BITS: usize = 64;
