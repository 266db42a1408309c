//! Error types for the collection layer.
//!
//! Every failure here is a contract violation by the caller (bad index, absent
//! key, malformed layout or byte stream). Nothing is retried internally.

use thiserror::Error;

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the containers in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Lookup errors
    // =========================================================================
    /// Position outside `[0, len)` of an array or compressed array.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Dequeue from a queue holding no elements.
    #[error("queue is empty")]
    QueueEmpty,

    /// `get` on a map key that has no mapping.
    #[error("key not found")]
    KeyNotFound,

    // =========================================================================
    // Argument errors
    // =========================================================================
    /// A bit field needs at least one bit.
    #[error("bit field must hold at least one bit")]
    EmptyBitField,

    /// Parallel arrays or an output buffer have the wrong length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Bit width and trailing-zero count do not describe a valid packing.
    #[error(
        "invalid compressed layout: {bits_per_element} bits per element with \
         {trailing_clear_bits} trailing clear bits (element width {max_bits})"
    )]
    InvalidLayout {
        bits_per_element: u32,
        trailing_clear_bits: u32,
        max_bits: u32,
    },

    /// The value has bits outside the span a compressed array stores.
    #[error("value {value:#x} is not representable in this compressed layout")]
    ValueNotRepresentable { value: i64 },

    /// A compressed byte stream is truncated or its header is inconsistent.
    #[error("decode error: {0}")]
    Decode(String),

    // =========================================================================
    // Capacity errors
    // =========================================================================
    /// Growth would exceed the maximum element count.
    #[error("capacity overflow: {requested} elements requested, limit is {max}")]
    CapacityOverflow { requested: usize, max: usize },
}

impl Error {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }
}
