//! # heapgraph-collect
//!
//! Primitive-keyed containers for analysing large object graphs, where boxing
//! every id into a general-purpose collection costs more memory than the graph
//! itself.
//!
//! - [`ArrayInt`] / [`ArrayLong`]: growable vectors of `i32` / `i64`.
//! - [`QueueInt`]: a growable FIFO ring of `i32`.
//! - [`SetInt`] / [`SetLong`]: open-addressing hash sets.
//! - [`HashMapIntLong`], [`HashMapIntObject`], [`HashMapLongObject`],
//!   [`HashMapObjectLong`]: open-addressing hash maps with a primitive on at
//!   least one side.
//! - [`ArrayIntCompressed`] / [`ArrayLongCompressed`]: fixed-length bit-packed
//!   arrays with a two-byte layout header.
//! - [`ConcurrentBitField`]: a fixed-length bit vector safe to mutate from
//!   many threads.
//! - [`sort`]: paired-array sorting (keys permute a parallel value array).
//!
//! The hash containers share one probing scheme: capacities are prime, the
//! probe step is a smaller prime, and tables rehash once three quarters full.
//!
//! ## Example
//!
//! ```rust
//! use heapgraph_collect::{ArrayIntCompressed, HashMapIntLong, SetInt};
//!
//! let mut seen = SetInt::new();
//! assert!(seen.add(42));
//! assert!(!seen.add(42));
//!
//! let mut sizes = HashMapIntLong::new();
//! sizes.put(42, 1 << 20);
//! assert_eq!(sizes.get(42).unwrap(), 1 << 20);
//!
//! let packed = ArrayIntCompressed::from_slice(&[4, 8, 12]);
//! assert_eq!(packed.get(2).unwrap(), 12);
//! ```

mod array;
mod bitfield;
mod compressed;
pub mod constants;
mod error;
mod map;
mod queue;
mod set;
pub mod sort;
mod table;

pub use array::{ArrayInt, ArrayLong};
pub use bitfield::ConcurrentBitField;
pub use compressed::{
    ArrayIntCompressed, ArrayLongCompressed, CompressedArray, Layout, PackedElement,
};
pub use error::{Error, Result};
pub use map::{HashMapIntLong, HashMapIntObject, HashMapLongObject, HashMapObjectLong};
pub use queue::QueueInt;
pub use set::{SetInt, SetLong};

#[cfg(all(test, not(loom)))]
mod proptests;
