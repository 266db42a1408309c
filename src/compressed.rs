//! Bit-packed read-mostly arrays of `i32` / `i64`.
//!
//! Values sharing leading and trailing zero bits are stored using only the
//! bits in between. The encoded form doubles as the in-memory representation:
//!
//! ```text
//! byte 0      bits_per_element (w)
//! byte 1      trailing_clear_bits (t)
//! byte 2..    payload; element i occupies stream bits [i*w, (i+1)*w),
//!             counted from the most significant bit of byte 2
//! ```
//!
//! Element `i` is reconstructed as `packed << t` reinterpreted in the
//! element type. The total length is `2 + ceil(len * w / 8)` and padding bits
//! are zero. Bytes written for `i32` can be read as `i64` (values come back
//! as the unsigned 32-bit pattern) and bytes written for `i64` can be read as
//! `i32` when `w + t <= 32`.

use std::fmt;
use std::marker::PhantomData;

use crate::constants::MAX_ARRAY_LEN;
use crate::error::{Error, Result};

const HEADER_LEN: usize = 2;

// =============================================================================
// Element types
// =============================================================================

mod private {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}

/// Element types a [`CompressedArray`] can hold.
pub trait PackedElement: private::Sealed + Copy + fmt::Debug {
    /// Width of the element type in bits.
    const BITS: u32;

    /// Raw bit pattern, zero-extended to 64 bits.
    fn to_bits(self) -> u64;

    /// Inverse of [`to_bits`](Self::to_bits); higher bits are truncated.
    fn from_bits(bits: u64) -> Self;

    fn widen(self) -> i64;
}

impl PackedElement for i32 {
    const BITS: u32 = 32;

    #[inline]
    fn to_bits(self) -> u64 {
        self as u32 as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits as u32 as i32
    }

    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl PackedElement for i64 {
    const BITS: u32 = 64;

    #[inline]
    fn to_bits(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        bits as i64
    }

    #[inline]
    fn widen(self) -> i64 {
        self
    }
}

// =============================================================================
// Layout analysis
// =============================================================================

/// Bits kept per element and the count of always-zero low bits dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub bits_per_element: u32,
    pub trailing_clear_bits: u32,
}

impl Layout {
    /// Narrowest layout that represents every value exactly.
    ///
    /// All-zero or empty input gets one bit per element and no trailing
    /// clear bits.
    pub fn of<T: PackedElement>(values: &[T]) -> Layout {
        let or = values.iter().fold(0u64, |acc, v| acc | v.to_bits());
        if or == 0 {
            return Layout {
                bits_per_element: 1,
                trailing_clear_bits: 0,
            };
        }
        let leading = or.leading_zeros() - (64 - T::BITS);
        let trailing = or.trailing_zeros();
        Layout {
            bits_per_element: T::BITS - leading - trailing,
            trailing_clear_bits: trailing,
        }
    }

    fn validate(self, max_bits: u32) -> Result<Layout> {
        let w = self.bits_per_element;
        let t = self.trailing_clear_bits;
        if w == 0 || w.saturating_add(t) > max_bits {
            return Err(Error::InvalidLayout {
                bits_per_element: w,
                trailing_clear_bits: t,
                max_bits,
            });
        }
        Ok(self)
    }

    /// Bits of the element type a value may have set.
    #[inline]
    fn span_mask(self) -> u64 {
        let ones = if self.bits_per_element >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bits_per_element) - 1
        };
        ones << self.trailing_clear_bits
    }
}

fn payload_len(len: usize, bits_per_element: u32) -> Result<usize> {
    if len > MAX_ARRAY_LEN {
        return Err(Error::CapacityOverflow {
            requested: len,
            max: MAX_ARRAY_LEN,
        });
    }
    len.checked_mul(bits_per_element as usize)
        .map(|bits| bits.div_ceil(8))
        .ok_or(Error::CapacityOverflow {
            requested: len,
            max: MAX_ARRAY_LEN,
        })
}

// =============================================================================
// Bit packing
// =============================================================================

/// Writes the low `width` bits of `value` at stream bit `pos`, MSB first.
/// Bits outside the target span are left unchanged.
fn write_bits(payload: &mut [u8], mut pos: usize, width: u32, value: u64) {
    let mut remaining = width;
    while remaining > 0 {
        let byte = pos / 8;
        let room = 8 - (pos % 8) as u32;
        let take = room.min(remaining);
        let shift = room - take;
        let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
        let mask = (((1u16 << take) - 1) as u8) << shift;
        payload[byte] = (payload[byte] & !mask) | (chunk << shift);
        remaining -= take;
        pos += take as usize;
    }
}

/// Reads `width` bits starting at stream bit `pos`, MSB first.
fn read_bits(payload: &[u8], mut pos: usize, width: u32) -> u64 {
    let mut value = 0u64;
    let mut remaining = width;
    while remaining > 0 {
        let byte = pos / 8;
        let room = 8 - (pos % 8) as u32;
        let take = room.min(remaining);
        let shift = room - take;
        let chunk = (payload[byte] >> shift) & (((1u16 << take) - 1) as u8);
        value = (value << take) | u64::from(chunk);
        remaining -= take;
        pos += take as usize;
    }
    value
}

// =============================================================================
// CompressedArray
// =============================================================================

/// Fixed-length bit-packed array.
///
/// ```rust
/// use heapgraph_collect::ArrayIntCompressed;
///
/// let a = ArrayIntCompressed::from_slice(&[0, 4, 8, 12, 16]);
/// assert_eq!(a.layout().bits_per_element, 3);
/// assert_eq!(a.layout().trailing_clear_bits, 2);
/// assert_eq!(a.as_bytes().len(), 4);
///
/// let b = ArrayIntCompressed::from_bytes(a.as_bytes()).unwrap();
/// assert_eq!(b.get(3), Ok(12));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CompressedArray<T> {
    // Header plus payload, exactly as serialized.
    bytes: Vec<u8>,
    len: usize,
    layout: Layout,
    _element: PhantomData<T>,
}

/// Bit-packed `i32` array.
pub type ArrayIntCompressed = CompressedArray<i32>;

/// Bit-packed `i64` array.
pub type ArrayLongCompressed = CompressedArray<i64>;

impl<T: PackedElement> CompressedArray<T> {
    /// Packs `values` with the narrowest layout that holds all of them.
    ///
    /// # Panics
    ///
    /// Panics if `values` holds more than
    /// [`MAX_ARRAY_LEN`](crate::constants::MAX_ARRAY_LEN) elements.
    pub fn from_slice(values: &[T]) -> Self {
        let layout = Layout::of(values);
        let mut array = match Self::allocate(values.len(), layout) {
            Ok(array) => array,
            Err(e) => panic!("{e}"),
        };
        let w = layout.bits_per_element;
        let t = layout.trailing_clear_bits;
        let payload = &mut array.bytes[HEADER_LEN..];
        for (i, v) in values.iter().enumerate() {
            write_bits(payload, i * w as usize, w, v.to_bits() >> t);
        }
        array
    }

    /// Zero-filled array of `len` elements with an explicit layout.
    pub fn with_layout(
        len: usize,
        bits_per_element: u32,
        trailing_clear_bits: u32,
    ) -> Result<Self> {
        let layout = Layout {
            bits_per_element,
            trailing_clear_bits,
        }
        .validate(T::BITS)?;
        Self::allocate(len, layout)
    }

    /// Zero-filled array of `len` elements whose values never set the top
    /// `leading_clear_bits` or bottom `trailing_clear_bits` bits.
    pub fn with_clear_bits(
        len: usize,
        leading_clear_bits: u32,
        trailing_clear_bits: u32,
    ) -> Result<Self> {
        let bits_per_element =
            T::BITS.saturating_sub(leading_clear_bits.saturating_add(trailing_clear_bits));
        Self::with_layout(len, bits_per_element, trailing_clear_bits)
    }

    /// Decodes an encoded array; the element count is the number of whole
    /// elements the payload holds.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let layout = Self::decode_header(bytes)?;
        let payload_bits = (bytes.len() - HEADER_LEN) * 8;
        let len = payload_bits / layout.bits_per_element as usize;
        Ok(Self {
            bytes: bytes.to_vec(),
            len,
            layout,
            _element: PhantomData,
        })
    }

    /// Decodes an encoded array of exactly `len` elements.
    pub fn from_bytes_with_len(bytes: &[u8], len: usize) -> Result<Self> {
        let layout = Self::decode_header(bytes)?;
        let expected = HEADER_LEN + payload_len(len, layout.bits_per_element)?;
        if bytes.len() != expected {
            return Err(Error::decode(format!(
                "{} bytes cannot hold {len} elements of {} bits (expected {expected})",
                bytes.len(),
                layout.bits_per_element
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            len,
            layout,
            _element: PhantomData,
        })
    }

    fn decode_header(bytes: &[u8]) -> Result<Layout> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::decode(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Layout {
            bits_per_element: u32::from(bytes[0]),
            trailing_clear_bits: u32::from(bytes[1]),
        }
        .validate(T::BITS)
        .map_err(|e| Error::decode(e.to_string()))
    }

    fn allocate(len: usize, layout: Layout) -> Result<Self> {
        let mut bytes = vec![0u8; HEADER_LEN + payload_len(len, layout.bits_per_element)?];
        // Both fit a byte: w <= 64 and t < 64.
        bytes[0] = layout.bits_per_element as u8;
        bytes[1] = layout.trailing_clear_bits as u8;
        Ok(Self {
            bytes,
            len,
            layout,
            _element: PhantomData,
        })
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    #[inline]
    fn load(&self, index: usize) -> T {
        let w = self.layout.bits_per_element;
        let packed = read_bits(&self.bytes[HEADER_LEN..], index * w as usize, w);
        T::from_bits(packed << self.layout.trailing_clear_bits)
    }

    pub fn get(&self, index: usize) -> Result<T> {
        self.check_index(index)?;
        Ok(self.load(index))
    }

    /// Overwrites element `index`, touching only the bits it owns.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index)?;
        let bits = value.to_bits();
        if bits & !self.layout.span_mask() != 0 {
            return Err(Error::ValueNotRepresentable {
                value: value.widen(),
            });
        }
        let w = self.layout.bits_per_element;
        write_bits(
            &mut self.bytes[HEADER_LEN..],
            index * w as usize,
            w,
            bits >> self.layout.trailing_clear_bits,
        );
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Encoded form: header followed by the payload.
    pub fn to_byte_array(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.load(i))
    }
}

impl<T: PackedElement> fmt::Debug for CompressedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
