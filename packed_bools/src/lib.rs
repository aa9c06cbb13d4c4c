//! # packed_bools
//!
//! A `no_std` compatible vector of `bool` that stores one element per bit,
//! built on the allocator contract of [`raw_vector`].
//!
//! ```rust
//! use packed_bools::BoolVector;
//!
//! let mut flags = BoolVector::new();
//! flags.push(true).unwrap();
//! flags.push(false).unwrap();
//! flags.insert(1, true).unwrap();
//!
//! assert_eq!(flags, [true, true, false]);
//! assert_eq!(flags.as_raw_bytes(), &[0b011]);
//! ```
//!
//! ## Proxy references
//!
//! A single bit cannot be borrowed as `&mut bool`; [`BitRef`] plays that
//! role and [`BitCursor`] acts as a movable pointer into the bits.
//!
//! ```rust
//! use packed_bools::BoolVector;
//!
//! let mut v = BoolVector::from_elem(20, false).unwrap();
//! let c = v.begin() + 13;
//! c.write(true);
//! assert_eq!(v.as_raw_bytes()[1], 0b0010_0000);
//! ```
//!
//! ## Memory savings
//!
//! ```rust
//! use packed_bools::BoolVector;
//!
//! // Vec<bool>: 1000 elements × 1 byte = 1000 bytes
//! // BoolVector: 1000 elements × 1 bit = 125 bytes
//! let v: BoolVector = (0..1000).map(|i| i % 2 == 0).collect();
//! assert_eq!(v.as_raw_bytes().len(), 125);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bit_ops;
pub mod bit_ref;
pub mod container;
pub mod error;
pub mod iter;

pub use bit_ops::BITS_PER_BYTE;
pub use bit_ref::{BitCursor, BitRef};
pub use container::BoolVector;
pub use error::BitVectorError;
pub use iter::Bits;

/// Builds a [`BoolVector`] on the global heap.
///
/// ```
/// use packed_bools::bits;
///
/// let v = bits![true, false, true];
/// assert_eq!(v.len(), 3);
/// let ones = bits![true; 12];
/// assert_eq!(ones.count_ones(), 12);
/// ```
#[macro_export]
macro_rules! bits {
    () => {
        $crate::BoolVector::new()
    };
    ($bit:expr; $n:expr) => {
        match $crate::BoolVector::from_elem($n, $bit) {
            Ok(v) => v,
            Err(err) => panic!("bits! failed: {}", err),
        }
    };
    ($($bit:expr),+ $(,)?) => {
        <$crate::BoolVector as ::core::iter::FromIterator<bool>>::from_iter([$($bit),+])
    };
}
