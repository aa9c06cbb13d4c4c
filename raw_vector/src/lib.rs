#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allocator;
pub mod container;
pub mod error;
pub mod holder;
pub mod iter;
#[doc(hidden)]
pub mod storage;

pub use allocator::{Global, Propagation, SlotAllocator};
pub use container::Vector;
pub use error::{CleanupError, VectorError};
pub use holder::AllocHolder;
pub use iter::IntoIter;
pub use storage::{GROWTH_FACTOR, INITIAL_CAPACITY};

/// Builds a [`Vector`] on the global heap, like `vec!`.
///
/// Panics if the allocation fails.
///
/// ```
/// use raw_vector::vector;
///
/// let v = vector![1, 2, 3];
/// assert_eq!(v, [1, 2, 3]);
///
/// let zeros = vector![0u8; 6];
/// assert_eq!(zeros.len(), 6);
/// assert_eq!(zeros.capacity(), 8);
///
/// let empty: raw_vector::Vector<u8> = vector![];
/// assert_eq!(empty.capacity(), 4);
/// ```
#[macro_export]
macro_rules! vector {
    () => {
        $crate::Vector::new()
    };
    ($elem:expr; $n:expr) => {
        <$crate::Vector<_> as ::core::iter::FromIterator<_>>::from_iter(
            ::core::iter::repeat($elem).take($n),
        )
    };
    ($($x:expr),+ $(,)?) => {
        <$crate::Vector<_> as ::core::iter::FromIterator<_>>::from_iter([$($x),+])
    };
}
