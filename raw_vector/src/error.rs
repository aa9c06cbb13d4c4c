#[cfg(feature = "std")]
use thiserror::Error;

/// Vector errors
#[cfg_attr(feature = "std", derive(Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// Checked access past the end
    #[cfg_attr(feature = "std", error("Index {index} out of range for length {len}"))]
    OutOfRange { index: usize, len: usize },

    /// The allocator could not provide the requested slots
    #[cfg_attr(
        feature = "std",
        error("Failed to allocate {count} slots of {elem_size} bytes")
    )]
    AllocFailed { count: usize, elem_size: usize },

    /// Requested capacity does not fit in the address space
    #[cfg_attr(feature = "std", error("Capacity overflow"))]
    CapacityOverflow,

    /// Reversed range or range past the end
    #[cfg_attr(
        feature = "std",
        error("Range {start}..{end} is invalid for length {len}")
    )]
    InvalidRange { start: usize, end: usize, len: usize },
}

#[cfg(not(feature = "std"))]
impl core::fmt::Display for VectorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VectorError::OutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            VectorError::AllocFailed { count, elem_size } => {
                write!(f, "Failed to allocate {} slots of {} bytes", count, elem_size)
            }
            VectorError::CapacityOverflow => write!(f, "Capacity overflow"),
            VectorError::InvalidRange { start, end, len } => {
                write!(f, "Range {}..{} is invalid for length {}", start, end, len)
            }
        }
    }
}

/// Failure reported by `deallocate` or `destroy`.
///
/// The engines never act on it: cleanup runs best-effort and the value is
/// dropped on the spot.
#[cfg_attr(feature = "std", derive(Error))]
#[cfg_attr(feature = "std", error("cleanup failed"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupError;

#[cfg(not(feature = "std"))]
impl core::fmt::Display for CleanupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cleanup failed")
    }
}
