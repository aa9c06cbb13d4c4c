use raw_vector::VectorError;
#[cfg(feature = "std")]
use thiserror::Error;

#[cfg_attr(feature = "std", derive(Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitVectorError {
    #[cfg_attr(
        feature = "std",
        error("Bit index {index} is out of bounds for length {len}")
    )]
    BitOutOfRange { index: usize, len: usize },

    #[cfg_attr(feature = "std", error("storage error: {0}"))]
    Storage(#[cfg_attr(feature = "std", from)] VectorError),
}

#[cfg(not(feature = "std"))]
impl core::fmt::Display for BitVectorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BitVectorError::BitOutOfRange { index, len } => {
                write!(f, "Bit index {} is out of bounds for length {}", index, len)
            }
            BitVectorError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

#[cfg(not(feature = "std"))]
impl From<VectorError> for BitVectorError {
    fn from(err: VectorError) -> Self {
        BitVectorError::Storage(err)
    }
}
