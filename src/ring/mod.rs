//! Ringcast broadcast ring
//!
//! This module provides the synchronization core of a live-data distribution
//! engine: a fixed array of `2^e` slots shared between one producer handle and
//! any number of independent reader handles. The producer never blocks; slow
//! readers are lapped instead of applying backpressure, and a supervisor can
//! forcibly release every waiting reader through the disposal protocol.

pub mod gate;
pub mod publisher;
pub mod reader;

pub(crate) mod core;
pub(crate) mod slot;


pub use gate::ReadyGate;
pub use publisher::{Disposer, Publisher};
pub use reader::Reader;

/// Largest accepted size exponent (2^24 slots). A live retention window past
/// sixteen million records is a configuration mistake, not a workload.
pub const MAX_SIZE_EXPONENT: u32 = 24;

/// Errors that can occur in the broadcast ring
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error(
        "size exponent must be between 1 and {max}, got: {0}",
        max = MAX_SIZE_EXPONENT
    )]
    InvalidSizeExponent(u32),
}

pub type Result<T> = std::result::Result<T, RingError>;

/// Validate a size exponent and return the slot count it denotes.
///
/// The ring is always sized as a power of two so that cursor arithmetic is a
/// bit-mask instead of a division.
///
/// # Errors
/// Returns `RingError::InvalidSizeExponent` if `exponent` is zero or larger
/// than [`MAX_SIZE_EXPONENT`].
pub fn slot_count(exponent: u32) -> Result<usize> {
    if exponent == 0 || exponent > MAX_SIZE_EXPONENT {
        return Err(RingError::InvalidSizeExponent(exponent));
    }
    Ok(1usize << exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_count() {
        assert_eq!(slot_count(1).unwrap(), 2);
        assert_eq!(slot_count(2).unwrap(), 4);
        assert_eq!(slot_count(10).unwrap(), 1024);
        assert_eq!(slot_count(MAX_SIZE_EXPONENT).unwrap(), 1 << 24);
    }

    #[test]
    fn test_slot_count_rejects_invalid_exponents() {
        assert!(matches!(
            slot_count(0),
            Err(RingError::InvalidSizeExponent(0))
        ));
        assert!(matches!(
            slot_count(MAX_SIZE_EXPONENT + 1),
            Err(RingError::InvalidSizeExponent(25))
        ));
        assert!(matches!(
            slot_count(u32::MAX),
            Err(RingError::InvalidSizeExponent(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = RingError::InvalidSizeExponent(0);
        assert_eq!(
            err.to_string(),
            "size exponent must be between 1 and 24, got: 0"
        );
    }
}
