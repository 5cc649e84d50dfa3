//! Error types for root file parsing

use thiserror::Error;

/// Result type for root file operations
pub type RootResult<T> = Result<T, RootError>;

/// Errors that can occur when parsing root files
#[derive(Error, Debug)]
pub enum RootError {
    /// Header size points outside the file
    #[error("Invalid root header: {0}")]
    InvalidHeader(String),

    /// Block runs past the end of the file
    #[error("Truncated root block at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        /// Start of the block
        offset: usize,
        /// Bytes the block needs
        needed: usize,
        /// Bytes left in the file
        available: usize,
    },

    /// `FileDataID` delta sequence leaves the u32 range
    #[error("FileDataID overflow: {previous} + 1 + {delta}")]
    DeltaOverflow {
        /// Previous ID in the block, if any
        previous: i64,
        /// Offending delta
        delta: i32,
    },

    /// Records read disagree with the header counts
    #[error("Root {field} count mismatch: header says {expected}, read {actual}")]
    CountMismatch {
        /// `total` or `named`
        field: &'static str,
        /// Count from the header
        expected: u32,
        /// Records actually read
        actual: u64,
    },

    /// Locale code not recognized
    #[error("Unknown locale: {0}")]
    UnknownLocale(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outer BLTE container could not be decoded
    #[error("BLTE decompression error: {0}")]
    Blte(#[from] crate::blte::BlteError),
}
