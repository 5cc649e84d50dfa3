//! Error types for archive index operations

use thiserror::Error;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for archive index reading and group index building
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Footer fields describe a layout the reader cannot handle
    #[error("Invalid index footer: {reason}")]
    InvalidFooter {
        /// Detailed description of the invalid field
        reason: String,
    },

    /// File is smaller than the layout its footer declares
    #[error("Truncated index: need {needed} bytes, file has {available}")]
    Truncated {
        /// Bytes required by the footer layout
        needed: u64,
        /// Bytes present
        available: u64,
    },

    /// Footer hash does not match footer contents
    #[error("Footer checksum mismatch: expected {expected:02x?}, got {actual:02x?}")]
    ChecksumMismatch {
        /// Hash computed from the footer fields
        expected: [u8; 8],
        /// Hash stored in the footer
        actual: [u8; 8],
    },

    /// Built group index does not hash to the expected name
    #[error("Group index integrity mismatch: expected {expected}, built {actual}")]
    IntegrityMismatch {
        /// Name the caller expected
        expected: String,
        /// Name derived from the built footer
        actual: String,
    },

    /// Value does not fit the fixed-width field of a group index entry
    #[error("{field} value {value} does not fit in a group index entry")]
    FieldOverflow {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u64,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary format parsing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl ArchiveError {
    pub(crate) fn invalid_footer(reason: impl Into<String>) -> Self {
        Self::InvalidFooter {
            reason: reason.into(),
        }
    }
}
