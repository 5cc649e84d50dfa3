//! Error types for encoding file operations

use thiserror::Error;

/// Result type for encoding file operations
pub type EncodingResult<T> = Result<T, EncodingError>;

/// Errors that can occur when working with encoding files
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum EncodingError {
    #[error("Invalid magic: expected 'EN', got {0:?}")]
    InvalidMagic([u8; 2]),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid flags: must be 0, got {0}")]
    InvalidFlags(u8),

    #[error("Invalid {field} size: expected 16, got {value}")]
    InvalidKeySize {
        /// Which key size field is invalid
        field: &'static str,
        /// The invalid value
        value: u8,
    },

    #[error("Invalid {0} page size: 0")]
    InvalidPageSize(&'static str),

    #[error("Truncated encoding file: need {needed} bytes, have {available}")]
    Truncated { needed: u64, available: u64 },

    #[error("{table} page {page} checksum mismatch")]
    ChecksumMismatch {
        /// Which page table the page belongs to
        table: &'static str,
        /// Page index
        page: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    #[error("BLTE decompression error: {0}")]
    Blte(#[from] crate::blte::BlteError),
}
