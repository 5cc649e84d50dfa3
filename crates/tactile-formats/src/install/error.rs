//! Error types for install manifest parsing

use thiserror::Error;

/// Result type for install manifest operations
pub type InstallResult<T> = Result<T, InstallError>;

/// Errors that can occur when parsing install manifests
#[derive(Error, Debug)]
pub enum InstallError {
    /// Invalid magic signature detected
    #[error("Invalid install magic: expected 'IN', got {0:?}")]
    InvalidMagic([u8; 2]),

    /// Unsupported install manifest version
    #[error("Unsupported install version: {0}")]
    UnsupportedVersion(u8),

    /// Invalid content key length
    #[error("Invalid content key length: {0}")]
    InvalidCKeyLength(u8),

    /// Manifest ends inside a tag or entry
    #[error("Truncated install manifest: {what} {index} at offset {offset}")]
    Truncated {
        /// `tag` or `entry`
        what: &'static str,
        /// Index of the record being read
        index: usize,
        /// Offset where reading stopped
        offset: usize,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRW` parsing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Outer BLTE container could not be decoded
    #[error("BLTE decompression error: {0}")]
    Blte(#[from] crate::blte::BlteError),
}
