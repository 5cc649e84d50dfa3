//! BLTE error types

use tactile_crypto::CryptoError;
use thiserror::Error;

/// BLTE-specific error type
#[derive(Debug, Error)]
pub enum BlteError {
    /// Invalid BLTE magic bytes
    #[error("invalid BLTE magic: expected [42 4C 54 45], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Invalid header or chunk table
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Input ends before a structure it declares
    #[error("truncated BLTE data: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// Unknown chunk mode byte
    #[error("unknown chunk mode: 0x{0:02X}")]
    UnknownMode(u8),

    /// Chunk produced a different amount of data than declared
    #[error("chunk size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Declared decoded size
        expected: usize,
        /// Size actually produced
        actual: usize,
    },

    /// Single-chunk file whose decoded size cannot be inferred
    #[error("decoded size must be supplied for a single non-raw chunk")]
    UnknownTotalSize,

    /// Decompression failed
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Malformed encrypted chunk envelope
    #[error("invalid encryption header: {0}")]
    InvalidEncryptionHeader(String),

    /// Chunk checksum mismatch
    #[error("checksum mismatch in chunk {chunk}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Chunk index
        chunk: usize,
        /// Expected checksum
        expected: String,
        /// Actual checksum
        actual: String,
    },

    /// Mode or cipher that is recognised but not supported
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Key lookup or cipher failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for BLTE operations
pub type BlteResult<T> = Result<T, BlteError>;

impl BlteError {
    pub(crate) const fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }
}
