//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key size
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Invalid IV size
    #[error("Invalid IV size: expected {expected}, got {actual}")]
    InvalidIvSize {
        /// Expected IV size in bytes
        expected: usize,
        /// Actual IV size in bytes
        actual: usize,
    },

    /// Invalid key format
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Key store backend failure
    #[error("Key store unavailable: {0}")]
    StoreUnavailable(String),

    /// I/O error while loading a key file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
