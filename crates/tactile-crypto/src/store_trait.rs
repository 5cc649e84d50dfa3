//! Trait-based abstraction for TACT key lookup
//!
//! Decoders only ever ask "do you have the key named X". Anything that can
//! answer that, an in-memory store, a keyring, a remote service, can back
//! BLTE decryption by implementing [`TactKeyProvider`].

use std::sync::Arc;

use crate::error::CryptoError;
use crate::keys::TactKeyStore;

/// Read access to TACT encryption keys
pub trait TactKeyProvider {
    /// Look up a key by its 64-bit name
    ///
    /// `Ok(None)` means the key is unknown; errors are reserved for backend
    /// failures.
    fn get_key(&self, id: u64) -> Result<Option<[u8; 16]>, CryptoError>;

    /// Number of keys available
    fn key_count(&self) -> Result<usize, CryptoError>;

    /// Whether a key with this name is available
    fn contains_key(&self, id: u64) -> Result<bool, CryptoError> {
        Ok(self.get_key(id)?.is_some())
    }
}

impl TactKeyProvider for TactKeyStore {
    fn get_key(&self, id: u64) -> Result<Option<[u8; 16]>, CryptoError> {
        Ok(self.get(id).copied())
    }

    fn key_count(&self) -> Result<usize, CryptoError> {
        Ok(self.len())
    }
}

impl<T: TactKeyProvider + ?Sized> TactKeyProvider for &T {
    fn get_key(&self, id: u64) -> Result<Option<[u8; 16]>, CryptoError> {
        (**self).get_key(id)
    }

    fn key_count(&self) -> Result<usize, CryptoError> {
        (**self).key_count()
    }
}

impl<T: TactKeyProvider + ?Sized> TactKeyProvider for Arc<T> {
    fn get_key(&self, id: u64) -> Result<Option<[u8; 16]>, CryptoError> {
        (**self).get_key(id)
    }

    fn key_count(&self) -> Result<usize, CryptoError> {
        (**self).key_count()
    }
}
