//! Cryptographic building blocks for TACT content resolution
//!
//! # Components
//!
//! - **Keys**: [`ContentKey`] and [`EncodingKey`], the two MD5-derived
//!   identifiers every lookup structure is keyed by, plus [`FileDataId`]
//! - **Hashing**: Jenkins lookup3 for root manifest name hashes
//! - **Encryption**: the Salsa20 variant used by encrypted BLTE chunks
//! - **Key management**: [`TactKeyStore`] and the [`TactKeyProvider`] seam
//!   decoders use to find decryption keys
//!
//! # Examples
//!
//! ```
//! use tactile_crypto::{ContentKey, TactKey, TactKeyProvider, TactKeyStore};
//!
//! let ckey = ContentKey::from_data(b"Hello, World!");
//! assert_eq!(ckey.to_hex(), "65a8e27d8879283831b664bd8b7f0ad4");
//!
//! let mut keys = TactKeyStore::new();
//! keys.add(TactKey::new(0xFA50_5078_126A_CB3E, [0u8; 16]));
//! assert!(keys.contains_key(0xFA50_5078_126A_CB3E).unwrap());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod jenkins;
pub mod keys;
pub mod md5;
pub mod salsa20;
pub mod store_trait;

pub use error::CryptoError;

pub use jenkins::{Jenkins96, hashlittle, hashlittle2, name_hash};
pub use keys::{TactKey, TactKeyStore};
pub use md5::{ContentKey, EncodingKey, FileDataId, md5_digest};
pub use salsa20::Salsa20Cipher;
pub use store_trait::TactKeyProvider;
