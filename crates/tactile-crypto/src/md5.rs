//! MD5-derived key types and file identifiers
//!
//! Both key kinds are plain 16-byte MD5 digests. They are kept as separate
//! types so a content key can never be handed to an index lookup by mistake.

use md5::{Digest, Md5};
use std::fmt;
use std::str::FromStr;

/// Compute the MD5 digest of `data`
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

macro_rules! md5_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name([u8; 16]);

        impl $name {
            /// Key length in bytes
            pub const LEN: usize = 16;

            /// Create a key from raw bytes
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Create a key by hashing `data`
            pub fn from_data(data: &[u8]) -> Self {
                Self(md5_digest(data))
            }

            /// Create a key from a slice of exactly 16 bytes
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; 16]>::try_from(bytes).ok().map(Self)
            }

            /// Create a key from a prefix of up to 16 bytes, zero-padding the rest
            ///
            /// Index files may store truncated keys.
            pub fn from_prefix(prefix: &[u8]) -> Option<Self> {
                if prefix.len() > Self::LEN {
                    return None;
                }
                let mut bytes = [0u8; 16];
                bytes[..prefix.len()].copy_from_slice(prefix);
                Some(Self(bytes))
            }

            /// Parse a key from a 32-character hex string
            pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
                let mut bytes = [0u8; 16];
                hex::decode_to_slice(hex.trim(), &mut bytes)?;
                Ok(Self(bytes))
            }

            /// Raw key bytes
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Lowercase hex representation
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
        }
    };
}

md5_key!(
    /// Content key: MD5 of the fully decoded file
    ContentKey
);

md5_key!(
    /// Encoding key: MD5 of the encoded (BLTE) byte stream
    EncodingKey
);

/// Stable numeric file identifier used by the root manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileDataId(pub u32);

impl FileDataId {
    /// Create a new `FileDataId`
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw ID value
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FileDataId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<FileDataId> for u32 {
    fn from(fdid: FileDataId) -> Self {
        fdid.0
    }
}
