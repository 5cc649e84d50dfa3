//! TACT encryption key management
//!
//! Encrypted BLTE chunks name their key by a 64-bit key name. Key lists are
//! distributed as text, one key per line, either `NAME KEY` separated by
//! whitespace (the `WoW.txt` layout) or `NAME,KEY`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::CryptoError;

/// A TACT encryption key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TactKey {
    /// 64-bit key name
    pub id: u64,
    /// 16-byte Salsa20 key
    pub key: [u8; 16],
}

impl TactKey {
    /// Create a new TACT key
    pub const fn new(id: u64, key: [u8; 16]) -> Self {
        Self { id, key }
    }

    /// Parse the key bytes from hex
    pub fn from_hex(id: u64, hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex.trim())
            .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid hex: {e}")))?;

        let key = <[u8; 16]>::try_from(bytes.as_slice()).map_err(|_| {
            CryptoError::InvalidKeySize {
                expected: 16,
                actual: bytes.len(),
            }
        })?;
        Ok(Self::new(id, key))
    }
}

impl fmt::Display for TactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X} {}", self.id, hex::encode_upper(self.key))
    }
}

/// In-memory key store
#[derive(Debug, Clone, Default)]
pub struct TactKeyStore {
    keys: HashMap<u64, [u8; 16]>,
}

impl TactKeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key by name
    pub fn get(&self, id: u64) -> Option<&[u8; 16]> {
        self.keys.get(&id)
    }

    /// Insert or replace a key
    pub fn add(&mut self, key: TactKey) {
        self.keys.insert(key.id, key.key);
    }

    /// Insert a key unless one with the same name is already present
    ///
    /// Returns `true` when the key was inserted.
    pub fn add_if_absent(&mut self, key: TactKey) -> bool {
        match self.keys.entry(key.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(key.key);
                true
            }
        }
    }

    /// Remove a key
    pub fn remove(&mut self, id: u64) -> Option<[u8; 16]> {
        self.keys.remove(&id)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over all keys
    pub fn iter(&self) -> impl Iterator<Item = TactKey> + '_ {
        self.keys.iter().map(|(&id, &key)| TactKey::new(id, key))
    }

    /// Load keys from text, one `NAME KEY` or `NAME,KEY` pair per line
    ///
    /// Blank lines and lines starting with `#` or `//` are skipped, as are
    /// malformed lines. A name already in the store keeps its first key.
    /// Returns the number of keys added.
    ///
    /// ```
    /// use tactile_crypto::keys::TactKeyStore;
    ///
    /// let mut store = TactKeyStore::new();
    /// let added = store.load_from_str(
    ///     "FA505078126ACB3E BDC51862ABED79B2DE48C8E7E66C6200\n\
    ///      # comment\n\
    ///      0xFF813F7D062AC0BC,AA0B5C77F088CCC2D39049BD267F066D\n",
    /// );
    /// assert_eq!(added, 2);
    /// ```
    pub fn load_from_str(&mut self, content: &str) -> usize {
        let mut added = 0;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            match parse_key_line(line) {
                Ok(key) => {
                    if self.add_if_absent(key) {
                        added += 1;
                    }
                }
                Err(e) => debug!("skipping key line {}: {}", number + 1, e),
            }
        }

        added
    }

    /// Load keys from a text file; see [`TactKeyStore::load_from_str`]
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, CryptoError> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.load_from_str(&content))
    }
}

fn parse_key_line(line: &str) -> Result<TactKey, CryptoError> {
    let parts: Vec<&str> = if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };

    let (Some(name), Some(key)) = (parts.first(), parts.get(1)) else {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected key name and key: {line}"
        )));
    };

    TactKey::from_hex(parse_key_id(name)?, key)
}

/// Parse a key name: `0x`-prefixed hex, bare 16-digit hex, or decimal
fn parse_key_id(s: &str) -> Result<u64, CryptoError> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if s.len() == 16 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        u64::from_str_radix(s, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid key name {s:?}: {e}")))
}
