//! Encrypted chunk envelope

use super::error::{BlteError, BlteResult};
use crate::util;

/// Required key name length
pub const KEY_NAME_SIZE: u8 = 8;

/// Required IV length
pub const IV_SIZE: u8 = 4;

/// Encryption type for BLTE chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncryptionType {
    /// `Salsa20` stream cipher
    Salsa20 = b'S',
    /// `ARC4` stream cipher
    Arc4 = b'A',
}

impl EncryptionType {
    /// Parse from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(Self::Salsa20),
            b'A' => Some(Self::Arc4),
            _ => None,
        }
    }

    /// Get byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Parsed envelope of an `E` chunk
///
/// Layout after the mode byte: key name length, little-endian key name,
/// IV length, IV, encryption type, ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedHeader {
    /// 64-bit key name, looked up in the key store
    pub key_name: u64,
    /// Base IV before the chunk index is mixed in
    pub iv: [u8; 4],
    /// Cipher used for the payload
    pub encryption_type: EncryptionType,
}

impl EncryptedHeader {
    /// Bytes taken by the envelope before the ciphertext
    pub const SIZE: usize = 1 + KEY_NAME_SIZE as usize + 1 + IV_SIZE as usize + 1;

    /// Parse the envelope and return it with the ciphertext that follows
    pub fn parse(payload: &[u8]) -> BlteResult<(Self, &[u8])> {
        let key_name_size = *payload
            .first()
            .ok_or_else(|| BlteError::InvalidEncryptionHeader("empty payload".to_string()))?;
        if key_name_size != KEY_NAME_SIZE {
            return Err(BlteError::InvalidEncryptionHeader(format!(
                "key name size {key_name_size}, expected {KEY_NAME_SIZE}"
            )));
        }

        let too_short = || {
            BlteError::InvalidEncryptionHeader(format!(
                "envelope needs {} bytes, have {}",
                Self::SIZE,
                payload.len()
            ))
        };

        let key_name = util::read_u64_le(payload, 1).ok_or_else(too_short)?;

        let iv_size = *payload.get(9).ok_or_else(too_short)?;
        if iv_size != IV_SIZE {
            return Err(BlteError::InvalidEncryptionHeader(format!(
                "IV size {iv_size}, expected {IV_SIZE}"
            )));
        }
        let iv: [u8; 4] = util::array(payload, 10).ok_or_else(too_short)?;

        let type_byte = *payload.get(14).ok_or_else(too_short)?;
        let encryption_type = EncryptionType::from_byte(type_byte).ok_or_else(|| {
            BlteError::InvalidEncryptionHeader(format!("unknown encryption type 0x{type_byte:02X}"))
        })?;

        Ok((
            Self {
                key_name,
                iv,
                encryption_type,
            },
            &payload[Self::SIZE..],
        ))
    }
}
