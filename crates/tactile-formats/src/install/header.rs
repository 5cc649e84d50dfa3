//! Install manifest header

use binrw::BinRead;
use std::io::Cursor;

use crate::install::error::{InstallError, InstallResult};

/// Size of the fixed header
pub const HEADER_SIZE: usize = 10;

/// Install manifest header
///
/// - Magic signature "IN" (2 bytes)
/// - Version number (1 byte, currently 1)
/// - Content key length (1 byte, 16 for MD5)
/// - Tag count (2 bytes, big-endian)
/// - Entry count (4 bytes, big-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(big)] // All multi-byte fields are big-endian
pub struct InstallHeader {
    /// Magic signature, always "IN"
    pub magic: [u8; 2],

    /// Version number, currently 1
    pub version: u8,

    /// Content key length in bytes
    pub ckey_length: u8,

    /// Number of tags in the manifest
    pub tag_count: u16,

    /// Number of file entries in the manifest
    pub entry_count: u32,
}

impl InstallHeader {
    /// Parse and validate the header at the start of `data`
    pub fn parse(data: &[u8]) -> InstallResult<Self> {
        let header = Self::read(&mut Cursor::new(data))?;
        header.validate()?;
        Ok(header)
    }

    /// Bytes in each tag's bit mask, one bit per entry
    pub fn bit_mask_size(&self) -> usize {
        (self.entry_count as usize).div_ceil(8)
    }

    /// Validate the header fields
    pub fn validate(&self) -> InstallResult<()> {
        if self.magic != *b"IN" {
            return Err(InstallError::InvalidMagic(self.magic));
        }

        if self.version != 1 {
            return Err(InstallError::UnsupportedVersion(self.version));
        }

        if self.ckey_length != 16 {
            return Err(InstallError::InvalidCKeyLength(self.ckey_length));
        }

        Ok(())
    }
}
