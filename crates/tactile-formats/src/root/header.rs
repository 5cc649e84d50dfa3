//! Root file header and format detection

use crate::root::error::{RootError, RootResult};
use crate::util;

/// `TSFM` read as a little-endian u32
pub const TSFM_MAGIC: u32 = 0x4D46_5354;

/// Header size of the original `TSFM` layout
pub const LEGACY_TSFM_HEADER_SIZE: usize = 12;

/// Minimum header size of the extended layout
pub const EXTENDED_HEADER_MIN: usize = 20;

/// Upper bound on a plausible extended header size
const EXTENDED_HEADER_MAX: usize = 100;

/// Root file layout family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootFormat {
    /// Headerless layout with interleaved key and name hash
    Legacy,
    /// `TSFM` layout with separate key and hash arrays
    Manifest,
}

/// Detected root header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootHeader {
    /// Layout family
    pub format: RootFormat,
    /// Block flags version; 2 uses the split flag fields
    pub version: u32,
    /// Offset of the first block
    pub body_offset: usize,
    /// Total record count claimed by the header
    pub total_files: Option<u32>,
    /// Named record count claimed by the header
    pub named_files: Option<u32>,
}

impl RootHeader {
    /// Detect the format at the start of `data`
    pub fn detect(data: &[u8]) -> RootResult<Self> {
        if util::read_u32_le(data, 0) != Some(TSFM_MAGIC) {
            return Ok(Self {
                format: RootFormat::Legacy,
                version: 0,
                body_offset: 0,
                total_files: None,
                named_files: None,
            });
        }

        let (Some(a), Some(b)) = (util::read_u32_le(data, 4), util::read_u32_le(data, 8)) else {
            return Err(RootError::InvalidHeader(format!(
                "{} byte file is too short for a TSFM header",
                data.len()
            )));
        };

        // The original layout stores (total, named) in the same two words, so
        // the extended layout is only taken for a plausible header size
        let header_size = a as usize;
        if matches!(b, 1 | 2) && (EXTENDED_HEADER_MIN..EXTENDED_HEADER_MAX).contains(&header_size)
        {
            if header_size > data.len() {
                return Err(RootError::InvalidHeader(format!(
                    "header size {header_size} exceeds {} byte file",
                    data.len()
                )));
            }
            return Ok(Self {
                format: RootFormat::Manifest,
                version: b,
                body_offset: header_size,
                total_files: util::read_u32_le(data, 12),
                named_files: util::read_u32_le(data, 16),
            });
        }

        Ok(Self {
            format: RootFormat::Manifest,
            version: 0,
            body_offset: LEGACY_TSFM_HEADER_SIZE,
            total_files: Some(a),
            named_files: Some(b),
        })
    }

    /// Whether blocks interleave content keys with name hashes
    pub const fn is_interleaved(&self) -> bool {
        matches!(self.format, RootFormat::Legacy)
    }

    /// Size of the per-block flag fields
    pub const fn flags_size(&self) -> usize {
        if self.version >= 2 { 13 } else { 8 }
    }
}
