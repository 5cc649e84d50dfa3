//! Index footer and the layout derived from it

use std::io::Cursor;

use binrw::BinRead;

use crate::archive::{ArchiveError, ArchiveResult};
use crate::util;

/// Size of the footer in bytes
pub const FOOTER_SIZE: usize = 28;

/// Offset width that marks a group index (2-byte archive + 4-byte offset)
pub const GROUP_OFFSET_BYTES: u8 = 6;

/// Trailing 28 bytes of every `.index` file
///
/// Everything is a single byte except the element count, which is
/// little-endian unlike the rest of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct IndexFooter {
    /// First 8 bytes of MD5 over the TOC keys and block hashes
    pub toc_hash: [u8; 8],
    /// Format version (1)
    pub version: u8,
    /// Two reserved flag bytes
    pub flags: [u8; 2],
    /// Block size in kilobytes
    pub block_size_kb: u8,
    /// Width of the offset field (4 or 5 direct, 6 group)
    pub offset_bytes: u8,
    /// Width of the size field
    pub size_bytes: u8,
    /// Width of the stored key prefix
    pub key_bytes: u8,
    /// Width of block and footer hashes
    pub hash_bytes: u8,
    /// Number of entries in the index
    pub element_count: u32,
    /// First 8 bytes of MD5 over the footer with this field zeroed
    pub footer_hash: [u8; 8],
}

/// How an index encodes entry locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Offsets point into the archive the index belongs to
    Archive,
    /// Offsets carry a 2-byte archive ordinal and a 4-byte offset
    Group,
}

/// Byte layout computed from a footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout {
    /// Block size in bytes
    pub block_size: usize,
    /// Width of one entry
    pub entry_width: usize,
    /// Entries that fit in one block
    pub entries_per_block: usize,
    /// Number of blocks
    pub block_count: usize,
    /// Entries in the final block
    pub entries_in_last_block: usize,
    /// Offset of the TOC keys
    pub toc_offset: usize,
    /// Offset of the block hashes following the TOC keys
    pub block_hashes_offset: usize,
    /// Minimum file size for this layout
    pub required_size: usize,
}

impl IndexFooter {
    /// Footer of a group index with `element_count` entries
    pub fn group(toc_hash: [u8; 8], element_count: u32) -> Self {
        let mut footer = Self {
            toc_hash,
            version: 1,
            flags: [0, 0],
            block_size_kb: 4,
            offset_bytes: GROUP_OFFSET_BYTES,
            size_bytes: 4,
            key_bytes: 16,
            hash_bytes: 8,
            element_count,
            footer_hash: [0; 8],
        };
        footer.footer_hash = footer.calculate_footer_hash();
        footer
    }

    /// Read the footer from the last 28 bytes of `data`
    pub fn from_file_bytes(data: &[u8]) -> ArchiveResult<Self> {
        let start = data
            .len()
            .checked_sub(FOOTER_SIZE)
            .ok_or(ArchiveError::Truncated {
                needed: FOOTER_SIZE as u64,
                available: data.len() as u64,
            })?;
        let footer = Self::read(&mut Cursor::new(&data[start..]))?;
        Ok(footer)
    }

    /// Serialize to the on-disk 28 bytes
    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut out = [0u8; FOOTER_SIZE];
        out[..8].copy_from_slice(&self.toc_hash);
        out[8] = self.version;
        out[9..11].copy_from_slice(&self.flags);
        out[11] = self.block_size_kb;
        out[12] = self.offset_bytes;
        out[13] = self.size_bytes;
        out[14] = self.key_bytes;
        out[15] = self.hash_bytes;
        out[16..20].copy_from_slice(&self.element_count.to_le_bytes());
        out[20..].copy_from_slice(&self.footer_hash);
        out
    }

    /// MD5 prefix over version..element_count followed by 8 zero bytes
    pub fn calculate_footer_hash(&self) -> [u8; 8] {
        let bytes = self.to_bytes();
        let mut hashed = [0u8; 20];
        hashed[..12].copy_from_slice(&bytes[8..20]);
        util::md5_prefix(&hashed)
    }

    /// Check the stored footer hash
    pub fn verify(&self) -> ArchiveResult<()> {
        let expected = self.calculate_footer_hash();
        if expected != self.footer_hash {
            return Err(ArchiveError::ChecksumMismatch {
                expected,
                actual: self.footer_hash,
            });
        }
        Ok(())
    }

    /// Reject field widths the reader cannot decode
    pub fn validate_format(&self) -> ArchiveResult<()> {
        if self.hash_bytes != 8 {
            return Err(ArchiveError::invalid_footer(format!(
                "hash width {} (expected 8)",
                self.hash_bytes
            )));
        }
        if !(1..=16).contains(&self.key_bytes) {
            return Err(ArchiveError::invalid_footer(format!(
                "key width {}",
                self.key_bytes
            )));
        }
        if !(1..=8).contains(&self.size_bytes) {
            return Err(ArchiveError::invalid_footer(format!(
                "size width {}",
                self.size_bytes
            )));
        }
        if !matches!(self.offset_bytes, 0 | 4 | 5 | GROUP_OFFSET_BYTES) {
            return Err(ArchiveError::invalid_footer(format!(
                "offset width {}",
                self.offset_bytes
            )));
        }
        if self.block_size_kb == 0 {
            return Err(ArchiveError::invalid_footer("block size 0"));
        }
        Ok(())
    }

    /// Kind of index, decided by the offset width alone
    pub fn kind(&self) -> IndexKind {
        if self.offset_bytes == GROUP_OFFSET_BYTES {
            IndexKind::Group
        } else {
            IndexKind::Archive
        }
    }

    /// Compute the block, TOC and hash layout
    ///
    /// Assumes [`validate_format`](Self::validate_format) passed.
    pub fn layout(&self) -> IndexLayout {
        let block_size = usize::from(self.block_size_kb) << 10;
        let key = usize::from(self.key_bytes);
        let entry_width = key + usize::from(self.size_bytes) + usize::from(self.offset_bytes);
        let entries_per_block = block_size / entry_width;
        let count = self.element_count as usize;
        let block_count = count.div_ceil(entries_per_block);
        let entries_in_last_block = count - block_count.saturating_sub(1) * entries_per_block;

        let toc_offset = block_count * block_size;
        let block_hashes_offset = toc_offset + block_count * key;
        let required_size =
            block_hashes_offset + block_count * usize::from(self.hash_bytes) + FOOTER_SIZE;

        IndexLayout {
            block_size,
            entry_width,
            entries_per_block,
            block_count,
            entries_in_last_block,
            toc_offset,
            block_hashes_offset,
            required_size,
        }
    }
}

impl IndexLayout {
    /// Entries stored in block `block`
    pub fn entries_in_block(&self, block: usize) -> usize {
        if block + 1 == self.block_count {
            self.entries_in_last_block
        } else {
            self.entries_per_block
        }
    }
}
