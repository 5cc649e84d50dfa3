use std::io::Cursor;
use std::ops::Range;

use binrw::BinRead;

use crate::encoding::error::{EncodingError, EncodingResult};

/// Size of the fixed header
pub const HEADER_SIZE: usize = 22;

/// Size of one page table entry (first key plus page MD5)
pub const PAGE_TABLE_ENTRY_SIZE: usize = 32;

/// Encoding file header (22 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead)]
#[br(big)] // Big-endian for all fields
pub struct EncodingHeader {
    /// Magic bytes: 'EN'
    pub magic: [u8; 2],

    /// Version (1)
    pub version: u8,

    /// Size of content keys
    pub ckey_hash_size: u8,

    /// Size of encoding keys
    pub ekey_hash_size: u8,

    /// Content key page size in KB
    pub ckey_page_size_kb: u16,

    /// Encoding key page size in KB
    pub ekey_page_size_kb: u16,

    /// Number of content key pages
    pub ckey_page_count: u32,

    /// Number of encoding key pages
    pub ekey_page_count: u32,

    /// Flags byte (must be 0)
    pub flags: u8,

    /// Size of the `ESpec` string block following the header
    pub espec_block_size: u32,
}

/// Byte ranges of the sections that follow the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingLayout {
    /// NUL-separated `ESpec` strings
    pub espec: Range<usize>,
    /// Content key page table
    pub ckey_table: Range<usize>,
    /// Content key pages
    pub ckey_pages: Range<usize>,
    /// Encoding key page table
    pub ekey_table: Range<usize>,
    /// Encoding key pages
    pub ekey_pages: Range<usize>,
}

impl EncodingHeader {
    /// Parse and validate the header at the start of `data`
    pub fn parse(data: &[u8]) -> EncodingResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(EncodingError::Truncated {
                needed: HEADER_SIZE as u64,
                available: data.len() as u64,
            });
        }
        let header = Self::read(&mut Cursor::new(&data[..HEADER_SIZE]))?;
        header.validate()?;
        Ok(header)
    }

    /// Validate header fields
    pub fn validate(&self) -> EncodingResult<()> {
        if self.magic != *b"EN" {
            return Err(EncodingError::InvalidMagic(self.magic));
        }

        if self.version != 1 {
            return Err(EncodingError::UnsupportedVersion(self.version));
        }

        if self.flags != 0 {
            return Err(EncodingError::InvalidFlags(self.flags));
        }

        if self.ckey_hash_size != 16 {
            return Err(EncodingError::InvalidKeySize {
                field: "ckey_hash_size",
                value: self.ckey_hash_size,
            });
        }

        if self.ekey_hash_size != 16 {
            return Err(EncodingError::InvalidKeySize {
                field: "ekey_hash_size",
                value: self.ekey_hash_size,
            });
        }

        if self.ckey_page_size_kb == 0 {
            return Err(EncodingError::InvalidPageSize("ckey"));
        }

        if self.ekey_page_size_kb == 0 {
            return Err(EncodingError::InvalidPageSize("ekey"));
        }

        Ok(())
    }

    /// Get content key page size in bytes
    pub fn ckey_page_size(&self) -> usize {
        self.ckey_page_size_kb as usize * 1024
    }

    /// Get encoding key page size in bytes
    pub fn ekey_page_size(&self) -> usize {
        self.ekey_page_size_kb as usize * 1024
    }

    /// Compute section ranges; fails if the file is shorter than the last one
    pub fn layout(&self, file_len: usize) -> EncodingResult<EncodingLayout> {
        let espec = HEADER_SIZE..HEADER_SIZE + self.espec_block_size as usize;

        let ckey_count = self.ckey_page_count as usize;
        let ckey_table = espec.end..espec.end + ckey_count * PAGE_TABLE_ENTRY_SIZE;
        let ckey_pages = ckey_table.end..ckey_table.end + ckey_count * self.ckey_page_size();

        let ekey_count = self.ekey_page_count as usize;
        let ekey_table = ckey_pages.end..ckey_pages.end + ekey_count * PAGE_TABLE_ENTRY_SIZE;
        let ekey_pages = ekey_table.end..ekey_table.end + ekey_count * self.ekey_page_size();

        if file_len < ekey_pages.end {
            return Err(EncodingError::Truncated {
                needed: ekey_pages.end as u64,
                available: file_len as u64,
            });
        }

        Ok(EncodingLayout {
            espec,
            ckey_table,
            ckey_pages,
            ekey_table,
            ekey_pages,
        })
    }
}
