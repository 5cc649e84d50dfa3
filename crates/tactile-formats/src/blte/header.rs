//! BLTE header structures and parsing

use std::io::Cursor;

use binrw::BinRead;

use super::error::{BlteError, BlteResult};
use crate::util;

/// BLTE magic bytes
pub const BLTE_MAGIC: [u8; 4] = *b"BLTE";

/// Flags byte of the standard chunk table
pub const STANDARD_TABLE_FLAGS: u8 = 0x0F;

/// Size of one chunk table entry
pub const CHUNK_INFO_SIZE: usize = 24;

/// Magic plus header size field
const PREAMBLE_SIZE: usize = 8;

/// Preamble plus flags byte and 24-bit chunk count
const TABLE_START: usize = PREAMBLE_SIZE + 4;

/// One entry of the chunk table
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct ChunkInfo {
    /// Encoded size including the mode byte
    pub compressed_size: u32,
    /// Size after decoding
    pub decompressed_size: u32,
    /// MD5 of the encoded chunk
    pub checksum: [u8; 16],
}

/// BLTE file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlteHeader {
    /// Header size (0 = single chunk without a table)
    pub header_size: u32,
    /// Chunk table, empty for single-chunk files
    pub chunks: Vec<ChunkInfo>,
}

impl BlteHeader {
    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> BlteResult<Self> {
        let magic: [u8; 4] =
            util::array(data, 0).ok_or_else(|| BlteError::truncated(PREAMBLE_SIZE, data.len()))?;
        if magic != BLTE_MAGIC {
            return Err(BlteError::InvalidMagic(magic));
        }

        let header_size = util::read_u32_be(data, 4)
            .ok_or_else(|| BlteError::truncated(PREAMBLE_SIZE, data.len()))?;

        if header_size == 0 {
            return Ok(Self {
                header_size,
                chunks: Vec::new(),
            });
        }

        let flags = *data
            .get(PREAMBLE_SIZE)
            .ok_or_else(|| BlteError::truncated(TABLE_START, data.len()))?;
        if flags != STANDARD_TABLE_FLAGS {
            return Err(BlteError::InvalidHeader(format!(
                "unexpected chunk table flags 0x{flags:02X}"
            )));
        }

        let chunk_count = util::read_be(data, PREAMBLE_SIZE + 1, 3)
            .ok_or_else(|| BlteError::truncated(TABLE_START, data.len()))?
            as usize;
        if chunk_count == 0 {
            return Err(BlteError::InvalidHeader("chunk table is empty".to_string()));
        }

        let table_end = TABLE_START + chunk_count * CHUNK_INFO_SIZE;
        if (header_size as usize) < table_end {
            return Err(BlteError::InvalidHeader(format!(
                "header size {header_size} too small for {chunk_count} chunks"
            )));
        }
        let table = util::slice(data, TABLE_START, chunk_count * CHUNK_INFO_SIZE)
            .ok_or_else(|| BlteError::truncated(table_end, data.len()))?;

        let mut cursor = Cursor::new(table);
        let chunks = (0..chunk_count)
            .map(|_| ChunkInfo::read(&mut cursor))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            header_size,
            chunks,
        })
    }

    /// Check if this is a single-chunk file
    pub fn is_single_chunk(&self) -> bool {
        self.header_size == 0
    }

    /// Get the number of chunks
    pub fn chunk_count(&self) -> usize {
        if self.is_single_chunk() {
            1
        } else {
            self.chunks.len()
        }
    }

    /// Get the data offset (where chunk data starts)
    pub fn data_offset(&self) -> usize {
        if self.is_single_chunk() {
            PREAMBLE_SIZE
        } else {
            // header_size already includes the 8-byte preamble
            self.header_size as usize
        }
    }

    /// Sum of the chunk table's decoded sizes
    pub fn total_decompressed_size(&self) -> Option<u64> {
        if self.is_single_chunk() {
            return None;
        }
        Some(
            self.chunks
                .iter()
                .map(|c| u64::from(c.decompressed_size))
                .sum(),
        )
    }
}
