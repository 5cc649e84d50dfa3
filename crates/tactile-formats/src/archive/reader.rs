//! Memory-mapped archive and group index reader

use std::path::Path;

use bytes::Bytes;
use tactile_crypto::EncodingKey;
use tracing::debug;

use crate::archive::footer::{IndexFooter, IndexKind, IndexLayout};
use crate::archive::{ArchiveError, ArchiveResult};
use crate::search::{StridedSlice, compare_prefix};
use crate::settings::Settings;
use crate::util;

/// Location of one encoded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Encoding key, zero-padded when the index stores a shorter prefix
    pub key: EncodingKey,
    /// Encoded size in bytes
    pub size: u64,
    /// Offset inside the archive
    pub offset: u64,
    /// Archive ordinal, present only for group index entries
    pub archive: Option<u16>,
}

impl IndexEntry {
    /// Archive ordinal, or `fallback` for a per-archive index
    pub fn archive_or(&self, fallback: u16) -> u16 {
        self.archive.unwrap_or(fallback)
    }
}

/// Read-only view of a `.index` file
///
/// Lookups are two binary searches: one over the table of contents, which
/// stores the last key of each block, and one inside the selected block.
#[derive(Debug, Clone)]
pub struct IndexReader {
    data: Bytes,
    footer: IndexFooter,
    layout: IndexLayout,
}

impl IndexReader {
    /// Memory-map and open an index file
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        Self::open_with(path, false)
    }

    /// Memory-map an index file, optionally checking the footer hash
    pub fn open_with(path: impl AsRef<Path>, verify_footer: bool) -> ArchiveResult<Self> {
        let path = path.as_ref();
        let data = util::map_file(path)?;
        debug!("Mapped index {} ({} bytes)", path.display(), data.len());
        Self::from_bytes_with(data, verify_footer)
    }

    /// Memory-map an index file, checking the footer hash when `settings` ask for it
    pub fn open_with_settings(path: impl AsRef<Path>, settings: &Settings) -> ArchiveResult<Self> {
        Self::open_with(path, settings.verify_index_footers)
    }

    /// Build a reader over bytes already in memory
    pub fn from_bytes(data: impl Into<Bytes>) -> ArchiveResult<Self> {
        Self::from_bytes_with(data, false)
    }

    /// Build a reader over in-memory bytes, optionally checking the footer hash
    pub fn from_bytes_with(data: impl Into<Bytes>, verify_footer: bool) -> ArchiveResult<Self> {
        let data = data.into();
        let footer = IndexFooter::from_file_bytes(&data)?;
        footer.validate_format()?;
        if verify_footer {
            footer.verify()?;
        }

        let layout = footer.layout();
        if layout.entries_per_block == 0 {
            return Err(ArchiveError::invalid_footer(format!(
                "entry width {} exceeds block size {}",
                layout.entry_width, layout.block_size
            )));
        }
        if data.len() < layout.required_size {
            return Err(ArchiveError::Truncated {
                needed: layout.required_size as u64,
                available: data.len() as u64,
            });
        }

        debug!(
            "Opened {:?} index: {} entries in {} blocks, key width {}",
            footer.kind(),
            footer.element_count,
            layout.block_count,
            footer.key_bytes
        );

        Ok(Self {
            data,
            footer,
            layout,
        })
    }

    /// Parsed footer
    pub fn footer(&self) -> &IndexFooter {
        &self.footer
    }

    /// Whether entries carry an archive ordinal
    pub fn kind(&self) -> IndexKind {
        self.footer.kind()
    }

    /// Number of entries declared by the footer
    pub fn len(&self) -> usize {
        self.footer.element_count as usize
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.footer.element_count == 0
    }

    /// Find the entry for `key`
    pub fn lookup(&self, key: &EncodingKey) -> Option<IndexEntry> {
        let width = usize::from(self.footer.key_bytes);
        let needle = &key.as_bytes()[..width];

        let toc = self.toc()?;
        let block = toc.lower_bound_by(|last_key| last_key.cmp(needle));
        if block == toc.len() {
            return None;
        }

        let entries = self.block(block)?;
        let slot = entries.lower_bound_by(|record| compare_prefix(record, needle, width));
        let record = entries.get(slot)?;
        if &record[..width] != needle {
            return None;
        }

        self.decode_entry(record)
    }

    /// All non-empty entries in ascending key order
    pub fn entries(&self) -> impl Iterator<Item = IndexEntry> + '_ {
        (0..self.layout.block_count)
            .filter_map(|block| self.block(block))
            .flat_map(|records| records.iter())
            .filter_map(|record| self.decode_entry(record))
            .filter(|entry| entry.size != 0)
    }

    /// Raw bytes of the index file
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    fn toc(&self) -> Option<StridedSlice<'_>> {
        let toc = self.data.get(self.layout.toc_offset..)?;
        StridedSlice::with_len(
            toc,
            usize::from(self.footer.key_bytes),
            self.layout.block_count,
        )
    }

    fn block(&self, block: usize) -> Option<StridedSlice<'_>> {
        let start = block * self.layout.block_size;
        let data = util::slice(&self.data, start, self.layout.block_size)?;
        StridedSlice::with_len(
            data,
            self.layout.entry_width,
            self.layout.entries_in_block(block),
        )
    }

    fn decode_entry(&self, record: &[u8]) -> Option<IndexEntry> {
        let key_width = usize::from(self.footer.key_bytes);
        let size_width = usize::from(self.footer.size_bytes);
        let key = EncodingKey::from_prefix(&record[..key_width])?;
        let size = util::read_be(record, key_width, size_width)?;
        let location = key_width + size_width;

        let (archive, offset) = match self.kind() {
            IndexKind::Group => (
                Some(util::read_u16_be(record, location)?),
                u64::from(util::read_u32_be(record, location + 2)?),
            ),
            IndexKind::Archive => (
                None,
                util::read_be(record, location, usize::from(self.footer.offset_bytes))?,
            ),
        };

        Some(IndexEntry {
            key,
            size,
            offset,
            archive,
        })
    }
}
