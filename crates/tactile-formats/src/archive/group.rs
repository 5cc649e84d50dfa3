//! Group index generation
//!
//! A group index merges the indexes of every archive listed in a CDN config
//! into one index whose entries carry the archive ordinal next to the offset.
//! The file name of a group index is the MD5 of its footer, so a rebuilt
//! index can be checked against the name the build configuration expects.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tactile_crypto::EncodingKey;
use tracing::{debug, trace};

use crate::archive::footer::{FOOTER_SIZE, IndexFooter};
use crate::archive::{ArchiveError, ArchiveResult, IndexReader};
use crate::util;

/// Entry as written to a group index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupEntry {
    key: EncodingKey,
    size: u32,
    archive: u16,
    offset: u32,
}

impl GroupEntry {
    const WIDTH: usize = 16 + 4 + 2 + 4;

    fn write(&self, out: &mut [u8]) {
        out[..16].copy_from_slice(self.key.as_bytes());
        out[16..20].copy_from_slice(&self.size.to_be_bytes());
        out[20..22].copy_from_slice(&self.archive.to_be_bytes());
        out[22..26].copy_from_slice(&self.offset.to_be_bytes());
    }
}

/// Builds a group index from per-archive indexes
#[derive(Debug, Clone, Default)]
pub struct GroupIndexBuilder {
    expected_name: Option<String>,
    archives: Vec<(usize, IndexReader)>,
}

/// A generated group index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    name: String,
    data: Bytes,
}

impl GroupIndexBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the built index to hash to `name` (hex, case-insensitive)
    #[must_use]
    pub fn expected_name(mut self, name: impl Into<String>) -> Self {
        self.expected_name = Some(name.into().to_ascii_lowercase());
        self
    }

    /// Add the index of the archive at position `ordinal` in the archive list
    #[must_use]
    pub fn add_archive(mut self, ordinal: usize, reader: IndexReader) -> Self {
        self.archives.push((ordinal, reader));
        self
    }

    /// Number of archives added so far
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Merge all archives into one group index
    pub fn build(self) -> ArchiveResult<GroupIndex> {
        debug!("Merging {} archive indexes", self.archives.len());

        let per_archive = collect_entries(&self.archives)?;
        let mut entries: Vec<GroupEntry> = per_archive.into_iter().flatten().collect();
        // Stable: equal keys keep archive order
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let count = u32::try_from(entries.len()).map_err(|_| ArchiveError::FieldOverflow {
            field: "entry count",
            value: entries.len() as u64,
        })?;

        let data = layout(&entries, count);
        let footer = &data[data.len() - FOOTER_SIZE..];
        let name = hex::encode(md5::compute(footer).0);

        debug!("Built group index {} with {} entries", name, count);

        if let Some(expected) = self.expected_name
            && expected != name
        {
            return Err(ArchiveError::IntegrityMismatch {
                expected,
                actual: name,
            });
        }

        Ok(GroupIndex {
            name,
            data: Bytes::from(data),
        })
    }
}

fn tag_entries(ordinal: usize, reader: &IndexReader) -> ArchiveResult<Vec<GroupEntry>> {
    let archive = u16::try_from(ordinal).map_err(|_| ArchiveError::FieldOverflow {
        field: "archive ordinal",
        value: ordinal as u64,
    })?;

    let entries = reader
        .entries()
        .map(|entry| {
            let size = u32::try_from(entry.size).map_err(|_| ArchiveError::FieldOverflow {
                field: "size",
                value: entry.size,
            })?;
            let offset = u32::try_from(entry.offset).map_err(|_| ArchiveError::FieldOverflow {
                field: "offset",
                value: entry.offset,
            })?;
            Ok(GroupEntry {
                key: entry.key,
                size,
                archive,
                offset,
            })
        })
        .collect::<ArchiveResult<Vec<_>>>()?;

    trace!("Archive {} contributed {} entries", ordinal, entries.len());
    Ok(entries)
}

#[cfg(feature = "parallel")]
fn collect_entries(archives: &[(usize, IndexReader)]) -> ArchiveResult<Vec<Vec<GroupEntry>>> {
    use rayon::prelude::*;

    archives
        .par_iter()
        .map(|(ordinal, reader)| tag_entries(*ordinal, reader))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_entries(archives: &[(usize, IndexReader)]) -> ArchiveResult<Vec<Vec<GroupEntry>>> {
    archives
        .iter()
        .map(|(ordinal, reader)| tag_entries(*ordinal, reader))
        .collect()
}

/// Serialize sorted entries into blocks, TOC, block hashes and footer
fn layout(entries: &[GroupEntry], count: u32) -> Vec<u8> {
    let footer = IndexFooter::group([0; 8], count);
    let layout = footer.layout();

    let mut data = vec![0u8; layout.required_size];
    for (block, chunk) in entries.chunks(layout.entries_per_block).enumerate() {
        let start = block * layout.block_size;
        for (slot, entry) in chunk.iter().enumerate() {
            let at = start + slot * GroupEntry::WIDTH;
            entry.write(&mut data[at..at + GroupEntry::WIDTH]);
        }

        if let Some(last) = chunk.last() {
            let toc = layout.toc_offset + block * 16;
            data[toc..toc + 16].copy_from_slice(last.key.as_bytes());
        }

        let hash = util::md5_prefix(&data[start..start + layout.block_size]);
        let at = layout.block_hashes_offset + block * 8;
        data[at..at + 8].copy_from_slice(&hash);
    }

    let footer_start = data.len() - FOOTER_SIZE;
    let toc_hash = util::md5_prefix(&data[layout.toc_offset..footer_start]);
    let footer = IndexFooter::group(toc_hash, count);
    data[footer_start..].copy_from_slice(&footer.to_bytes());
    data
}

impl GroupIndex {
    /// Hex MD5 of the footer, used as the file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialized index
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Open the built index for lookups
    pub fn reader(&self) -> ArchiveResult<IndexReader> {
        IndexReader::from_bytes(self.data.clone())
    }

    /// Write `<name>.index` into `dir`, replacing any previous file atomically
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> ArchiveResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}.index", self.name));
        let temp = dir.join(format!("{}.index.tmp", self.name));
        fs::write(&temp, &self.data)?;
        fs::rename(&temp, &path)?;

        debug!("Wrote group index to {}", path.display());
        Ok(path)
    }
}
