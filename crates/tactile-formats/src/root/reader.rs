//! Root manifest reader

use std::collections::HashMap;
use std::path::Path;

use tactile_crypto::{ContentKey, FileDataId, TactKeyProvider, name_hash};
use tracing::{debug, trace};

use crate::blte::{self, DecodeOptions};
use crate::root::error::{RootError, RootResult};
use crate::root::flags::{ContentFlags, LocaleFlags};
use crate::root::header::{RootFormat, RootHeader};
use crate::util;

/// Which root blocks get indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootFilter {
    /// Locale to keep
    pub locale: LocaleFlags,
    /// Skip blocks that neither cover every locale nor `locale`
    pub locale_filter: bool,
    /// Skip low violence blocks
    pub skip_low_violence: bool,
    /// Compare record counts with the header when nothing was skipped
    pub validate_counts: bool,
}

impl Default for RootFilter {
    fn default() -> Self {
        Self {
            locale: LocaleFlags::default(),
            locale_filter: true,
            skip_low_violence: true,
            validate_counts: false,
        }
    }
}

impl RootFilter {
    /// Filter that indexes every block
    pub fn all() -> Self {
        Self {
            locale_filter: false,
            skip_low_violence: false,
            ..Self::default()
        }
    }

    /// Whether a block with these flags is indexed
    pub fn accepts(&self, content: ContentFlags, locale: LocaleFlags) -> bool {
        if self.locale_filter
            && !locale.contains(LocaleFlags::ALL_WOW)
            && !locale.has(self.locale.value())
        {
            return false;
        }
        !(self.skip_low_violence && content.has(ContentFlags::LOW_VIOLENCE))
    }
}

/// One indexed root record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootRecord {
    /// File data ID
    pub file_data_id: FileDataId,
    /// Content key of the file
    pub content_key: ContentKey,
    /// Locale flags of the block the record came from
    pub locale: LocaleFlags,
    /// Content flags of the block the record came from
    pub content: ContentFlags,
    /// Jenkins hash of the file path, if the block carries names
    pub name_hash: Option<u64>,
}

/// Parsed root manifest
///
/// Records are indexed by file data ID and by name hash. When the same ID
/// or hash appears more than once, the last record read wins.
#[derive(Debug, Clone)]
pub struct RootReader {
    header: RootHeader,
    records: HashMap<FileDataId, RootRecord>,
    hashes: HashMap<u64, FileDataId>,
}

/// Block flags as read from disk
struct BlockFlags {
    content: ContentFlags,
    locale: LocaleFlags,
}

impl RootReader {
    /// Memory-map and parse a decoded root file
    pub fn open(path: impl AsRef<Path>, filter: &RootFilter) -> RootResult<Self> {
        let path = path.as_ref();
        let data = util::map_file(path)?;
        debug!("Mapped root {} ({} bytes)", path.display(), data.len());
        Self::parse(&data, filter)
    }

    /// Decode a BLTE-wrapped root file and parse it
    pub fn from_blte<K>(
        data: &[u8],
        keys: &K,
        options: &DecodeOptions,
        filter: &RootFilter,
    ) -> RootResult<Self>
    where
        K: TactKeyProvider + Sync + ?Sized,
    {
        let decoded = blte::decode(data, keys, options)?;
        Self::parse(&decoded.data, filter)
    }

    /// Parse a decoded root file
    pub fn parse(data: &[u8], filter: &RootFilter) -> RootResult<Self> {
        let header = RootHeader::detect(data)?;
        let mut reader = Self {
            header,
            records: HashMap::new(),
            hashes: HashMap::new(),
        };

        let mut pos = header.body_offset;
        let mut total_read = 0u64;
        let mut named_read = 0u64;
        let mut blocks = 0usize;
        let mut skipped = 0usize;

        while pos < data.len() {
            let block_start = pos;
            let count = util::read_u32_le(data, pos)
                .ok_or_else(|| truncated(data, block_start, 4))? as usize;
            pos += 4;

            let flags = read_flags(data, pos, &header).ok_or_else(|| {
                truncated(data, block_start, 4 + header.flags_size())
            })?;
            pos += header.flags_size();
            blocks += 1;

            if count == 0 {
                continue;
            }

            let named = header.is_interleaved() || flags.content.has_name_hashes();
            let record_size = 4 + 16 + if named { 8 } else { 0 };
            let body_len = count
                .checked_mul(record_size)
                .ok_or_else(|| truncated(data, block_start, usize::MAX))?;
            let body = util::slice(data, pos, body_len)
                .ok_or_else(|| truncated(data, block_start, pos - block_start + body_len))?;
            pos += body_len;

            total_read += count as u64;
            if named {
                named_read += count as u64;
            }

            if !filter.accepts(flags.content, flags.locale) {
                trace!(
                    "Skipping root block at {}: {} records, content {}, locale {}",
                    block_start, count, flags.content, flags.locale
                );
                skipped += 1;
                continue;
            }

            trace!(
                "Root block at {}: {} records, content {}, locale {}",
                block_start, count, flags.content, flags.locale
            );
            reader.index_block(body, count, named, &flags)?;
        }

        debug!(
            "Parsed root ({:?} v{}): {} blocks, {} skipped, {} file data IDs, {} name hashes",
            header.format,
            header.version,
            blocks,
            skipped,
            reader.records.len(),
            reader.hashes.len()
        );

        if filter.validate_counts && skipped == 0 {
            reader.check_counts(total_read, named_read)?;
        }

        Ok(reader)
    }

    fn index_block(
        &mut self,
        body: &[u8],
        count: usize,
        named: bool,
        flags: &BlockFlags,
    ) -> RootResult<()> {
        let deltas = &body[..count * 4];
        let keys = &body[count * 4..];
        let interleaved = self.header.is_interleaved();

        let mut previous: i64 = -1;
        for i in 0..count {
            let delta = util::read_i32_le(deltas, i * 4).unwrap_or_default();
            let id = previous + 1 + i64::from(delta);
            let file_data_id = u32::try_from(id)
                .map(FileDataId::new)
                .map_err(|_| RootError::DeltaOverflow { previous, delta })?;
            previous = id;

            let (ckey_at, hash_at) = if interleaved {
                (i * 24, i * 24 + 16)
            } else {
                (i * 16, count * 16 + i * 8)
            };
            let content_key = util::array::<16>(keys, ckey_at)
                .map(ContentKey::from_bytes)
                .unwrap_or_default();
            let hash = if named {
                util::read_u64_le(keys, hash_at)
            } else {
                None
            };

            self.records.insert(
                file_data_id,
                RootRecord {
                    file_data_id,
                    content_key,
                    locale: flags.locale,
                    content: flags.content,
                    name_hash: hash,
                },
            );
            if let Some(hash) = hash {
                self.hashes.insert(hash, file_data_id);
            }
        }
        Ok(())
    }

    fn check_counts(&self, total_read: u64, named_read: u64) -> RootResult<()> {
        if let Some(expected) = self.header.total_files
            && u64::from(expected) != total_read
        {
            return Err(RootError::CountMismatch {
                field: "total",
                expected,
                actual: total_read,
            });
        }
        if let Some(expected) = self.header.named_files
            && u64::from(expected) != named_read
        {
            return Err(RootError::CountMismatch {
                field: "named",
                expected,
                actual: named_read,
            });
        }
        Ok(())
    }

    /// Look up a record by file data ID
    pub fn lookup_file_data_id(&self, fdid: FileDataId) -> Option<&RootRecord> {
        self.records.get(&fdid)
    }

    /// Look up a record by name hash
    pub fn lookup_name_hash(&self, hash: u64) -> Option<&RootRecord> {
        self.hashes
            .get(&hash)
            .and_then(|fdid| self.records.get(fdid))
    }

    /// Look up a record by path
    pub fn lookup_path(&self, path: &str) -> Option<&RootRecord> {
        self.lookup_name_hash(name_hash(path))
    }

    /// Every indexed file data ID, in no particular order
    pub fn file_data_ids(&self) -> impl Iterator<Item = FileDataId> + '_ {
        self.records.keys().copied()
    }

    /// Number of indexed file data IDs
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detected layout
    pub fn format(&self) -> RootFormat {
        self.header.format
    }

    /// Detected header
    pub fn header(&self) -> &RootHeader {
        &self.header
    }

    /// Total and named counts from the header, when it has them
    pub fn header_counts(&self) -> Option<(u32, u32)> {
        Some((self.header.total_files?, self.header.named_files?))
    }
}

fn read_flags(data: &[u8], pos: usize, header: &RootHeader) -> Option<BlockFlags> {
    if header.version >= 2 {
        let locale = util::read_u32_le(data, pos)?;
        let unk1 = util::read_u32_le(data, pos + 4)?;
        let unk2 = util::read_u32_le(data, pos + 8)?;
        let unk3 = *data.get(pos + 12)?;
        return Some(BlockFlags {
            content: ContentFlags::new(unk1 | unk2 | (u32::from(unk3) << 17)),
            locale: LocaleFlags::new(locale),
        });
    }
    Some(BlockFlags {
        content: ContentFlags::new(util::read_u32_le(data, pos)?),
        locale: LocaleFlags::new(util::read_u32_le(data, pos + 4)?),
    })
}

fn truncated(data: &[u8], offset: usize, needed: usize) -> RootError {
    RootError::Truncated {
        offset,
        needed,
        available: data.len().saturating_sub(offset),
    }
}
