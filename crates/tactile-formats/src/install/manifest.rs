//! Install manifest parsing

use std::path::Path;

use tactile_crypto::{ContentKey, TactKeyProvider};
use tracing::debug;

use crate::blte::{self, DecodeOptions};
use crate::install::error::{InstallError, InstallResult};
use crate::install::header::{HEADER_SIZE, InstallHeader};
use crate::install::tag::InstallTag;
use crate::util;

/// File listed in an install manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallEntry {
    /// Install path
    pub path: String,
    /// Content key of the file
    pub content_key: ContentKey,
    /// Decoded size in bytes
    pub size: u32,
}

/// Parsed install manifest
///
/// Install manifests list the files placed on disk outside of CASC and tag
/// them by platform, architecture and locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallManifest {
    /// Manifest header
    pub header: InstallHeader,
    /// Tags in manifest order
    pub tags: Vec<InstallTag>,
    /// Entries in manifest order
    pub entries: Vec<InstallEntry>,
}

impl InstallManifest {
    /// Memory-map and parse a decoded install manifest
    pub fn open(path: impl AsRef<Path>) -> InstallResult<Self> {
        let data = util::map_file(path.as_ref())?;
        Self::parse(&data)
    }

    /// Decode a BLTE-wrapped install manifest and parse it
    pub fn from_blte<K>(data: &[u8], keys: &K, options: &DecodeOptions) -> InstallResult<Self>
    where
        K: TactKeyProvider + Sync + ?Sized,
    {
        let decoded = blte::decode(data, keys, options)?;
        Self::parse(&decoded.data)
    }

    /// Parse a decoded install manifest
    pub fn parse(data: &[u8]) -> InstallResult<Self> {
        let header = InstallHeader::parse(data)?;
        let mask_len = header.bit_mask_size();
        let mut pos = HEADER_SIZE;

        let mut tags = Vec::with_capacity(header.tag_count as usize);
        for index in 0..header.tag_count as usize {
            let (tag, next) = InstallTag::read(data, pos, mask_len).ok_or(
                InstallError::Truncated {
                    what: "tag",
                    index,
                    offset: pos,
                },
            )?;
            tags.push(tag);
            pos = next;
        }

        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for index in 0..header.entry_count as usize {
            let (entry, next) = read_entry(data, pos).ok_or(InstallError::Truncated {
                what: "entry",
                index,
                offset: pos,
            })?;
            entries.push(entry);
            pos = next;
        }

        debug!(
            "Parsed install manifest: {} tags, {} entries",
            tags.len(),
            entries.len()
        );

        Ok(Self {
            header,
            tags,
            entries,
        })
    }

    /// Entries in manifest order
    pub fn entries(&self) -> &[InstallEntry] {
        &self.entries
    }

    /// `type=name` labels of every tag the entry at `index` carries
    pub fn tags_for(&self, index: usize) -> impl Iterator<Item = String> + '_ {
        self.tags
            .iter()
            .filter(move |tag| tag.has_entry(index))
            .map(InstallTag::label)
    }

    /// Find a tag by name
    pub fn find_tag(&self, name: &str) -> Option<&InstallTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Entries carrying every one of `tag_names`
    pub fn entries_with_tags<'a>(
        &'a self,
        tag_names: &[&str],
    ) -> impl Iterator<Item = &'a InstallEntry> + use<'a> {
        let tags: Vec<&InstallTag> = tag_names
            .iter()
            .filter_map(|name| self.find_tag(name))
            .collect();
        let all_found = tags.len() == tag_names.len();
        self.entries
            .iter()
            .enumerate()
            .filter(move |(index, _)| all_found && tags.iter().all(|tag| tag.has_entry(*index)))
            .map(|(_, entry)| entry)
    }
}

fn read_entry(data: &[u8], offset: usize) -> Option<(InstallEntry, usize)> {
    let (path, pos) = util::read_cstr(data, offset)?;
    let content_key = ContentKey::from_bytes(util::array(data, pos)?);
    let size = util::read_u32_be(data, pos + 16)?;
    let entry = InstallEntry {
        path,
        content_key,
        size,
    };
    Some((entry, pos + 20))
}
