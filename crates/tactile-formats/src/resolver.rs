//! Content resolution across root, encoding and archive indices
//!
//! ```text
//! FileDataID --root--> content key --encoding--> encoding key
//!     --group index--> (archive, offset, size) --provider--> BLTE --> bytes
//! ```
//!
//! Encoding keys missing from the group index are looked up in the file
//! index of unarchived files, then fetched directly as loose files.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tactile_crypto::{ContentKey, EncodingKey, FileDataId, TactKeyProvider};
use thiserror::Error;
use tracing::{debug, trace};

use crate::archive::{ArchiveError, IndexReader};
use crate::blte::{self, BlteError, DecodedBlte};
use crate::encoding::{EncodingError, EncodingReader};
use crate::root::{RootError, RootReader};
use crate::settings::Settings;
use crate::util;

/// Result type for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while resolving content
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Group index names an archive ordinal with no archive
    #[error("Archive ordinal {ordinal} out of range ({count} archives)")]
    UnknownArchive {
        /// Ordinal from the group index
        ordinal: u16,
        /// Archives known to the resolver
        count: usize,
    },

    /// Provider returned fewer bytes than the index entry describes
    #[error("Short read for {ekey}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Key being fetched
        ekey: EncodingKey,
        /// Size from the index
        expected: u64,
        /// Bytes returned
        actual: u64,
    },

    /// Byte provider failed
    #[error("Provider error: {0}")]
    Provider(#[from] io::Error),

    /// BLTE decoding failed
    #[error("BLTE error: {0}")]
    Blte(#[from] BlteError),

    /// Archive index error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Encoding file error
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Root file error
    #[error("Root error: {0}")]
    Root(#[from] RootError),
}

/// Source of encoded bytes
///
/// `Ok(None)` means the object does not exist at the source.
pub trait ByteProvider {
    /// Fetch `size` bytes at `offset` of the archive named `archive`
    fn fetch_archive_range(
        &self,
        archive: &str,
        offset: u64,
        size: u64,
    ) -> io::Result<Option<Bytes>>;

    /// Fetch a whole loose file by encoding key
    fn fetch_file(&self, ekey: &EncodingKey) -> io::Result<Option<Bytes>>;
}

impl<P: ByteProvider + ?Sized> ByteProvider for &P {
    fn fetch_archive_range(
        &self,
        archive: &str,
        offset: u64,
        size: u64,
    ) -> io::Result<Option<Bytes>> {
        (**self).fetch_archive_range(archive, offset, size)
    }

    fn fetch_file(&self, ekey: &EncodingKey) -> io::Result<Option<Bytes>> {
        (**self).fetch_file(ekey)
    }
}

/// Provider over a local mirror of the CDN `data` directory
///
/// Objects live at `<root>/<ab>/<cd>/<name>`, where `ab` and `cd` are the
/// first two byte pairs of the lowercase hex name.
#[derive(Debug, Clone)]
pub struct LocalCdn {
    root: PathBuf,
}

impl LocalCdn {
    /// Create a provider rooted at a `data` directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of an object by its hex name
    pub fn object_path(&self, name: &str) -> PathBuf {
        let name = name.to_ascii_lowercase();
        match (name.get(0..2), name.get(2..4)) {
            (Some(a), Some(b)) => self.root.join(a).join(b).join(&name),
            _ => self.root.join(&name),
        }
    }
}

impl ByteProvider for LocalCdn {
    fn fetch_archive_range(
        &self,
        archive: &str,
        offset: u64,
        size: u64,
    ) -> io::Result<Option<Bytes>> {
        let mut file = match File::open(self.object_path(archive)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let len = usize::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "range too large"))?;
        let mut buf = vec![0u8; len];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(Some(Bytes::from(buf)))
    }

    fn fetch_file(&self, ekey: &EncodingKey) -> io::Result<Option<Bytes>> {
        match util::map_file(&self.object_path(&ekey.to_hex())) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Where an encoding key's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocation {
    /// Range of an archive from the group index
    Archive {
        /// Archive name
        archive: String,
        /// Offset inside the archive
        offset: u64,
        /// Encoded size
        size: u64,
    },
    /// Unarchived file listed in the file index
    Indexed {
        /// Encoded size
        size: u64,
    },
    /// Not indexed; fetched directly by key
    Loose,
}

/// Resolves file data IDs and keys to decoded bytes
pub struct ContentResolver<'a, P: ?Sized, K: ?Sized> {
    root: &'a RootReader,
    encoding: &'a EncodingReader,
    group: Option<(&'a IndexReader, &'a [String])>,
    file_index: Option<&'a IndexReader>,
    provider: &'a P,
    keys: &'a K,
    settings: Settings,
}

impl<'a, P, K> ContentResolver<'a, P, K>
where
    P: ByteProvider + ?Sized,
    K: TactKeyProvider + Sync + ?Sized,
{
    /// Create a resolver without archive indices
    pub fn new(
        root: &'a RootReader,
        encoding: &'a EncodingReader,
        provider: &'a P,
        keys: &'a K,
    ) -> Self {
        Self {
            root,
            encoding,
            group: None,
            file_index: None,
            provider,
            keys,
            settings: Settings::default(),
        }
    }

    /// Use a group index; `archives` lists archive names by ordinal
    #[must_use]
    pub fn with_group_index(mut self, group: &'a IndexReader, archives: &'a [String]) -> Self {
        self.group = Some((group, archives));
        self
    }

    /// Use a file index of unarchived files
    #[must_use]
    pub fn with_file_index(mut self, index: &'a IndexReader) -> Self {
        self.file_index = Some(index);
        self
    }

    /// Use these settings for decoding
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Decode the file with this file data ID
    pub fn resolve_file_data_id(&self, fdid: FileDataId) -> ResolveResult<Option<DecodedBlte>> {
        let Some(record) = self.root.lookup_file_data_id(fdid) else {
            trace!("FileDataID {} not in root", fdid);
            return Ok(None);
        };
        self.resolve_content_key(&record.content_key)
    }

    /// Decode the file with this path, through its name hash
    pub fn resolve_path(&self, path: &str) -> ResolveResult<Option<DecodedBlte>> {
        let Some(record) = self.root.lookup_path(path) else {
            trace!("Path {} not in root", path);
            return Ok(None);
        };
        self.resolve_content_key(&record.content_key)
    }

    /// Decode the file with this content key
    pub fn resolve_content_key(&self, ckey: &ContentKey) -> ResolveResult<Option<DecodedBlte>> {
        let Some(record) = self.encoding.find_content_key(ckey) else {
            trace!("Content key {} not in encoding", ckey);
            return Ok(None);
        };
        let Some(ekey) = record.encoding_key() else {
            return Ok(None);
        };
        self.resolve_encoding_key(ekey, record.decoded_size)
    }

    /// Fetch and decode the file with this encoding key
    pub fn resolve_encoding_key(
        &self,
        ekey: &EncodingKey,
        decoded_size: u64,
    ) -> ResolveResult<Option<DecodedBlte>> {
        let location = self.locate(ekey)?;
        debug!("Resolving {} from {:?}", ekey, location);

        let fetched = match &location {
            ContentLocation::Archive {
                archive,
                offset,
                size,
            } => {
                let data = self.provider.fetch_archive_range(archive, *offset, *size)?;
                if let Some(data) = &data
                    && (data.len() as u64) < *size
                {
                    return Err(ResolveError::ShortRead {
                        ekey: *ekey,
                        expected: *size,
                        actual: data.len() as u64,
                    });
                }
                data
            }
            ContentLocation::Indexed { .. } | ContentLocation::Loose => {
                self.provider.fetch_file(ekey)?
            }
        };

        let Some(data) = fetched else {
            trace!("Provider has no bytes for {}", ekey);
            return Ok(None);
        };

        let options = self.settings.decode_options().with_total_size(decoded_size);
        Ok(Some(blte::decode(&data, self.keys, &options)?))
    }

    /// Find where an encoding key's bytes live
    pub fn locate(&self, ekey: &EncodingKey) -> ResolveResult<ContentLocation> {
        if let Some((group, archives)) = self.group
            && let Some(entry) = group.lookup(ekey)
        {
            let ordinal = entry.archive_or(0);
            let archive = archives
                .get(usize::from(ordinal))
                .ok_or(ResolveError::UnknownArchive {
                    ordinal,
                    count: archives.len(),
                })?;
            return Ok(ContentLocation::Archive {
                archive: archive.clone(),
                offset: entry.offset,
                size: entry.size,
            });
        }

        if let Some(entry) = self.file_index.and_then(|index| index.lookup(ekey)) {
            return Ok(ContentLocation::Indexed { size: entry.size });
        }

        Ok(ContentLocation::Loose)
    }
}
