//! Memory-mapped encoding file reader

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tactile_crypto::{ContentKey, EncodingKey, TactKeyProvider};
use tracing::{debug, warn};

use crate::blte::{self, DecodeOptions};
use crate::encoding::error::{EncodingError, EncodingResult};
use crate::encoding::espec::EspecTable;
use crate::encoding::header::{EncodingHeader, EncodingLayout, PAGE_TABLE_ENTRY_SIZE};
use crate::search::{StridedSlice, compare_prefix};
use crate::util;

const KEY_SIZE: usize = 16;

/// `ekey | espec index u32 | encoded size u40`
const ESPEC_RECORD_SIZE: usize = KEY_SIZE + 4 + 5;

/// Content key mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKeyRecord {
    /// Content key the record belongs to
    pub content_key: ContentKey,
    /// Size of the decoded file
    pub decoded_size: u64,
    /// Encoded representations; the first one is the one to fetch
    pub encoding_keys: Vec<EncodingKey>,
}

impl ContentKeyRecord {
    /// First encoding key
    pub fn encoding_key(&self) -> Option<&EncodingKey> {
        self.encoding_keys.first()
    }
}

/// Encoding key mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingSpecRecord {
    /// Encoding key the record belongs to
    pub encoding_key: EncodingKey,
    /// Encoding specification string
    pub espec: String,
    /// Size of the encoded (BLTE) file
    pub encoded_size: u64,
}

/// Read-only view of an encoding file
///
/// Both tables are paged. A page table of first keys selects the page, then
/// the page itself is searched: content key pages hold variable-length
/// records and are scanned, encoding key pages hold fixed records and are
/// binary searched.
#[derive(Debug)]
pub struct EncodingReader {
    data: Bytes,
    header: EncodingHeader,
    layout: EncodingLayout,
    especs: Mutex<Option<Arc<EspecTable>>>,
}

impl EncodingReader {
    /// Memory-map and open a decoded encoding file
    pub fn open(path: impl AsRef<Path>) -> EncodingResult<Self> {
        let path = path.as_ref();
        let data = util::map_file(path)?;
        debug!("Mapped encoding {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(data)
    }

    /// Build a reader over a decoded encoding file in memory
    pub fn from_bytes(data: impl Into<Bytes>) -> EncodingResult<Self> {
        let data = data.into();
        let header = EncodingHeader::parse(&data)?;
        let layout = header.layout(data.len())?;

        debug!(
            "Opened encoding: {} ckey pages, {} ekey pages, {} byte espec block",
            header.ckey_page_count, header.ekey_page_count, header.espec_block_size
        );

        Ok(Self {
            data,
            header,
            layout,
            especs: Mutex::new(None),
        })
    }

    /// Decode a BLTE-wrapped encoding file and open it
    pub fn from_blte<K>(data: &[u8], keys: &K, options: &DecodeOptions) -> EncodingResult<Self>
    where
        K: TactKeyProvider + Sync + ?Sized,
    {
        let decoded = blte::decode(data, keys, options)?;
        Self::from_bytes(decoded.data)
    }

    /// Parsed header
    pub fn header(&self) -> &EncodingHeader {
        &self.header
    }

    /// Find the encoding keys of a content key
    pub fn find_content_key(&self, ckey: &ContentKey) -> Option<ContentKeyRecord> {
        let page = self.ckey_page(ckey.as_bytes())?;
        CKeyRecords::new(page)
            .find(|record| &record[6..6 + KEY_SIZE] == ckey.as_bytes())
            .and_then(decode_ckey_record)
    }

    /// Find the encoding specification of an encoding key
    pub fn get_espec(&self, ekey: &EncodingKey) -> Option<EncodingSpecRecord> {
        let needle = ekey.as_bytes();
        let page = self.ekey_page(needle)?;

        let records = StridedSlice::new(page, ESPEC_RECORD_SIZE);
        let live = records.lower_bound_by(|record| {
            if is_padding(record) {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        });
        let records = StridedSlice::with_len(page, ESPEC_RECORD_SIZE, live)?;

        let slot = records
            .binary_search_by(|record| compare_prefix(record, needle, KEY_SIZE))
            .ok()?;
        let record = records.get(slot)?;

        let index = util::read_u32_be(record, KEY_SIZE)?;
        let encoded_size = util::read_u40_be(record, KEY_SIZE + 4)?;
        let especs = self.espec_table();
        let Some(espec) = especs.get(index) else {
            warn!(
                "ESpec index {} out of range ({} entries) for {}",
                index,
                especs.len(),
                ekey
            );
            return None;
        };

        Some(EncodingSpecRecord {
            encoding_key: *ekey,
            espec: espec.to_string(),
            encoded_size,
        })
    }

    /// Iterate over every content key record in page order
    pub fn content_keys(&self) -> impl Iterator<Item = ContentKeyRecord> + '_ {
        let page_size = self.header.ckey_page_size();
        self.data[self.layout.ckey_pages.clone()]
            .chunks_exact(page_size)
            .flat_map(CKeyRecords::new)
            .filter_map(decode_ckey_record)
    }

    /// Check every page against the MD5 in its page table
    pub fn verify_pages(&self) -> EncodingResult<()> {
        self.verify_table(
            "ckey",
            &self.layout.ckey_table,
            &self.layout.ckey_pages,
            self.header.ckey_page_size(),
        )?;
        self.verify_table(
            "ekey",
            &self.layout.ekey_table,
            &self.layout.ekey_pages,
            self.header.ekey_page_size(),
        )
    }

    /// Parsed `ESpec` table, built on first use
    pub fn espec_table(&self) -> Arc<EspecTable> {
        let mut guard = self.especs.lock();
        if let Some(table) = guard.as_ref() {
            return Arc::clone(table);
        }

        let table = Arc::new(EspecTable::parse(&self.data[self.layout.espec.clone()]));
        debug!("Loaded {} ESpecs", table.len());
        *guard = Some(Arc::clone(&table));
        table
    }

    fn verify_table(
        &self,
        table_name: &'static str,
        table: &std::ops::Range<usize>,
        pages: &std::ops::Range<usize>,
        page_size: usize,
    ) -> EncodingResult<()> {
        let entries = StridedSlice::new(&self.data[table.clone()], PAGE_TABLE_ENTRY_SIZE);
        let pages = self.data[pages.clone()].chunks_exact(page_size);
        for (page, (entry, body)) in entries.iter().zip(pages).enumerate() {
            if md5::compute(body).0 != entry[KEY_SIZE..] {
                return Err(EncodingError::ChecksumMismatch {
                    table: table_name,
                    page,
                });
            }
        }
        Ok(())
    }

    fn ckey_page(&self, key: &[u8]) -> Option<&[u8]> {
        resolve_page(
            &self.data[self.layout.ckey_table.clone()],
            &self.data[self.layout.ckey_pages.clone()],
            self.header.ckey_page_size(),
            key,
        )
    }

    fn ekey_page(&self, key: &[u8]) -> Option<&[u8]> {
        resolve_page(
            &self.data[self.layout.ekey_table.clone()],
            &self.data[self.layout.ekey_pages.clone()],
            self.header.ekey_page_size(),
            key,
        )
    }
}

/// Select the last page whose first key is not greater than `key`
fn resolve_page<'a>(table: &[u8], pages: &'a [u8], page_size: usize, key: &[u8]) -> Option<&'a [u8]> {
    let entries = StridedSlice::new(table, PAGE_TABLE_ENTRY_SIZE);
    let page = entries
        .upper_bound_by(|entry| compare_prefix(entry, key, KEY_SIZE))
        .checked_sub(1)?;
    util::slice(pages, page * page_size, page_size)
}

fn is_padding(record: &[u8]) -> bool {
    record[..KEY_SIZE].iter().all(|&b| b == 0)
}

fn decode_ckey_record(record: &[u8]) -> Option<ContentKeyRecord> {
    let count = usize::from(record[0]);
    let decoded_size = util::read_u40_be(record, 1)?;
    let content_key = ContentKey::from_slice(util::slice(record, 6, KEY_SIZE)?)?;
    let encoding_keys = (0..count)
        .map(|i| EncodingKey::from_slice(util::slice(record, 6 + KEY_SIZE * (i + 1), KEY_SIZE)?))
        .collect::<Option<Vec<_>>>()?;

    Some(ContentKeyRecord {
        content_key,
        decoded_size,
        encoding_keys,
    })
}

/// Variable-length records of one content key page
///
/// A record is `key_count u8 | decoded_size u40 | ckey | key_count * ekey`.
/// A zero key count starts the padding at the end of the page.
struct CKeyRecords<'a> {
    page: &'a [u8],
    position: usize,
}

impl<'a> CKeyRecords<'a> {
    fn new(page: &'a [u8]) -> Self {
        Self { page, position: 0 }
    }
}

impl<'a> Iterator for CKeyRecords<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let count = usize::from(*self.page.get(self.position)?);
        if count == 0 {
            return None;
        }
        let len = 1 + 5 + KEY_SIZE + KEY_SIZE * count;
        let Some(record) = util::slice(self.page, self.position, len) else {
            self.position = self.page.len();
            return None;
        };
        self.position += len;
        Some(record)
    }
}
