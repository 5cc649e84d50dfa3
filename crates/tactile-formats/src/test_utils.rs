//! Fixture builders for unit tests
//!
//! The crate only reads these formats, so tests assemble the binary layouts
//! by hand.
#![allow(dead_code, clippy::unwrap_used, clippy::cast_possible_truncation)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

/// 16-byte key whose leading bytes are `prefix`
pub fn key16(prefix: &[u8]) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..prefix.len()].copy_from_slice(prefix);
    key
}

/// Single-chunk BLTE file holding `payload` uncompressed
pub fn blte_raw(payload: &[u8]) -> Vec<u8> {
    let mut data = b"BLTE\0\0\0\0N".to_vec();
    data.extend_from_slice(payload);
    data
}

/// `Z` chunk (mode byte included) for `payload`
pub fn zlib_chunk(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    let mut chunk = vec![b'Z'];
    chunk.extend(encoder.finish().unwrap());
    chunk
}

/// BLTE file with a chunk table; each chunk is `(encoded, decoded_size)`
pub fn blte_chunked(chunks: &[(Vec<u8>, usize)]) -> Vec<u8> {
    let header_size = 12 + chunks.len() * 24;
    let mut data = b"BLTE".to_vec();
    data.extend_from_slice(&(header_size as u32).to_be_bytes());
    data.push(0x0F);
    data.extend_from_slice(&(chunks.len() as u32).to_be_bytes()[1..]);
    for (encoded, decoded) in chunks {
        data.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
        data.extend_from_slice(&(*decoded as u32).to_be_bytes());
        data.extend_from_slice(&md5::compute(encoded).0);
    }
    for (encoded, _) in chunks {
        data.extend_from_slice(encoded);
    }
    data
}

/// Per-archive or group index
///
/// Keys shorter than `key_bytes` are zero-padded. `offset_bytes` of 6
/// writes `archive u16 | offset u32`; otherwise the offset is written
/// big-endian in `offset_bytes` bytes. Sizes are 4 bytes.
pub fn index_file(
    block_kb: u8,
    key_bytes: u8,
    offset_bytes: u8,
    entries: &[(Vec<u8>, u32, u16, u64)],
) -> Vec<u8> {
    let kw = usize::from(key_bytes);
    let ow = usize::from(offset_bytes);
    let block_size = usize::from(block_kb) * 1024;
    let entry_width = kw + 4 + ow;
    let per_block = block_size / entry_width;
    let blocks = entries.len().div_ceil(per_block);

    let toc_offset = blocks * block_size;
    let hashes_offset = toc_offset + blocks * kw;
    let mut data = vec![0u8; hashes_offset + blocks * 8 + 28];

    for (block, chunk) in entries.chunks(per_block).enumerate() {
        let start = block * block_size;
        for (slot, (key, size, archive, offset)) in chunk.iter().enumerate() {
            let at = start + slot * entry_width;
            let n = key.len().min(kw);
            data[at..at + n].copy_from_slice(&key[..n]);
            data[at + kw..at + kw + 4].copy_from_slice(&size.to_be_bytes());
            let loc = at + kw + 4;
            if offset_bytes == 6 {
                data[loc..loc + 2].copy_from_slice(&archive.to_be_bytes());
                data[loc + 2..loc + 6].copy_from_slice(&(*offset as u32).to_be_bytes());
            } else {
                data[loc..loc + ow].copy_from_slice(&offset.to_be_bytes()[8 - ow..]);
            }
        }
        let last = &chunk[chunk.len() - 1].0;
        let n = last.len().min(kw);
        data[toc_offset + block * kw..toc_offset + block * kw + n].copy_from_slice(&last[..n]);
        let hash = md5::compute(&data[start..start + block_size]).0;
        data[hashes_offset + block * 8..hashes_offset + block * 8 + 8].copy_from_slice(&hash[..8]);
    }

    let footer_start = data.len() - 28;
    let toc_hash = md5::compute(&data[toc_offset..footer_start]).0;
    let mut footer = [0u8; 28];
    footer[..8].copy_from_slice(&toc_hash[..8]);
    footer[8..16].copy_from_slice(&[1, 0, 0, block_kb, offset_bytes, 4, key_bytes, 8]);
    footer[16..20].copy_from_slice(&(entries.len() as u32).to_le_bytes());
    let mut hashed = [0u8; 20];
    hashed[..12].copy_from_slice(&footer[8..20]);
    footer[20..].copy_from_slice(&md5::compute(hashed).0[..8]);
    data[footer_start..].copy_from_slice(&footer);
    data
}

/// Content key record: `(ckey, decoded_size, ekeys)`
pub type CKeyFixture = ([u8; 16], u64, Vec<[u8; 16]>);

/// Encoding spec record: `(ekey, espec_index, encoded_size)`
pub type EKeyFixture = ([u8; 16], u32, u64);

/// Encoding file with the given records, packed into pages of `page_kb`
///
/// Records must already be sorted by key.
pub fn encoding_file(
    page_kb: u16,
    especs: &[&str],
    ckeys: &[CKeyFixture],
    ekeys: &[EKeyFixture],
) -> Vec<u8> {
    let page_size = usize::from(page_kb) * 1024;

    let ckey_records: Vec<([u8; 16], Vec<u8>)> = ckeys
        .iter()
        .map(|(ckey, size, ekeys)| {
            let mut record = vec![ekeys.len() as u8];
            record.extend_from_slice(&size.to_be_bytes()[3..]);
            record.extend_from_slice(ckey);
            for ekey in ekeys {
                record.extend_from_slice(ekey);
            }
            (*ckey, record)
        })
        .collect();
    let ekey_records: Vec<([u8; 16], Vec<u8>)> = ekeys
        .iter()
        .map(|(ekey, index, size)| {
            let mut record = ekey.to_vec();
            record.extend_from_slice(&index.to_be_bytes());
            record.extend_from_slice(&size.to_be_bytes()[3..]);
            (*ekey, record)
        })
        .collect();

    let (ckey_table, ckey_pages) = paginate(&ckey_records, page_size);
    let (ekey_table, ekey_pages) = paginate(&ekey_records, page_size);

    let mut espec_block = Vec::new();
    for spec in especs {
        espec_block.extend_from_slice(spec.as_bytes());
        espec_block.push(0);
    }

    let mut data = b"EN".to_vec();
    data.push(1);
    data.push(16);
    data.push(16);
    data.extend_from_slice(&page_kb.to_be_bytes());
    data.extend_from_slice(&page_kb.to_be_bytes());
    data.extend_from_slice(&((ckey_table.len() / 32) as u32).to_be_bytes());
    data.extend_from_slice(&((ekey_table.len() / 32) as u32).to_be_bytes());
    data.push(0);
    data.extend_from_slice(&(espec_block.len() as u32).to_be_bytes());
    data.extend(espec_block);
    data.extend(ckey_table);
    data.extend(ckey_pages);
    data.extend(ekey_table);
    data.extend(ekey_pages);
    data
}

/// Pack records into zero-padded pages and build the page table
fn paginate(records: &[([u8; 16], Vec<u8>)], page_size: usize) -> (Vec<u8>, Vec<u8>) {
    let mut pages: Vec<Vec<u8>> = Vec::new();
    let mut first_keys = Vec::new();
    for (key, record) in records {
        let fits = pages
            .last()
            .is_some_and(|page| page.len() + record.len() <= page_size);
        if !fits {
            pages.push(Vec::with_capacity(page_size));
            first_keys.push(*key);
        }
        if let Some(page) = pages.last_mut() {
            page.extend_from_slice(record);
        }
    }

    let mut table = Vec::new();
    let mut body = Vec::new();
    for (page, first) in pages.iter_mut().zip(&first_keys) {
        page.resize(page_size, 0);
        table.extend_from_slice(first);
        table.extend_from_slice(&md5::compute(&page[..]).0);
        body.extend_from_slice(page);
    }
    (table, body)
}

/// One block of a root file
#[derive(Debug, Clone)]
pub struct RootBlockFixture {
    /// Content flags
    pub content: u32,
    /// Locale flags
    pub locale: u32,
    /// Absolute file data IDs, ascending
    pub fdids: Vec<u32>,
    /// Content key per record
    pub ckeys: Vec<[u8; 16]>,
    /// Name hash per record; ignored when the NoNames flag is set
    pub name_hashes: Vec<u64>,
}

const NO_NAMES: u32 = 0x1000_0000;

impl RootBlockFixture {
    fn deltas(&self) -> Vec<i32> {
        let mut deltas = Vec::with_capacity(self.fdids.len());
        let mut previous: Option<u32> = None;
        for &fdid in &self.fdids {
            let delta = match previous {
                None => fdid as i32,
                Some(prev) => (i64::from(fdid) - i64::from(prev) - 1) as i32,
            };
            deltas.push(delta);
            previous = Some(fdid);
        }
        deltas
    }

    fn write_records(&self, data: &mut Vec<u8>, legacy: bool) {
        for delta in self.deltas() {
            data.extend_from_slice(&delta.to_le_bytes());
        }
        if legacy {
            for (ckey, hash) in self.ckeys.iter().zip(&self.name_hashes) {
                data.extend_from_slice(ckey);
                data.extend_from_slice(&hash.to_le_bytes());
            }
            return;
        }
        for ckey in &self.ckeys {
            data.extend_from_slice(ckey);
        }
        if self.content & NO_NAMES == 0 {
            for hash in &self.name_hashes {
                data.extend_from_slice(&hash.to_le_bytes());
            }
        }
    }
}

/// Root file in the `TSFM` format
///
/// Version 0 writes the original 12-byte header, versions 1 and 2 the
/// extended header.
pub fn root_file(version: u32, blocks: &[RootBlockFixture]) -> Vec<u8> {
    let total: usize = blocks.iter().map(|b| b.fdids.len()).sum();
    let named: usize = blocks
        .iter()
        .filter(|b| b.content & NO_NAMES == 0)
        .map(|b| b.fdids.len())
        .sum();

    let mut data = b"TSFM".to_vec();
    if version == 0 {
        data.extend_from_slice(&(total as u32).to_le_bytes());
        data.extend_from_slice(&(named as u32).to_le_bytes());
    } else {
        data.extend_from_slice(&24u32.to_le_bytes());
        data.extend_from_slice(&version.to_le_bytes());
        data.extend_from_slice(&(total as u32).to_le_bytes());
        data.extend_from_slice(&(named as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
    }

    for block in blocks {
        data.extend_from_slice(&(block.fdids.len() as u32).to_le_bytes());
        if version < 2 {
            data.extend_from_slice(&block.content.to_le_bytes());
            data.extend_from_slice(&block.locale.to_le_bytes());
        } else {
            data.extend_from_slice(&block.locale.to_le_bytes());
            data.extend_from_slice(&(block.content & 0x1_FFFF).to_le_bytes());
            data.extend_from_slice(&(block.content & !0x1_FFFF & !(0xFF << 17)).to_le_bytes());
            data.push((block.content >> 17) as u8);
        }
        block.write_records(&mut data, false);
    }
    data
}

/// Root file in the pre-8.2 layout with interleaved key and hash
pub fn legacy_root_file(blocks: &[RootBlockFixture]) -> Vec<u8> {
    let mut data = Vec::new();
    for block in blocks {
        data.extend_from_slice(&(block.fdids.len() as u32).to_le_bytes());
        data.extend_from_slice(&block.content.to_le_bytes());
        data.extend_from_slice(&block.locale.to_le_bytes());
        block.write_records(&mut data, true);
    }
    data
}

/// Install manifest: tags are `(name, type, entry indices)`, entries `(name, ckey, size)`
pub fn install_file(tags: &[(&str, u16, Vec<usize>)], entries: &[(&str, [u8; 16], u32)]) -> Vec<u8> {
    let mut data = b"IN".to_vec();
    data.push(1);
    data.push(16);
    data.extend_from_slice(&(tags.len() as u16).to_be_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    let mask_len = entries.len().div_ceil(8);
    for (name, tag_type, members) in tags {
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(&tag_type.to_be_bytes());
        let mut mask = vec![0u8; mask_len];
        for &index in members {
            mask[index / 8] |= 0x80 >> (index % 8);
        }
        data.extend(mask);
    }

    for (name, ckey, size) in entries {
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(ckey);
        data.extend_from_slice(&size.to_be_bytes());
    }
    data
}
