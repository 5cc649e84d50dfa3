#![allow(dead_code, clippy::unwrap_used, clippy::cast_possible_truncation)]

//! Builders for the binary files the integration tests lay out on disk

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Single-chunk BLTE file holding `payload` uncompressed
pub fn blte_raw(payload: &[u8]) -> Vec<u8> {
    let mut data = b"BLTE\0\0\0\0N".to_vec();
    data.extend_from_slice(payload);
    data
}

/// `Z` chunk, mode byte included
pub fn zlib_chunk(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    let mut chunk = vec![b'Z'];
    chunk.extend(encoder.finish().unwrap());
    chunk
}

/// BLTE file with a chunk table; each chunk is `(encoded, decoded_size)`
pub fn blte_chunked(chunks: &[(Vec<u8>, usize)]) -> Vec<u8> {
    let mut data = b"BLTE".to_vec();
    data.extend_from_slice(&((12 + chunks.len() * 24) as u32).to_be_bytes());
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

/// Archive index with 4-byte sizes and offsets
///
/// Entries are `(key, size, offset)` sorted by key; keys shorter than
/// `key_bytes` are zero-padded.
pub fn archive_index(block_kb: u8, key_bytes: u8, entries: &[(Vec<u8>, u32, u32)]) -> Vec<u8> {
    let kw = usize::from(key_bytes);
    let block_size = usize::from(block_kb) << 10;
    let entry_width = kw + 8;
    let per_block = block_size / entry_width;
    let blocks = entries.len().div_ceil(per_block);

    let toc = blocks * block_size;
    let hashes = toc + blocks * kw;
    let mut data = vec![0u8; hashes + blocks * 8 + 28];

    for (block, chunk) in entries.chunks(per_block).enumerate() {
        let start = block * block_size;
        for (slot, (key, size, offset)) in chunk.iter().enumerate() {
            let at = start + slot * entry_width;
            let n = key.len().min(kw);
            data[at..at + n].copy_from_slice(&key[..n]);
            data[at + kw..at + kw + 4].copy_from_slice(&size.to_be_bytes());
            data[at + kw + 4..at + kw + 8].copy_from_slice(&offset.to_be_bytes());
        }
        let last = &chunk[chunk.len() - 1].0;
        let n = last.len().min(kw);
        data[toc + block * kw..toc + block * kw + n].copy_from_slice(&last[..n]);
        let hash = md5::compute(&data[start..start + block_size]).0;
        data[hashes + block * 8..hashes + block * 8 + 8].copy_from_slice(&hash[..8]);
    }

    let footer_at = data.len() - 28;
    let toc_hash = md5::compute(&data[toc..footer_at]).0;
    let mut footer = [0u8; 28];
    footer[..8].copy_from_slice(&toc_hash[..8]);
    footer[8..16].copy_from_slice(&[1, 0, 0, block_kb, 4, 4, key_bytes, 8]);
    footer[16..20].copy_from_slice(&(entries.len() as u32).to_le_bytes());
    let mut hashed = [0u8; 20];
    hashed[..12].copy_from_slice(&footer[8..20]);
    footer[20..].copy_from_slice(&md5::compute(hashed).0[..8]);
    data[footer_at..].copy_from_slice(&footer);
    data
}

/// Encoding file with one 4 KB page per table
///
/// `ckeys` are `(ckey, decoded_size, ekey)`, `ekeys` are
/// `(ekey, espec_index, encoded_size)`; both sorted by key.
pub fn encoding_file(
    especs: &[&str],
    ckeys: &[([u8; 16], u64, [u8; 16])],
    ekeys: &[([u8; 16], u32, u64)],
) -> Vec<u8> {
    const PAGE: usize = 4096;

    let mut ckey_page = Vec::new();
    for (ckey, size, ekey) in ckeys {
        ckey_page.push(1);
        ckey_page.extend_from_slice(&size.to_be_bytes()[3..]);
        ckey_page.extend_from_slice(ckey);
        ckey_page.extend_from_slice(ekey);
    }
    let mut ekey_page = Vec::new();
    for (ekey, index, size) in ekeys {
        ekey_page.extend_from_slice(ekey);
        ekey_page.extend_from_slice(&index.to_be_bytes());
        ekey_page.extend_from_slice(&size.to_be_bytes()[3..]);
    }
    assert!(ckey_page.len() <= PAGE && ekey_page.len() <= PAGE);
    ckey_page.resize(PAGE, 0);
    ekey_page.resize(PAGE, 0);

    let strings: Vec<u8> = especs
        .iter()
        .flat_map(|spec| spec.bytes().chain(std::iter::once(0)))
        .collect();

    let mut data = b"EN\x01\x10\x10\x00\x04\x00\x04".to_vec();
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(&1u32.to_be_bytes());
    data.push(0);
    data.extend_from_slice(&(strings.len() as u32).to_be_bytes());
    data.extend(strings);
    data.extend_from_slice(&ckeys[0].0);
    data.extend_from_slice(&md5::compute(&ckey_page).0);
    data.extend(ckey_page);
    data.extend_from_slice(&ekeys[0].0);
    data.extend_from_slice(&md5::compute(&ekey_page).0);
    data.extend(ekey_page);
    data
}

/// Root file with the 10.1.7 header and a single named block
///
/// Records are `(fdid, ckey, name_hash)` with ascending IDs.
pub fn root_file(locale: u32, records: &[(u32, [u8; 16], u64)]) -> Vec<u8> {
    let count = records.len() as u32;
    let mut data = b"TSFM".to_vec();
    for word in [24, 1, count, count, 0] {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.extend_from_slice(&count.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&locale.to_le_bytes());

    let mut next = 0u32;
    for (fdid, _, _) in records {
        data.extend_from_slice(&((fdid - next) as i32).to_le_bytes());
        next = fdid + 1;
    }
    for (_, ckey, _) in records {
        data.extend_from_slice(ckey);
    }
    for (_, _, hash) in records {
        data.extend_from_slice(&hash.to_le_bytes());
    }
    data
}
