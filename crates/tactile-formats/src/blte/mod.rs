//! BLTE (Block Table Encoded) decoding
//!
//! BLTE is the container every CDN object is stored in. A file is either a
//! single chunk following an 8-byte preamble, or a chunk table followed by
//! the chunks it describes. Each chunk starts with a mode byte:
//!
//! - `N`: stored verbatim
//! - `Z`: zlib-compressed
//! - `E`: encrypted envelope wrapping another chunk
//! - `F`: frame-compressed, rejected with [`BlteError::NotImplemented`]
//!
//! Chunks decode into disjoint regions of one output buffer, so with the
//! `parallel` feature they are decoded concurrently. Encrypted chunks whose
//! key is not in the key store are zero-filled and reported in
//! [`DecodedBlte::skipped`] instead of failing the whole file.

mod chunk;
mod encryption;
mod error;
mod header;

pub use chunk::{ChunkMode, SkippedChunk};
pub use encryption::{EncryptedHeader, EncryptionType};
pub use error::{BlteError, BlteResult};
pub use header::{BLTE_MAGIC, BlteHeader, CHUNK_INFO_SIZE, ChunkInfo, STANDARD_TABLE_FLAGS};

use tactile_crypto::TactKeyProvider;
use tracing::debug;

/// Options controlling a decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decoded size, when known from the encoding file
    ///
    /// Required for single-chunk files whose chunk is not raw.
    pub total_size: Option<u64>,
    /// Check each chunk's MD5 against the chunk table
    pub verify_checksums: bool,
    /// Decode chunks concurrently (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            total_size: None,
            verify_checksums: false,
            parallel: true,
        }
    }
}

impl DecodeOptions {
    /// Set the expected decoded size
    #[must_use]
    pub const fn with_total_size(mut self, size: u64) -> Self {
        self.total_size = Some(size);
        self
    }

    /// Enable or disable chunk checksum verification
    #[must_use]
    pub const fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Enable or disable concurrent chunk decoding
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Result of decoding a BLTE file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedBlte {
    /// Decoded bytes
    pub data: Vec<u8>,
    /// Encrypted chunks that were zero-filled for lack of a key
    pub skipped: Vec<SkippedChunk>,
}

impl DecodedBlte {
    /// Whether every chunk was decoded
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Take the decoded bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A parsed BLTE file borrowing its encoded bytes
#[derive(Debug, Clone)]
pub struct BlteFile<'a> {
    header: BlteHeader,
    data: &'a [u8],
}

/// One chunk's input and destination
struct ChunkJob<'a, 'o> {
    index: usize,
    offset: usize,
    encoded: &'a [u8],
    checksum: Option<[u8; 16]>,
    out: &'o mut [u8],
}

impl<'a> BlteFile<'a> {
    /// Parse the header and borrow the chunk data
    pub fn parse(data: &'a [u8]) -> BlteResult<Self> {
        let header = BlteHeader::parse(data)?;
        if data.len() <= header.data_offset() {
            return Err(BlteError::truncated(header.data_offset() + 1, data.len()));
        }
        Ok(Self { header, data })
    }

    /// The parsed header
    pub fn header(&self) -> &BlteHeader {
        &self.header
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        self.header.chunk_count()
    }

    /// Decode every chunk into one buffer
    pub fn decode<K>(&self, keys: &K, options: &DecodeOptions) -> BlteResult<DecodedBlte>
    where
        K: TactKeyProvider + Sync + ?Sized,
    {
        let layout = self.layout(options)?;
        let total: usize = layout.iter().map(|(_, size, _)| size).sum();

        debug!(
            "Decoding BLTE: {} chunks, {} -> {} bytes",
            layout.len(),
            self.data.len(),
            total
        );

        let mut data = vec![0u8; total];
        let mut jobs = Vec::with_capacity(layout.len());
        let mut rest = data.as_mut_slice();
        let mut offset = 0;
        for (index, (encoded, size, checksum)) in layout.into_iter().enumerate() {
            let (out, tail) = std::mem::take(&mut rest).split_at_mut(size);
            rest = tail;
            jobs.push(ChunkJob {
                index,
                offset,
                encoded,
                checksum: checksum.filter(|_| options.verify_checksums),
                out,
            });
            offset += size;
        }

        let mut skipped = run_jobs(jobs, keys, options)?;
        skipped.sort_by_key(|s| s.index);

        Ok(DecodedBlte { data, skipped })
    }

    /// Encoded slice, decoded size and checksum of each chunk
    fn layout(&self, options: &DecodeOptions) -> BlteResult<Vec<(&'a [u8], usize, Option<[u8; 16]>)>> {
        let start = self.header.data_offset();

        if self.header.is_single_chunk() {
            let encoded = &self.data[start..];
            let size = match options.total_size {
                Some(size) => to_usize(size)?,
                None if encoded[0] == ChunkMode::Raw.as_byte() => encoded.len() - 1,
                None => return Err(BlteError::UnknownTotalSize),
            };
            return Ok(vec![(encoded, size, None)]);
        }

        let mut layout = Vec::with_capacity(self.header.chunks.len());
        let mut position = start;
        for (index, info) in self.header.chunks.iter().enumerate() {
            let comp = info.compressed_size as usize;
            if comp == 0 {
                return Err(BlteError::InvalidHeader(format!(
                    "chunk {index} has zero encoded size"
                )));
            }
            let encoded = crate::util::slice(self.data, position, comp)
                .ok_or_else(|| BlteError::truncated(position + comp, self.data.len()))?;
            layout.push((
                encoded,
                info.decompressed_size as usize,
                Some(info.checksum),
            ));
            position += comp;
        }

        if let (Some(hint), Some(sum)) = (options.total_size, self.header.total_decompressed_size())
            && hint != sum
        {
            return Err(BlteError::SizeMismatch {
                expected: to_usize(hint)?,
                actual: to_usize(sum)?,
            });
        }

        Ok(layout)
    }
}

/// Decode a BLTE file in one call
pub fn decode<K>(data: &[u8], keys: &K, options: &DecodeOptions) -> BlteResult<DecodedBlte>
where
    K: TactKeyProvider + Sync + ?Sized,
{
    BlteFile::parse(data)?.decode(keys, options)
}

fn to_usize(size: u64) -> BlteResult<usize> {
    usize::try_from(size)
        .map_err(|_| BlteError::InvalidHeader(format!("decoded size {size} exceeds address space")))
}

impl ChunkJob<'_, '_> {
    fn run<K>(self, keys: &K) -> BlteResult<Option<SkippedChunk>>
    where
        K: TactKeyProvider + ?Sized,
    {
        if let Some(expected) = self.checksum {
            let actual = md5::compute(self.encoded).0;
            if actual != expected {
                return Err(BlteError::ChecksumMismatch {
                    chunk: self.index,
                    expected: hex::encode(expected),
                    actual: hex::encode(actual),
                });
            }
        }
        chunk::decode_chunk(self.encoded, self.index, self.offset, self.out, keys)
    }
}

#[cfg(feature = "parallel")]
fn run_jobs<K>(
    jobs: Vec<ChunkJob<'_, '_>>,
    keys: &K,
    options: &DecodeOptions,
) -> BlteResult<Vec<SkippedChunk>>
where
    K: TactKeyProvider + Sync + ?Sized,
{
    use rayon::prelude::*;

    if !options.parallel || jobs.len() < 2 {
        return run_jobs_sequential(jobs, keys);
    }

    let results = jobs
        .into_par_iter()
        .map(|job| job.run(keys))
        .collect::<BlteResult<Vec<_>>>()?;
    Ok(results.into_iter().flatten().collect())
}

#[cfg(not(feature = "parallel"))]
fn run_jobs<K>(
    jobs: Vec<ChunkJob<'_, '_>>,
    keys: &K,
    _options: &DecodeOptions,
) -> BlteResult<Vec<SkippedChunk>>
where
    K: TactKeyProvider + Sync + ?Sized,
{
    run_jobs_sequential(jobs, keys)
}

fn run_jobs_sequential<K>(jobs: Vec<ChunkJob<'_, '_>>, keys: &K) -> BlteResult<Vec<SkippedChunk>>
where
    K: TactKeyProvider + ?Sized,
{
    let mut skipped = Vec::new();
    for job in jobs {
        if let Some(chunk) = job.run(keys)? {
            skipped.push(chunk);
        }
    }
    Ok(skipped)
}
