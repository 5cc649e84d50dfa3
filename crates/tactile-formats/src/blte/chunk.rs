//! Chunk modes and single-chunk decoding

use std::io::Read;

use flate2::read::ZlibDecoder;
use tactile_crypto::{Salsa20Cipher, TactKeyProvider};
use tracing::{trace, warn};

use super::encryption::{EncryptedHeader, EncryptionType};
use super::error::{BlteError, BlteResult};

/// Chunk encoding, selected by the first byte of each chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkMode {
    /// Stored verbatim (`N`)
    Raw = b'N',
    /// zlib stream (`Z`)
    Deflate = b'Z',
    /// Frame-compressed (`F`), not supported
    Frame = b'F',
    /// Encrypted envelope around another chunk (`E`)
    Encrypted = b'E',
}

impl ChunkMode {
    /// Parse from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'N' => Some(Self::Raw),
            b'Z' => Some(Self::Deflate),
            b'F' => Some(Self::Frame),
            b'E' => Some(Self::Encrypted),
            _ => None,
        }
    }

    /// Get byte representation
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A chunk that was zero-filled because its key is not available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedChunk {
    /// Chunk index within the file
    pub index: usize,
    /// Name of the missing key
    pub key_name: u64,
    /// Offset of the zero-filled region in the decoded output
    pub offset: usize,
    /// Length of the zero-filled region
    pub size: usize,
}

/// Decode one encoded chunk (mode byte plus payload) into `out`
///
/// `out` must be exactly the chunk's decoded size. Returns the skipped
/// chunk description when an encrypted chunk's key is unknown; the
/// region is zero-filled in that case.
pub(crate) fn decode_chunk<K>(
    encoded: &[u8],
    index: usize,
    offset: usize,
    out: &mut [u8],
    keys: &K,
) -> BlteResult<Option<SkippedChunk>>
where
    K: TactKeyProvider + ?Sized,
{
    let (&mode_byte, payload) = encoded
        .split_first()
        .ok_or_else(|| BlteError::InvalidHeader(format!("chunk {index} is empty")))?;
    let mode = ChunkMode::from_byte(mode_byte).ok_or(BlteError::UnknownMode(mode_byte))?;

    trace!(
        "Decoding chunk {} mode {:?}: {} -> {} bytes",
        index,
        mode,
        payload.len(),
        out.len()
    );

    match mode {
        ChunkMode::Raw => {
            if payload.len() != out.len() {
                return Err(BlteError::SizeMismatch {
                    expected: out.len(),
                    actual: payload.len(),
                });
            }
            out.copy_from_slice(payload);
            Ok(None)
        }
        ChunkMode::Deflate => {
            inflate_exact(payload, out)?;
            Ok(None)
        }
        ChunkMode::Frame => Err(BlteError::NotImplemented("frame chunk mode")),
        ChunkMode::Encrypted => {
            let (header, ciphertext) = EncryptedHeader::parse(payload)?;
            if header.encryption_type == EncryptionType::Arc4 {
                return Err(BlteError::NotImplemented("ARC4 chunk encryption"));
            }

            let Some(key) = keys.get_key(header.key_name)? else {
                warn!(
                    "Missing key {:016X} for chunk {}, zero-filling {} bytes",
                    header.key_name,
                    index,
                    out.len()
                );
                out.fill(0);
                return Ok(Some(SkippedChunk {
                    index,
                    key_name: header.key_name,
                    offset,
                    size: out.len(),
                }));
            };

            let mut plain = ciphertext.to_vec();
            Salsa20Cipher::new(&key, &header.iv, index)?.apply_keystream(&mut plain);
            decode_chunk(&plain, index, offset, out, keys)
        }
    }
}

/// Inflate a zlib stream into exactly `out.len()` bytes
fn inflate_exact(payload: &[u8], out: &mut [u8]) -> BlteResult<()> {
    let mut decoder = ZlibDecoder::new(payload);
    let mut filled = 0;
    while filled < out.len() {
        match decoder.read(&mut out[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(BlteError::Decompression(e.to_string())),
        }
    }

    if filled != out.len() {
        return Err(BlteError::SizeMismatch {
            expected: out.len(),
            actual: filled,
        });
    }

    let extra = std::io::copy(&mut decoder, &mut std::io::sink())
        .map_err(|e| BlteError::Decompression(e.to_string()))?;
    if extra > 0 {
        return Err(BlteError::SizeMismatch {
            expected: out.len(),
            actual: out.len() + extra as usize,
        });
    }

    Ok(())
}
