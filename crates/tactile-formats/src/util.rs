//! Bounds-checked byte access and file mapping shared by the readers
//!
//! Every multi-byte read in the crate goes through these helpers. They return
//! `None` instead of panicking when the requested range falls outside the
//! slice; callers turn that into their own "truncated" error.

use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Map a file read-only and wrap it as shared bytes
pub(crate) fn map_file(path: &Path) -> std::io::Result<Bytes> {
    let file = File::open(path)?;

    // The files are treated as immutable for the lifetime of the reader.
    #[allow(unsafe_code)]
    let mmap = unsafe { Mmap::map(&file)? };

    Ok(Bytes::from_owner(mmap))
}

/// Borrow `len` bytes at `offset`
pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

/// Copy `N` bytes at `offset` into an array
pub(crate) fn array<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    slice(data, offset, N)?.try_into().ok()
}

/// Big-endian unsigned integer of arbitrary width up to 8 bytes
///
/// Used for 24-bit, 40-bit and footer-defined field widths.
pub(crate) fn be_uint(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Read a big-endian field of `width` bytes at `offset`
pub(crate) fn read_be(data: &[u8], offset: usize, width: usize) -> Option<u64> {
    if width > 8 {
        return None;
    }
    slice(data, offset, width).map(be_uint)
}

pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    array(data, offset).map(u16::from_be_bytes)
}

pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    array(data, offset).map(u32::from_be_bytes)
}

pub(crate) fn read_u40_be(data: &[u8], offset: usize) -> Option<u64> {
    read_be(data, offset, 5)
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    array(data, offset).map(u32::from_le_bytes)
}

pub(crate) fn read_i32_le(data: &[u8], offset: usize) -> Option<i32> {
    array(data, offset).map(i32::from_le_bytes)
}

pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> Option<u64> {
    array(data, offset).map(u64::from_le_bytes)
}

/// Read a NUL-terminated string starting at `offset`
///
/// Returns the string (lossily decoded) and the offset just past the terminator.
pub(crate) fn read_cstr(data: &[u8], offset: usize) -> Option<(String, usize)> {
    let rest = data.get(offset..)?;
    let end = rest.iter().position(|&b| b == 0)?;
    let text = String::from_utf8_lossy(&rest[..end]).into_owned();
    Some((text, offset + end + 1))
}

/// First 8 bytes of an MD5 digest
pub(crate) fn md5_prefix(data: &[u8]) -> [u8; 8] {
    let digest = md5::compute(data);
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.0[..8]);
    out
}
