//! Binary search over fixed-stride byte records
//!
//! Index blocks, table-of-contents arrays and encoding page tables are all
//! sequences of equally sized records sorted by a key prefix. [`StridedSlice`]
//! views such a region without copying it and provides the three searches the
//! readers need. Comparators compare a stored record against the needle, so
//! `Ordering::Less` means "this record sorts before what I am looking for".
//!
//! Two lower-bound flavours exist. [`StridedSlice::lower_bound_by`] finds the
//! first record not less than the needle, which is what a table of *last*
//! keys needs. [`StridedSlice::upper_bound_by`] treats an equal record as
//! less, returning the first record strictly greater; one position before it
//! is the page whose *first* key is not greater than the needle.

use std::cmp::Ordering;

/// A byte slice viewed as `len` records of `stride` bytes each
#[derive(Debug, Clone, Copy)]
pub struct StridedSlice<'a> {
    data: &'a [u8],
    stride: usize,
    len: usize,
}

impl<'a> StridedSlice<'a> {
    /// View as many whole records as fit in `data`
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        let len = data.len().checked_div(stride).unwrap_or(0);
        Self { data, stride, len }
    }

    /// View exactly `len` records; `None` if `data` is too short
    pub fn with_len(data: &'a [u8], stride: usize, len: usize) -> Option<Self> {
        let needed = stride.checked_mul(len)?;
        if stride == 0 || needed > data.len() {
            return None;
        }
        Some(Self {
            data: &data[..needed],
            stride,
            len,
        })
    }

    /// Number of records
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no records
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record width in bytes
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Record `index`, if in range
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.stride;
        self.data.get(start..start + self.stride)
    }

    /// Iterate over all records in order
    pub fn iter(self) -> impl Iterator<Item = &'a [u8]> {
        self.data.chunks_exact(self.stride.max(1)).take(self.len)
    }

    /// Classic binary search: `Ok(index)` on a match, `Err(insertion point)` otherwise
    pub fn binary_search_by<F>(&self, mut compare: F) -> Result<usize, usize>
    where
        F: FnMut(&[u8]) -> Ordering,
    {
        let mut left = 0;
        let mut right = self.len;
        while left < right {
            let mid = left + (right - left) / 2;
            match compare(self.record(mid)) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(left)
    }

    /// First record that does not compare `Less`; `len()` if there is none
    pub fn lower_bound_by<F>(&self, mut compare: F) -> usize
    where
        F: FnMut(&[u8]) -> Ordering,
    {
        self.partition(|record| compare(record) == Ordering::Less)
    }

    /// First record that compares `Greater`; `len()` if there is none
    pub fn upper_bound_by<F>(&self, mut compare: F) -> usize
    where
        F: FnMut(&[u8]) -> Ordering,
    {
        self.partition(|record| compare(record) != Ordering::Greater)
    }

    fn partition<P>(&self, mut goes_left: P) -> usize
    where
        P: FnMut(&[u8]) -> bool,
    {
        let mut left = 0;
        let mut right = self.len;
        while left < right {
            let mid = left + (right - left) / 2;
            if goes_left(self.record(mid)) {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        left
    }

    fn record(&self, index: usize) -> &'a [u8] {
        let start = index * self.stride;
        &self.data[start..start + self.stride]
    }
}

/// Compare the first `width` bytes of `record` with `needle`
///
/// Records are commonly a key followed by payload fields; only the key
/// prefix takes part in ordering.
pub fn compare_prefix(record: &[u8], needle: &[u8], width: usize) -> Ordering {
    let width = width.min(record.len()).min(needle.len());
    record[..width].cmp(&needle[..width])
}
