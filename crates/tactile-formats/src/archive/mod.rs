//! Archive indexes and group index generation
//!
//! CDN archives bundle many encoded objects into one large `.data` blob. Each
//! archive ships with a `.index` file mapping encoding keys to a byte range in
//! the blob. A client merges all archive indexes of a build into one group
//! index so a single lookup finds both the archive and the range.
//!
//! # Binary Format
//!
//! ```text
//! [block 0][block 1]...[block N-1]   fixed-size blocks of sorted entries
//! [last key of each block]           table of contents
//! [8-byte hash of each block]
//! [28-byte footer]
//! ```
//!
//! Each entry is `key | size | offset`, with widths taken from the footer.
//! An offset width of 6 marks a group index: the field is a 2-byte archive
//! ordinal followed by a 4-byte offset.
//!
//! # Usage
//!
//! ```no_run
//! use tactile_formats::archive::{GroupIndexBuilder, IndexReader};
//! use tactile_crypto::EncodingKey;
//!
//! let archives = ["0017a402f556fbece46c38dc431a2c9b", "0033ff3fd2b0dbf8d35e2c1d4ecf95c5"];
//! let mut builder = GroupIndexBuilder::new();
//! for (ordinal, name) in archives.iter().enumerate() {
//!     builder = builder.add_archive(ordinal, IndexReader::open(format!("{name}.index"))?);
//! }
//! let group = builder.build()?;
//!
//! let key = EncodingKey::from_hex("0123456789abcdef0123456789abcdef")?;
//! if let Some(entry) = group.reader()?.lookup(&key) {
//!     let archive = archives[usize::from(entry.archive_or(0))];
//!     println!("{archive} @ {} ({} bytes)", entry.offset, entry.size);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod footer;
mod group;
mod reader;

pub use error::{ArchiveError, ArchiveResult};
pub use footer::{FOOTER_SIZE, GROUP_OFFSET_BYTES, IndexFooter, IndexKind, IndexLayout};
pub use group::{GroupIndex, GroupIndexBuilder};
pub use reader::{IndexEntry, IndexReader};
