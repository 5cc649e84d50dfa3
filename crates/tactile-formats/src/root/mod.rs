//! Root manifest reader
//!
//! The root file maps `FileDataID` values and path name hashes to content
//! keys. Records are grouped into blocks that share content and locale flags.
//!
//! **Note:** This root format is WoW-specific. Other CASC-based games use
//! different root layouts.
//!
//! # Layouts
//!
//! - **Legacy** (before 8.2): no header, each record interleaves its content
//!   key with its name hash
//! - **`TSFM`**: a 12-byte header with file counts, then blocks that store
//!   all content keys before all name hashes
//! - **Extended `TSFM`** (10.1.7+): header carries its own size and a
//!   version; version 2 splits the block flags into separate fields
//!
//! # Example
//!
//! ```rust,no_run
//! use tactile_crypto::FileDataId;
//! use tactile_formats::root::{RootFilter, RootReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = RootReader::open("root.bin", &RootFilter::default())?;
//! if let Some(record) = root.lookup_file_data_id(FileDataId::new(1_375_801)) {
//!     println!("{} -> {}", record.file_data_id, record.content_key);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod flags;
mod header;
mod reader;

pub use error::{RootError, RootResult};
pub use flags::{ContentFlags, LocaleFlags};
pub use header::{RootFormat, RootHeader, TSFM_MAGIC};
pub use reader::{RootFilter, RootReader, RootRecord};
