//! Install manifest reader
//!
//! ```text
//! [header, 10 bytes]
//! [tag: name\0 | type u16 | bit mask] * tag_count
//! [entry: path\0 | content key | size u32] * entry_count
//! ```
//!
//! Each tag's bit mask has one bit per entry, most significant bit first.

mod error;
mod header;
mod manifest;
mod tag;

pub use error::{InstallError, InstallResult};
pub use header::{HEADER_SIZE, InstallHeader};
pub use manifest::{InstallEntry, InstallManifest};
pub use tag::{InstallTag, TagType};
