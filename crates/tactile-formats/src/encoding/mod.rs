//! Encoding file reader
//!
//! The encoding file maps content keys (MD5 of decoded files) to encoding
//! keys (MD5 of the BLTE-encoded form), and encoding keys to the encoding
//! specification used to produce them.
//!
//! # Structure
//!
//! ```text
//! [header, 22 bytes]
//! [ESpec strings]
//! [ckey page table][ckey pages]
//! [ekey page table][ekey pages]
//! ```
//!
//! Page tables list the first key and MD5 of every page. Lookups pick the
//! page through the table and then search only that page, so a lookup
//! touches two small regions of a file that is often hundreds of megabytes.

mod error;
mod espec;
mod header;
mod reader;

pub use error::{EncodingError, EncodingResult};
pub use espec::EspecTable;
pub use header::{EncodingHeader, EncodingLayout, HEADER_SIZE, PAGE_TABLE_ENTRY_SIZE};
pub use reader::{ContentKeyRecord, EncodingReader, EncodingSpecRecord};
