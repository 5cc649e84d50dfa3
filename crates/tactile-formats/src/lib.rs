//! Readers for the file formats TACT uses to resolve game content
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many CASC-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! Resolving a file takes four lookups, each against a different file:
//!
//! ```text
//! FileDataID or path --root--> content key
//! content key --encoding--> encoding key
//! encoding key --index--> archive, offset, size
//! archive range --BLTE--> decoded bytes
//! ```
//!
//! # Supported Formats
//!
//! - **BLTE**: chunked container for compressed and encrypted content
//! - **Archive indices**: per-archive and group `.index` files, plus merging
//!   archive indices into a group index
//! - **Encoding**: content key to encoding key mapping, and encoding specs
//! - **Root**: FileDataID and name hash to content key mapping
//! - **Install**: tagged list of files installed outside of CASC
//! - **Listfile**: community `fdid;path` listing
//!
//! # Design Principles
//!
//! - **Memory-mapped, read-only**: readers keep the mapped bytes and decode
//!   records on demand
//! - **Bounds-checked**: malformed input yields an error or `None`, never a
//!   panic
//! - **Explicit format detection**: layout variants are detected once into a
//!   small value consumed by one parser

#![warn(missing_docs)]

pub mod archive;
pub mod blte;
/// Encoding file mapping content keys to encoding keys
pub mod encoding;
/// Install manifest listing files placed on disk
pub mod install;
pub mod listfile;
pub mod resolver;
/// Root manifest mapping FileDataIDs and name hashes to content keys
pub mod root;
pub mod search;
pub mod settings;

pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_utils;

pub use resolver::{ByteProvider, ContentLocation, ContentResolver, LocalCdn, ResolveError};
pub use settings::Settings;
