//! Community listfile (`fdid;path` per line)
//!
//! Maps file data IDs to paths and path name hashes back to file data IDs,
//! for root manifests whose blocks carry no names.

use std::collections::HashMap;

use tactile_crypto::{FileDataId, name_hash};
use tracing::debug;

/// Parsed listfile
#[derive(Debug, Clone, Default)]
pub struct Listfile {
    paths: HashMap<FileDataId, String>,
    hashes: HashMap<u64, FileDataId>,
}

impl Listfile {
    /// Parse listfile text; malformed lines are skipped
    pub fn parse(text: &str) -> Self {
        let mut listfile = Self::default();
        let mut skipped = 0usize;

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed = line
                .split_once(';')
                .and_then(|(id, path)| Some((id.trim().parse::<u32>().ok()?, path.trim())))
                .filter(|(_, path)| !path.is_empty());

            let Some((id, path)) = parsed else {
                debug!("Skipping malformed listfile line {}: {:?}", number + 1, line);
                skipped += 1;
                continue;
            };

            let fdid = FileDataId::new(id);
            listfile.hashes.insert(name_hash(path), fdid);
            listfile.paths.insert(fdid, path.to_string());
        }

        debug!(
            "Parsed listfile: {} paths, {} lines skipped",
            listfile.paths.len(),
            skipped
        );
        listfile
    }

    /// Path of a file data ID
    pub fn path(&self, fdid: FileDataId) -> Option<&str> {
        self.paths.get(&fdid).map(String::as_str)
    }

    /// File data ID of a path, matched through its name hash
    pub fn file_data_id(&self, path: &str) -> Option<FileDataId> {
        self.by_name_hash(name_hash(path))
    }

    /// File data ID of a name hash
    pub fn by_name_hash(&self, hash: u64) -> Option<FileDataId> {
        self.hashes.get(&hash).copied()
    }

    /// Number of paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path was parsed
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
