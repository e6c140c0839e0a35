use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage::{read_json_optional, write_json_atomic};

/// Registry value meaning "reviewed, no suitable canonical entry exists".
pub const UNMATCHED: &str = "Unable to match";

/// Raw ingredient name -> canonical nutrition name or [`UNMATCHED`].
pub type Matches = BTreeMap<String, String>;

/// Owns the cached match mapping and the file that mirrors it. Nothing else
/// reads or writes that file.
#[derive(Debug)]
pub struct MatchRegistry {
    path: PathBuf,
    cache: Option<Matches>,
}

impl MatchRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current mapping, read from disk on first access. A missing file is a
    /// first run and yields an empty mapping.
    pub fn get_or_init(&mut self) -> Result<&Matches, StorageError> {
        if self.cache.is_none() {
            let matches: Matches = read_json_optional(&self.path)?.unwrap_or_default();
            info!(path = %self.path.display(), entries = matches.len(), "match registry loaded");
            self.cache = Some(matches);
        }
        Ok(self.cache.get_or_insert_with(Matches::new))
    }

    /// Persists `matches` and makes it the cached mapping. Refuses any mapping
    /// that would drop a key already known to this session.
    pub fn save(&mut self, matches: Matches) -> Result<(), StorageError> {
        let current = self.get_or_init()?;
        let dropped: Vec<String> = current
            .keys()
            .filter(|k| !matches.contains_key(*k))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            return Err(StorageError::KeysDropped { keys: dropped });
        }

        write_json_atomic(&self.path, &matches)?;
        debug!(path = %self.path.display(), entries = matches.len(), "match registry saved");
        self.cache = Some(matches);
        Ok(())
    }

    /// Records one operator decision and persists it.
    pub fn record(&mut self, raw_name: &str, selection: &str) -> Result<(), StorageError> {
        let mut matches = self.get_or_init()?.clone();
        matches.insert(raw_name.to_string(), selection.to_string());
        self.save(matches)
    }
}
