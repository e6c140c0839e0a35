//! Whole-file JSON persistence shared by the recipe store and the match registry.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::StorageError;

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.to_path_buf(), source }
}

/// Reads and parses a JSON file. `Ok(None)` when the file does not exist.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })
}

/// Reads and parses a JSON file that must exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    read_json_optional(path)?.ok_or_else(|| StorageError::NotFound { path: path.to_path_buf() })
}

/// Serializes with a 4-space indent, leaving non-ASCII text unescaped.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Replaces `path` with the serialized value. The data goes to a temporary file in the
/// same directory first and is renamed over the target only once fully synced.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = to_pretty_json(value)
        .map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    tmp.write_all(&bytes).map_err(|e| io_error(path, e))?;
    tmp.flush().map_err(|e| io_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_none_or_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let optional: Option<BTreeMap<String, String>> = read_json_optional(&path).unwrap();
        assert!(optional.is_none());
        let required = read_json::<BTreeMap<String, String>>(&path);
        assert!(matches!(required, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = read_json::<BTreeMap<String, String>>(&path);
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_atomic_write_replaces_and_keeps_unicode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, "old content").unwrap();

        let mut value = BTreeMap::new();
        value.insert("胡萝卜".to_string(), "Carrots, raw".to_string());
        write_json_atomic(&path, &value).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"胡萝卜\": \"Carrots, raw\"\n}");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file should have been renamed away");
    }
}
