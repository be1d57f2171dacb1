//! In-memory and file-backed [`KeyValueStore`] implementations.

use crate::KeyValueStore;
use nestkit_core::error::{NestkitError, NestkitResult};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Volatile store with an optional quota.
///
/// The quota counts key and value bytes, the way browsers size storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> NestkitResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> NestkitResult<()> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self.items.get(key).map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(NestkitError::Storage(format!(
                    "quota exceeded: {needed} bytes needed, {quota} allowed"
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> NestkitResult<()> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Store persisted as one JSON object on disk, rewritten on every change.
///
/// ```ignore
/// let mut store = FileStore::open("/tmp/nestkit.json")?;
/// store.set_item("theme", "dark")?;
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStore {
    /// Loads `path` if it exists; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> NestkitResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(NestkitError::InvalidInput(
                "store path must not be empty".into(),
            ));
        }

        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                NestkitError::Storage(format!("corrupt store {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(NestkitError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), items = items.len(), "opened file store");
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the store, so the
    /// previous contents survive a failed or interrupted write.
    fn flush(&self) -> NestkitResult<()> {
        let storage_err = |e: &dyn std::fmt::Display| {
            NestkitError::Storage(format!("failed to write {}: {e}", self.path.display()))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(|e| storage_err(&e))?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, &self.items).map_err(|e| storage_err(&e))?;
        let tmp = writer.into_inner().map_err(|e| storage_err(e.error()))?;
        tmp.as_file().sync_all().map_err(|e| storage_err(&e))?;
        tmp.persist(&self.path).map_err(|e| storage_err(&e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> NestkitResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> NestkitResult<()> {
        let previous = self.items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.items.insert(key.to_string(), old),
                None => self.items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> NestkitResult<()> {
        if let Some(old) = self.items.remove(key) {
            if let Err(e) = self.flush() {
                self.items.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_quota_rejects_oversized_write() {
        let mut store = MemoryStore::new().with_quota(10);
        store.set_item("k", "12345").unwrap();
        let err = store.set_item("k2", "123456").unwrap_err();
        assert!(matches!(err, NestkitError::Storage(_)));
        assert_eq!(store.get_item("k2").unwrap(), None);
    }

    #[test]
    fn memory_quota_counts_replacement() {
        let mut store = MemoryStore::new().with_quota(6);
        store.set_item("k", "12345").unwrap();
        store.set_item("k", "54321").unwrap();
        assert_eq!(store.used_bytes(), 6);
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        store.remove_item("a").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("a").unwrap(), None);
        assert_eq!(reopened.get_item("b").unwrap(), Some("2".into()));
        assert_eq!(reopened.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let mut store = FileStore::open(sub.join("store.json")).unwrap();
        store.set_item("a", "1").unwrap();
        fs::remove_dir_all(&sub).unwrap();

        assert!(matches!(
            store.set_item("a", "2"),
            Err(NestkitError::Storage(_))
        ));
        assert_eq!(store.get_item("a").unwrap(), Some("1".into()));

        assert!(store.set_item("b", "x").is_err());
        assert_eq!(store.get_item("b").unwrap(), None);

        assert!(store.remove_item("a").is_err());
        assert_eq!(store.get_item("a").unwrap(), Some("1".into()));
    }

    #[test]
    fn flush_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set_item("a", "1").unwrap();
        store.set_item("a", "2").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"a":"2"}"#);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(NestkitError::Storage(_))
        ));
    }

    #[test]
    fn file_store_empty_path_is_invalid() {
        assert!(matches!(
            FileStore::open(""),
            Err(NestkitError::InvalidInput(_))
        ));
    }
}
