// Cache layer: the per-step response files act as a crude cache so a
// re-run skips remote calls that already succeeded. Modeled as a small
// store keyed by step name with pluggable backing; the flow only ever
// sees `CacheStore`.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Cache keys are step names; values are the last JSON response the
/// remote returned for that step. Writes overwrite, reads of missing
/// entries yield `None`.
pub trait CacheStore {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn store(&self, key: &str, value: &Value) -> Result<()>;
    /// Human-readable location of an entry, for log messages.
    fn describe(&self, key: &str) -> String;
}

/// File-backed cache. Entries live in `dir` as pretty-printed JSON named
/// `<prefix>_<key>.json`, mirroring the remote response schema verbatim.
pub struct FileStore {
    dir: PathBuf,
    prefix: String,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
        FileStore {
            dir: dir.into(),
            prefix: prefix.to_string(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, key))
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file {}", path.display()))?;
        let value = serde_json::from_str(&data)
            .with_context(|| format!("Cache file {} is not valid JSON", path.display()))?;
        Ok(Some(value))
    }

    fn store(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path(key);
        let data = serde_json::to_string_pretty(value).context("Serializing cache entry")?;
        std::fs::write(&path, data)
            .with_context(|| format!("Failed to write cache file {}", path.display()))?;
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }
}

/// In-memory cache for tests. A `Mutex` keeps the trait usable from
/// shared references.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().expect("cache lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: &Value) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn describe(&self, key: &str) -> String {
        format!("memory:{}", key)
    }
}

/// Write the auth credentials next to the cache files, pretty-printed, so
/// a later run can re-authenticate without flags.
pub fn write_json_file(path: &Path, value: &Value) -> Result<()> {
    let data = serde_json::to_string_pretty(value).context("Serializing JSON file")?;
    std::fs::write(path, data)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a pretty-printed JSON file back into a value.
pub fn read_json_file(path: &Path) -> Result<Value> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "run1");
        let resp = json!({
            "success": true,
            "indexed": true,
            "message": "Document indexed",
        });

        store.store("upload_document", &resp).unwrap();
        let loaded = store.load("upload_document").unwrap();
        assert_eq!(loaded, Some(resp));
    }

    #[test]
    fn file_store_names_entries_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "report");
        store.store("extract_information", &json!({"success": true})).unwrap();

        assert!(dir.path().join("report_extract_information.json").exists());
    }

    #[test]
    fn file_store_pretty_prints_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "run1");
        store
            .store("upload_document", &json!({"success": true, "message": "ok"}))
            .unwrap();

        let raw =
            std::fs::read_to_string(dir.path().join("run1_upload_document.json")).unwrap();
        assert!(raw.contains('\n'));
    }

    #[test]
    fn missing_entry_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), "run1");
        assert_eq!(store.load("upload_document").unwrap(), None);
    }

    #[test]
    fn memory_store_overwrites_on_repeat_store() {
        let store = MemoryStore::new();
        store.store("upload_document", &json!({"indexed": false})).unwrap();
        store.store("upload_document", &json!({"indexed": true})).unwrap();
        assert_eq!(
            store.load("upload_document").unwrap(),
            Some(json!({"indexed": true}))
        );
    }
}
