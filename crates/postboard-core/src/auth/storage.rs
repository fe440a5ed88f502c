//! Durable key-value storage for the login.
//!
//! `KeyValueStore` is the browser-local-storage shaped seam; `FileStore`
//! keeps the entries in a JSON object on disk and `MemoryStore` keeps them
//! for the lifetime of the process. `AuthStorage` owns the three entries the
//! auth service cares about.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "local_storage.json";

pub const TOKEN_KEY: &str = "token";
pub const EXPIRATION_KEY: &str = "expiration";
pub const USER_ID_KEY: &str = "userID";

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// Key-value entries in a single JSON file, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store in `dir`. A missing file starts empty; an unreadable or
    /// corrupt one is logged and also starts empty.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(STORAGE_FILE);
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring unreadable storage file");
                BTreeMap::new()
            }
        };
        debug!(?path, entries = entries.len(), "Storage opened");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read storage file")?;
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// ============================================================================
// AuthStorage
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedAuth {
    pub token: String,
    pub expiration: DateTime<Utc>,
    pub user_id: String,
}

/// Reads and writes the persisted login.
#[derive(Clone)]
pub struct AuthStorage {
    store: Arc<dyn KeyValueStore>,
}

impl AuthStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Expiration timestamps are written as RFC 3339 UTC with millisecond precision.
    pub fn format_expiration(expiration: DateTime<Utc>) -> String {
        expiration.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Write the three entries in order. Stops at the first failed write.
    pub fn save(&self, token: &str, expiration: DateTime<Utc>, user_id: &str) -> Result<()> {
        self.store.set_item(TOKEN_KEY, token)?;
        self.store
            .set_item(EXPIRATION_KEY, &Self::format_expiration(expiration))?;
        self.store.set_item(USER_ID_KEY, user_id)?;
        Ok(())
    }

    /// Remove all three entries, attempting every removal even if one fails.
    pub fn clear(&self) -> Result<()> {
        let mut first_err = None;
        for key in [TOKEN_KEY, EXPIRATION_KEY, USER_ID_KEY] {
            if let Err(e) = self.store.remove_item(key) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// `None` when the token or expiration is missing, empty, or unparseable.
    /// A missing user id loads as an empty string.
    pub fn load(&self) -> Option<PersistedAuth> {
        let token = self.store.get_item(TOKEN_KEY).filter(|t| !t.is_empty())?;
        let raw_expiration = self.store.get_item(EXPIRATION_KEY).filter(|e| !e.is_empty())?;
        let expiration = match DateTime::parse_from_rfc3339(&raw_expiration) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                debug!(error = %e, value = %raw_expiration, "Persisted expiration is not a timestamp");
                return None;
            }
        };
        let user_id = self.store.get_item(USER_ID_KEY).unwrap_or_default();

        Some(PersistedAuth {
            token,
            expiration,
            user_id,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SubsecRound, TimeZone};
    use tempfile::TempDir;

    fn memory_storage() -> (Arc<MemoryStore>, AuthStorage) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), AuthStorage::new(store))
    }

    #[test]
    fn test_save_then_load_returns_same_values() {
        let (_, storage) = memory_storage();
        let expiration = Utc::now().trunc_subsecs(3);

        storage.save("abc", expiration, "u1").unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.token, "abc");
        assert_eq!(loaded.expiration, expiration);
        assert_eq!(loaded.user_id, "u1");
    }

    #[test]
    fn test_save_with_empty_user_id() {
        let (_, storage) = memory_storage();
        let expiration = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();

        storage.save("abc", expiration, "").unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.user_id, "");
        assert_eq!(loaded.expiration, expiration);
    }

    #[test]
    fn test_expiration_written_as_iso8601() {
        let (store, storage) = memory_storage();
        let expiration = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        storage.save("abc", expiration, "u1").unwrap();
        assert_eq!(
            store.get_item(EXPIRATION_KEY).as_deref(),
            Some("2030-01-02T03:04:05.000Z")
        );
    }

    #[test]
    fn test_load_requires_token_and_expiration() {
        let (store, storage) = memory_storage();
        assert!(storage.load().is_none());

        store.set_item(TOKEN_KEY, "abc").unwrap();
        assert!(storage.load().is_none());

        store.remove_item(TOKEN_KEY).unwrap();
        store.set_item(EXPIRATION_KEY, "2030-01-02T03:04:05.000Z").unwrap();
        assert!(storage.load().is_none());

        store.set_item(TOKEN_KEY, "").unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_missing_user_id_tolerated() {
        let (store, storage) = memory_storage();
        store.set_item(TOKEN_KEY, "abc").unwrap();
        store.set_item(EXPIRATION_KEY, "2030-01-02T03:04:05.000Z").unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.user_id, "");
    }

    #[test]
    fn test_unparseable_expiration_is_absent() {
        let (store, storage) = memory_storage();
        store.set_item(TOKEN_KEY, "abc").unwrap();
        store.set_item(EXPIRATION_KEY, "next tuesday").unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_clear_removes_all_entries() {
        let (store, storage) = memory_storage();
        storage.save("abc", Utc::now(), "u1").unwrap();
        assert_eq!(store.len(), 3);

        storage.clear().unwrap();
        assert!(store.is_empty());
        assert!(storage.load().is_none());

        // Clearing an empty store is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let expiration = Utc::now().trunc_subsecs(3);

        {
            let storage = AuthStorage::new(Arc::new(FileStore::open(dir.path())));
            storage.save("abc", expiration, "u1").unwrap();
        }

        let storage = AuthStorage::new(Arc::new(FileStore::open(dir.path())));
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.token, "abc");
        assert_eq!(loaded.expiration, expiration);
        assert_eq!(loaded.user_id, "u1");
    }

    #[test]
    fn test_file_store_clear_persists() {
        let dir = TempDir::new().unwrap();
        let storage = AuthStorage::new(Arc::new(FileStore::open(dir.path())));
        storage.save("abc", Utc::now(), "u1").unwrap();
        storage.clear().unwrap();

        let reopened = FileStore::open(dir.path());
        assert!(reopened.get_item(TOKEN_KEY).is_none());
        assert!(reopened.get_item(EXPIRATION_KEY).is_none());
        assert!(reopened.get_item(USER_ID_KEY).is_none());
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "{not json").unwrap();

        let store = FileStore::open(dir.path());
        assert!(store.get_item(TOKEN_KEY).is_none());

        // And the next write replaces the corrupt file
        store.set_item(TOKEN_KEY, "abc").unwrap();
        let reopened = FileStore::open(dir.path());
        assert_eq!(reopened.get_item(TOKEN_KEY).as_deref(), Some("abc"));
    }
}
