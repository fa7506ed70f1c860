//! # Durable Session Storage
//!
//! Key/value storage that survives a restart. The session store keeps two
//! keys here: the bearer token and the serialized identity.
//!
//! ## Atomic multi-key updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set_many / remove_many                                                 │
//! │                                                                         │
//! │  session.json  ──read──►  { "auth_token": .., "auth_user": .. }        │
//! │                                   │                                     │
//! │                                   ▼  apply every change in memory       │
//! │                                                                         │
//! │  session.json.tmp  ◄──write──  new document                             │
//! │          │                                                              │
//! │          └──rename──►  session.json                                     │
//! │                                                                         │
//! │  A crash before the rename leaves the old document; after it, the new  │
//! │  one. A reader never sees one key changed without the other.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Key holding the opaque bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Key holding the identity JSON.
pub const IDENTITY_KEY: &str = "auth_user";

/// Durable key/value storage.
///
/// `set_many` and `remove_many` must apply all of their keys or none.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;

    fn set_many(&self, entries: &[(&str, &str)]) -> ClientResult<()>;

    fn remove_many(&self, keys: &[&str]) -> ClientResult<()>;
}

fn storage_err(err: impl std::fmt::Display) -> ClientError {
    ClientError::StorageFailed(err.to_string())
}

// =============================================================================
// File Storage
// =============================================================================

/// One JSON document on disk, replaced wholesale on every write.
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> ClientResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(storage_err),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn write_document(&self, doc: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let contents = serde_json::to_string_pretty(doc)?;
        std::fs::write(&tmp, contents).map_err(storage_err)?;
        std::fs::rename(&tmp, &self.path).map_err(storage_err)?;

        debug!(path = ?self.path, keys = doc.len(), "Session document written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> ClientResult<()> {
        let _guard = self.write_lock.lock().map_err(storage_err)?;
        // A corrupt document is replaced rather than blocking logout forever.
        let mut doc = self.read_document().unwrap_or_default();
        apply(&mut doc);
        self.write_document(&doc)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> ClientResult<()> {
        self.update(|doc| {
            for (key, value) in entries {
                doc.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> ClientResult<()> {
        self.update(|doc| {
            for key in keys {
                doc.remove(*key);
            }
        })
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-process storage for tests and for running without a data directory.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().map_err(storage_err)?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> ClientResult<()> {
        let mut entries = self.entries.lock().map_err(storage_err)?;
        for (key, value) in pairs {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> ClientResult<()> {
        let mut entries = self.entries.lock().map_err(storage_err)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
