//! Local key-value persistence for the access token and saved resumes.
//!
//! Components receive a [`KeyValueStore`] explicitly; nothing reaches for
//! ambient global storage.

use crate::auth::Credential;
use crate::error::{Result, ScouterError};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Key the access token is stored under.
pub const TOKEN_KEY: &str = "github_token";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

fn poisoned() -> ScouterError {
    ScouterError::Storage("store lock poisoned".to_string())
}

/// Volatile store, used by tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk. Every write is flushed
/// immediately.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    ScouterError::Storage(format!("{} is not a valid store: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "opened store");
        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// `power-scouter/store.json` under the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("power-scouter").join("store.json"))
            .ok_or_else(|| {
                ScouterError::Storage("no config directory on this platform; pass --store".to_string())
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the store, so a
    /// crash never leaves a truncated store behind.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let contents = serde_json::to_string_pretty(entries)?;
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Validates and persists a token. Invalid tokens are never written.
pub fn save_token<S: KeyValueStore>(store: &S, raw: &str) -> Result<Credential> {
    let credential = Credential::parse(raw)?;
    store.set(TOKEN_KEY, credential.secret())?;
    Ok(credential)
}

/// The saved token, if one is present and still well-formed.
pub fn load_token<S: KeyValueStore>(store: &S) -> Result<Option<Credential>> {
    match store.get(TOKEN_KEY)? {
        Some(raw) => Ok(Credential::parse(&raw).ok()),
        None => Ok(None),
    }
}

pub fn clear_token<S: KeyValueStore>(store: &S) -> Result<()> {
    store.remove(TOKEN_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_token_round_trip() {
        let store = MemoryStore::new();
        assert!(load_token(&store).unwrap().is_none());

        save_token(&store, "ghp_roundtrip").unwrap();
        let loaded = load_token(&store).unwrap().unwrap();
        assert_eq!(loaded.secret(), "ghp_roundtrip");

        clear_token(&store).unwrap();
        assert!(load_token(&store).unwrap().is_none());
    }

    #[test]
    fn test_invalid_token_not_saved() {
        let store = MemoryStore::new();
        assert!(save_token(&store, "not-a-token").is_err());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }
}
