//! Persistent session store for the authenticated user
//!
//! Credentials live in a JSON file so a login survives process restarts.
//! The store is shared (behind an `Arc`) between the API client and any
//! viewer sessions, replacing the ambient global the hosted client used.

use std::path::PathBuf;
use std::sync::RwLock;

use maquette_core::Credentials;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Holds the current user's credentials, persisted across restarts
pub struct SessionStore {
    /// Backing file; `None` keeps the store memory-only (tests)
    path: Option<PathBuf>,
    current: RwLock<Option<Credentials>>,
}

impl SessionStore {
    /// Open a store backed by the given file, loading any persisted
    /// credentials. A missing file means signed-out; an unreadable or
    /// corrupt file is logged and treated the same way.
    pub fn open(path: PathBuf) -> Self {
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Credentials>(&content) {
                Ok(creds) => {
                    info!(path = %path.display(), user = %creds.username, "Loaded session");
                    Some(creds)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read session file");
                None
            }
        };

        Self {
            path: Some(path),
            current: RwLock::new(current),
        }
    }

    /// Create a store with no backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Credentials> {
        self.current.read().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.read().unwrap().as_ref().map(|c| c.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    /// Set the current credentials and persist them
    pub fn store(&self, creds: Credentials) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(&creds)?;
            std::fs::write(path, content)?;
            debug!(path = %path.display(), user = %creds.username, "Persisted session");
        }
        *self.current.write().unwrap() = Some(creds);
        Ok(())
    }

    /// Forget the current credentials and remove the backing file.
    /// Idempotent; removal failures are logged, never surfaced.
    pub fn clear(&self) {
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Removed session file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove session file"),
            }
        }
        *self.current.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            token: "tok".to_string(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
        }
    }

    #[test]
    fn test_store_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = SessionStore::open(path.clone());
        assert!(!store.is_authenticated());
        store.store(creds()).unwrap();

        let reopened = SessionStore::open(path);
        assert_eq!(reopened.current(), Some(creds()));
        assert_eq!(reopened.token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = SessionStore::open(path.clone());
        store.store(creds()).unwrap();
        store.clear();
        store.clear();
        assert!(!store.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::open(path);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_in_memory_store() {
        let store = SessionStore::in_memory();
        store.store(creds()).unwrap();
        assert!(store.is_authenticated());
        store.clear();
        assert!(store.current().is_none());
    }
}
