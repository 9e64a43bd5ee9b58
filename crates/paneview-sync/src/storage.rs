//! # Durable Session Storage
//!
//! One JSON record under the key `"auth"`, read once at startup, written on
//! every successful login and deleted on logout.
//!
//! ```text
//!   FileSessionStore    <storage_dir>/auth.json   (desktop / CLI hosts)
//!   MemorySessionStore  in-process slot           (tests, embedders)
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use paneview_core::StoredAuth;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Storage key of the session record.
pub const SESSION_STORAGE_KEY: &str = "auth";

pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing is stored.
    fn load(&self) -> StorageResult<Option<StoredAuth>>;

    fn save(&self, record: &StoredAuth) -> StorageResult<()>;

    /// Removing an absent record succeeds.
    fn remove(&self) -> StorageResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Stores the record as `<dir>/auth.json`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SESSION_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> StorageResult<Option<StoredAuth>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &StoredAuth) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            serde_json::to_string(record).map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Atomic replace via rename.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = ?self.path, "Session record saved");
        Ok(())
    }

    fn remove(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Session record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<StoredAuth>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: StoredAuth) -> Self {
        Self {
            slot: Mutex::new(Some(record)),
        }
    }

    /// Current contents, for assertions.
    pub fn snapshot(&self) -> Option<StoredAuth> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StorageResult<Option<StoredAuth>> {
        Ok(self.snapshot())
    }

    fn save(&self, record: &StoredAuth) -> StorageResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn remove(&self) -> StorageResult<()> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}
