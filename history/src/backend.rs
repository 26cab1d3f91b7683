//! Storage backends for the verification history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dawa_types::VerificationRecord;
use dawa_utils::{AtomicWriteOptions, FileSyncPolicy, PersistMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read history from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("history file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write history to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("history backend unavailable: {0}")]
    Unavailable(String),
}

/// Where the history sequence lives between runs.
///
/// `load` returns `Ok(None)` when nothing has ever been saved, which is what
/// triggers seeding. `save` always receives the complete sequence, newest first.
pub trait HistoryBackend: Send + Sync {
    fn load(&self) -> Result<Option<Vec<VerificationRecord>>, PersistError>;
    fn save(&self, records: &[VerificationRecord]) -> Result<(), PersistError>;
}

/// File name of the persisted history blob.
pub const HISTORY_FILE_NAME: &str = "dawaverify_history_v2.json";

/// JSON array on disk, rewritten wholesale through an atomic rename.
///
/// The file itself is always owner-only. Its parent directory is hardened
/// (0700, ownership checked) only when it is dawa's own data directory.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    owns_parent: bool,
}

impl JsonFileBackend {
    /// Backend for a user-chosen file. The parent directory is created if
    /// missing but its permissions are left alone.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owns_parent: false,
        }
    }

    /// Backend for the standard file name inside dawa's own `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILE_NAME),
            owns_parent: true,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<Vec<VerificationRecord>>, PersistError> {
        dawa_utils::recover_bak_file(&self.path);

        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| PersistError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, records: &[VerificationRecord]) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(records).map_err(PersistError::Encode)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            let prepared = if self.owns_parent {
                dawa_utils::ensure_secure_dir(parent)
            } else {
                fs::create_dir_all(parent)
            };
            prepared.map_err(|source| PersistError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        dawa_utils::atomic_write_with_options(
            &self.path,
            json.as_bytes(),
            AtomicWriteOptions {
                file_sync: FileSyncPolicy::SyncAll,
                mode: PersistMode::OwnerOnly,
            },
        )
        .map_err(|source| PersistError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Volatile backend: state lasts as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Mutex<Option<Vec<VerificationRecord>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `records` already "on disk".
    #[must_use]
    pub fn with_records(records: Vec<VerificationRecord>) -> Self {
        Self {
            saved: Mutex::new(Some(records)),
        }
    }

    /// Last saved sequence, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Vec<VerificationRecord>> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Vec<VerificationRecord>>, PersistError> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[VerificationRecord]) -> Result<(), PersistError> {
        *self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(records.to_vec());
        Ok(())
    }
}
