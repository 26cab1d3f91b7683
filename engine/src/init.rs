//! Process start-up: locating the data directory and opening the history.

use std::path::PathBuf;
use std::sync::Arc;

use dawa_history::{HistoryStore, JsonFileBackend, PersistError};

use crate::config::DawaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirSource {
    System,
    /// No platform data directory; using `./dawa`.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct DataDir {
    pub path: PathBuf,
    pub source: DataDirSource,
}

#[must_use]
pub fn data_dir() -> DataDir {
    match dirs::data_local_dir() {
        Some(path) => DataDir {
            path: path.join("dawa"),
            source: DataDirSource::System,
        },
        None => DataDir {
            path: PathBuf::from(".").join("dawa"),
            source: DataDirSource::Fallback,
        },
    }
}

/// History backend: `[history].path` if configured, else the data directory.
///
/// Only the data directory is dawa's to harden; a configured path's parent is
/// created but otherwise left as the user set it up.
#[must_use]
pub fn history_backend(config: Option<&DawaConfig>) -> JsonFileBackend {
    if let Some(path) = config.and_then(DawaConfig::history_path) {
        return JsonFileBackend::new(path);
    }
    let dir = data_dir();
    if dir.source == DataDirSource::Fallback {
        tracing::warn!(
            path = %dir.path.display(),
            "No platform data directory; storing history in the working directory"
        );
    }
    JsonFileBackend::in_dir(&dir.path)
}

/// Open (or seed) the on-disk history.
pub fn open_history(config: Option<&DawaConfig>) -> Result<Arc<HistoryStore>, PersistError> {
    let backend = history_backend(config);
    tracing::debug!(path = %backend.path().display(), "Opening verification history");
    HistoryStore::open(Arc::new(backend)).map(Arc::new)
}
