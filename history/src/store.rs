//! The append-only verification history.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dawa_types::{RecordId, VerificationRecord};
use thiserror::Error;

use crate::backend::{HistoryBackend, PersistError};
use crate::seed::seed_record;

/// Immutable view of the history at one point in time, newest first.
pub type Snapshot = Arc<[VerificationRecord]>;

/// Whether an accepted record also reached the backend.
///
/// The record is in memory either way.
#[derive(Debug)]
#[must_use]
pub enum AppendOutcome {
    Persisted,
    MemoryOnly(PersistError),
}

impl AppendOutcome {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, AppendOutcome::Persisted)
    }
}

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("record id {0} is already in the history")]
    DuplicateId(RecordId),
}

/// Ordered collection of completed verification records.
///
/// Construct one per process and share it by `Arc`. Appends are serialized
/// by an internal lock and each one replaces the snapshot and rewrites the
/// backend in a single step, so persisted order always matches call order.
pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    records: Mutex<Snapshot>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("len", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl HistoryStore {
    /// Restore the history from `backend`, seeding it on first run.
    ///
    /// A backend with prior state is restored verbatim. A backend with no state
    /// gets exactly one illustrative record; failing to persist that seed is
    /// logged and otherwise ignored. A corrupt or unreadable backend is an
    /// error so that existing data is never overwritten.
    pub fn open(backend: Arc<dyn HistoryBackend>) -> Result<Self, PersistError> {
        let records: Vec<VerificationRecord> = match backend.load()? {
            Some(records) => {
                tracing::info!(count = records.len(), "Restored verification history");
                records
            }
            None => {
                let seeded = vec![seed_record(Utc::now())];
                if let Err(e) = backend.save(&seeded) {
                    tracing::warn!("Failed to persist seeded history: {e}");
                } else {
                    tracing::info!("Seeded empty verification history");
                }
                seeded
            }
        };

        Ok(Self {
            backend,
            records: Mutex::new(records.into()),
        })
    }

    /// Prepend `record` and persist the whole sequence.
    ///
    /// Two appends of identical content produce two entries; only a repeated
    /// id is refused.
    pub fn append(&self, record: VerificationRecord) -> Result<AppendOutcome, AppendError> {
        let mut current = self.lock();
        if current.iter().any(|existing| existing.id() == record.id()) {
            return Err(AppendError::DuplicateId(record.id().clone()));
        }

        let record_id = record.id().clone();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(record);
        next.extend(current.iter().cloned());

        let outcome = match self.backend.save(&next) {
            Ok(()) => AppendOutcome::Persisted,
            Err(e) => {
                tracing::warn!(%record_id, "History autosave failed, keeping record in memory: {e}");
                AppendOutcome::MemoryOnly(e)
            }
        };

        *current = next.into();
        tracing::debug!(%record_id, len = current.len(), "Appended verification record");
        Ok(outcome)
    }

    /// Current contents, newest first. Re-query to observe later appends.
    #[must_use]
    pub fn all(&self) -> Snapshot {
        Arc::clone(&self.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
