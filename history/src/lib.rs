//! Durable, append-only history of verification records.
//!
//! [`HistoryStore`] is the single shared mutable resource of the application.
//! It keeps the sequence newest first, hands out immutable snapshots, and
//! rewrites its [`HistoryBackend`] after every append. The default backend is
//! a JSON array written through `dawa_utils::atomic_write`.

mod backend;
mod seed;
mod store;

pub use backend::{HISTORY_FILE_NAME, HistoryBackend, JsonFileBackend, MemoryBackend, PersistError};
pub use seed::{SEED_RECORD_ID, seed_record};
pub use store::{AppendError, AppendOutcome, HistoryStore, Snapshot};
