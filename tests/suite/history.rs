//! History persistence tests

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use dawa_engine::{ScanOutcome, ScanSession, ScanSettings};
use dawa_history::{
    AppendOutcome, HISTORY_FILE_NAME, HistoryBackend, HistoryStore, JsonFileBackend, PersistError,
    SEED_RECORD_ID,
};
use dawa_types::{Locale, VerificationRecord};

use crate::common::{FakeAnalyzer, jpeg, record};

#[test]
fn first_open_seeds_and_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::in_dir(dir.path());
    let path = backend.path().to_path_buf();
    assert!(path.ends_with(HISTORY_FILE_NAME));

    let store = HistoryStore::open(Arc::new(backend)).unwrap();
    assert_eq!(store.len(), 1);
    let all = store.all();
    let seed = &all[0];
    assert_eq!(seed.id().as_str(), SEED_RECORD_ID);
    assert_eq!(seed.subject_name(), "Panadol CF");
    assert_eq!(seed.locale(), Locale::Islamabad);
    assert!(!seed.is_flagged());

    let on_disk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let first = &on_disk[0];
    assert_eq!(first["id"], SEED_RECORD_ID);
    assert_eq!(first["locale"], "Islamabad");
    assert_eq!(first["isFlagged"], false);
    assert!(first["createdAt"].is_i64());
}

#[test]
fn reopen_restores_exact_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let store = HistoryStore::open(Arc::new(JsonFileBackend::new(&path))).unwrap();
    for (name, locale, flagged) in [
        ("Augmentin", Locale::Karachi, false),
        ("Arinac", Locale::Lahore, true),
        ("Calpol", Locale::Peshawar, false),
    ] {
        let outcome = store.append(record(name, locale, flagged)).unwrap();
        assert!(outcome.is_persisted());
    }
    let before = store.all();
    assert_eq!(before.len(), 4);
    drop(store);

    let reopened = HistoryStore::open(Arc::new(JsonFileBackend::new(&path))).unwrap();
    let restored = reopened.all();
    assert_eq!(&*restored, &*before);
    assert_eq!(restored[0].subject_name(), "Calpol");
    assert!(restored[1].is_flagged());
    assert_eq!(restored[3].id().as_str(), SEED_RECORD_ID);
}

#[test]
fn identical_content_is_kept_twice() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(Arc::new(JsonFileBackend::in_dir(dir.path()))).unwrap();

    let _ = store.append(record("Disprin", Locale::Karachi, false)).unwrap();
    let _ = store.append(record("Disprin", Locale::Karachi, false)).unwrap();

    let all = store.all();
    assert_eq!(all.len(), 3);
    assert_ne!(all[0].id(), all[1].id());
}

#[test]
fn corrupt_file_is_reported_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    fs::write(&path, "[{\"id\": \"half").unwrap();

    let err = HistoryStore::open(Arc::new(JsonFileBackend::new(&path))).unwrap_err();
    assert!(matches!(err, PersistError::Corrupt { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"id\": \"half");
}

#[test]
fn leftover_backup_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let store = HistoryStore::open(Arc::new(JsonFileBackend::new(&path))).unwrap();
    let _ = store.append(record("Flagyl", Locale::Lahore, false)).unwrap();
    let expected = store.all();
    drop(store);

    // Simulate a crash between moving the old file aside and renaming the new one.
    let backup = path.with_extension("bak");
    fs::rename(&path, &backup).unwrap();

    let reopened = HistoryStore::open(Arc::new(JsonFileBackend::new(&path))).unwrap();
    assert_eq!(&*reopened.all(), &*expected);
}

/// Has history but refuses every write.
struct ReadOnlyBackend;

impl HistoryBackend for ReadOnlyBackend {
    fn load(&self) -> Result<Option<Vec<VerificationRecord>>, PersistError> {
        Ok(Some(Vec::new()))
    }

    fn save(&self, _records: &[VerificationRecord]) -> Result<(), PersistError> {
        Err(PersistError::Unavailable("read-only volume".into()))
    }
}

#[tokio::test]
async fn unsaved_scan_still_completes() {
    let store = Arc::new(HistoryStore::open(Arc::new(ReadOnlyBackend)).unwrap());
    assert!(store.is_empty());

    let session = ScanSession::new(
        Arc::new(FakeAnalyzer::new("Brufen", false)),
        Arc::clone(&store),
        ScanSettings {
            min_display: Duration::ZERO,
            ..ScanSettings::default()
        },
    );

    match session.capture(Some(jpeg()), Locale::Karachi).await.unwrap() {
        ScanOutcome::Completed {
            record,
            persistence: AppendOutcome::MemoryOnly(PersistError::Unavailable(_)),
        } => assert_eq!(store.all()[0], record),
        other => panic!("expected in-memory completion, got {other:?}"),
    }
    assert_eq!(store.len(), 1);
}
