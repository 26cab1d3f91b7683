//! Scan session lifecycle tests

use std::sync::Arc;
use std::time::Duration;

use dawa_engine::{ScanFailure, ScanOutcome, ScanPhase, ScanSession, ScanSettings, SessionError};
use dawa_providers::{AnalysisClient, AnalysisError};
use dawa_types::Locale;

use crate::common::{FailingAnalyzer, FakeAnalyzer, GatedAnalyzer, jpeg, memory_store};

fn instant() -> ScanSettings {
    ScanSettings {
        min_display: Duration::ZERO,
        ..ScanSettings::default()
    }
}

#[tokio::test]
async fn successful_scans_are_prepended() {
    let store = memory_store();
    let analyzer = Arc::new(FakeAnalyzer::new("Panadol Extra", false));

    for _ in 0..3 {
        let session = ScanSession::new(analyzer.clone(), Arc::clone(&store), instant());
        let outcome = session.capture(Some(jpeg()), Locale::Karachi).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Completed { .. }));
    }

    // Seed plus three scans.
    let all = store.all();
    assert_eq!(all.len(), 4);
    assert_eq!(analyzer.calls(), 3);
    assert_eq!(all[3].id().as_str(), dawa_history::SEED_RECORD_ID);
    assert!(all[..3].iter().all(|r| r.subject_name() == "Panadol Extra"));
}

#[tokio::test]
async fn flagged_lahore_scan_lands_first() {
    let store = memory_store();
    let session = ScanSession::new(
        Arc::new(FakeAnalyzer::new("Brufen 400", true)),
        Arc::clone(&store),
        instant(),
    );

    let record = match session.capture(Some(jpeg()), Locale::Lahore).await.unwrap() {
        ScanOutcome::Completed {
            record,
            persistence,
        } => {
            assert!(persistence.is_persisted());
            record
        }
        other => panic!("expected completion, got {other:?}"),
    };

    let all = store.all();
    let first = &all[0];
    assert_eq!(first, &record);
    assert!(first.is_flagged());
    assert_eq!(first.locale(), Locale::Lahore);
    assert_eq!(
        session.trail(),
        vec![
            ScanPhase::Idle,
            ScanPhase::Captured,
            ScanPhase::Submitting,
            ScanPhase::Completed
        ]
    );
}

#[tokio::test]
async fn failed_analysis_leaves_history_untouched() {
    let store = memory_store();
    let before = store.all();
    let session = ScanSession::new(Arc::new(FailingAnalyzer), Arc::clone(&store), instant());

    let outcome = session.capture(Some(jpeg()), Locale::Peshawar).await.unwrap();
    match outcome {
        ScanOutcome::Failed(ScanFailure::Analysis(AnalysisError::Service(_))) => {}
        other => panic!("expected analysis failure, got {other:?}"),
    }

    assert_eq!(
        session.trail(),
        vec![
            ScanPhase::Idle,
            ScanPhase::Captured,
            ScanPhase::Submitting,
            ScanPhase::Failed
        ]
    );
    assert_eq!(store.all(), before);
}

#[tokio::test]
async fn missing_image_is_ignored() {
    let store = memory_store();
    let analyzer = Arc::new(FakeAnalyzer::new("Flagyl", false));
    let session = ScanSession::new(analyzer.clone(), Arc::clone(&store), instant());

    let outcome = session.capture(None, Locale::Karachi).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Ignored));
    assert_eq!(session.phase(), ScanPhase::Idle);
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn capture_while_submitting_is_rejected() {
    let store = memory_store();
    let analyzer = Arc::new(GatedAnalyzer::new());
    let session = Arc::new(ScanSession::new(
        analyzer.clone() as Arc<dyn AnalysisClient>,
        Arc::clone(&store),
        instant(),
    ));

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.capture(Some(jpeg()), Locale::Islamabad).await }
    });

    analyzer.started.notified().await;
    assert_eq!(session.phase(), ScanPhase::Submitting);

    let second = session.capture(Some(jpeg()), Locale::Lahore).await;
    assert_eq!(second.unwrap_err(), SessionError::Busy);

    analyzer.release();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, ScanOutcome::Completed { .. }));
    assert_eq!(analyzer.calls(), 1);
    assert_eq!(store.len(), 2);

    let again = session.capture(Some(jpeg()), Locale::Lahore).await;
    assert_eq!(again.unwrap_err(), SessionError::Finished);
}

#[tokio::test]
async fn abandon_during_submit_discards_result() {
    let store = memory_store();
    let analyzer = Arc::new(GatedAnalyzer::new());
    let session = Arc::new(ScanSession::new(
        analyzer.clone() as Arc<dyn AnalysisClient>,
        Arc::clone(&store),
        instant(),
    ));

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.capture(Some(jpeg()), Locale::Karachi).await }
    });

    analyzer.started.notified().await;
    session.abandon();
    analyzer.release();

    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, ScanOutcome::Abandoned));
    assert_eq!(session.phase(), ScanPhase::Abandoned);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn abandon_before_capture_finishes_session() {
    let store = memory_store();
    let analyzer = Arc::new(FakeAnalyzer::new("Ponstan", false));
    let session = ScanSession::new(analyzer.clone(), Arc::clone(&store), instant());

    session.abandon();
    assert_eq!(session.phase(), ScanPhase::Abandoned);
    assert_eq!(
        session.capture(Some(jpeg()), Locale::Karachi).await.unwrap_err(),
        SessionError::Finished
    );
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn result_is_held_for_min_display() {
    let store = memory_store();
    let settings = ScanSettings {
        min_display: Duration::from_millis(1500),
        ..ScanSettings::default()
    };
    let session = ScanSession::new(
        Arc::new(FakeAnalyzer::new("Risek", false)),
        Arc::clone(&store),
        settings,
    );

    let started = tokio::time::Instant::now();
    let outcome = session.capture(Some(jpeg()), Locale::Karachi).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Completed { .. }));
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn abandon_during_min_display_discards_result() {
    let store = memory_store();
    let settings = ScanSettings {
        min_display: Duration::from_secs(10),
        ..ScanSettings::default()
    };
    let session = Arc::new(ScanSession::new(
        Arc::new(FakeAnalyzer::new("Risek", false)),
        Arc::clone(&store),
        settings,
    ));

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.capture(Some(jpeg()), Locale::Karachi).await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    session.abandon();

    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, ScanOutcome::Abandoned));
    assert_eq!(store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_analysis_times_out() {
    let store = memory_store();
    let settings = ScanSettings {
        min_display: Duration::ZERO,
        analysis_timeout: Duration::from_secs(45),
        ..ScanSettings::default()
    };
    let session = ScanSession::new(Arc::new(GatedAnalyzer::new()), Arc::clone(&store), settings);

    let outcome = session.capture(Some(jpeg()), Locale::Karachi).await.unwrap();
    match outcome {
        ScanOutcome::Failed(failure) => {
            assert!(matches!(
                failure,
                ScanFailure::Analysis(AnalysisError::TimedOut(_))
            ));
            assert!(!failure.user_message().is_empty());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(store.len(), 1);
}
