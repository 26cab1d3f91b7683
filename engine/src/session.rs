//! Lifecycle of a single verification attempt.
//!
//! ```text
//! Idle ──capture──▶ Captured ──▶ Submitting ──ok──▶ Completed (record appended)
//!                                    │
//!                                    ├──error/timeout──▶ Failed
//!                                    └──abandon──────▶ Abandoned
//! ```
//!
//! A session is single-use. While it is submitting, further captures are
//! rejected rather than queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dawa_history::{AppendError, AppendOutcome, HistoryStore};
use dawa_providers::{AnalysisClient, AnalysisError, FailureKind};
use dawa_types::{CapturedImage, Locale, VerificationRecord};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Timing knobs for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// City used when the caller does not pick one.
    pub default_locale: Locale,
    /// Pause between receiving a result and surfacing it.
    pub min_display: Duration,
    /// Upper bound on one analysis call.
    pub analysis_timeout: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            min_display: Duration::from_millis(1500),
            analysis_timeout: Duration::from_secs(45),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    /// Image accepted and previewable.
    Captured,
    /// Exactly one analysis call in flight.
    Submitting,
    Completed,
    Failed,
    /// The host gave up on the session; no record will be appended.
    Abandoned,
}

impl ScanPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ScanPhase::Completed | ScanPhase::Failed | ScanPhase::Abandoned
        )
    }
}

/// Capture refused without touching the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a verification is already in progress")]
    Busy,
    #[error("this scan session has already finished")]
    Finished,
}

#[derive(Debug, Error)]
pub enum ScanFailure {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    History(#[from] AppendError),
}

impl ScanFailure {
    /// Generic message for end users; details go to the log.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanFailure::Analysis(e) if e.kind() == FailureKind::MalformedResponse => {
                "Verification failed: the result could not be read. Try a clearer photo."
            }
            ScanFailure::Analysis(_) => {
                "Verification failed. Check your connection and API key, then try again."
            }
            ScanFailure::History(_) => "Verification failed. Please scan again.",
        }
    }
}

#[derive(Debug)]
pub enum ScanOutcome {
    /// The capture carried no image; the session is unchanged.
    Ignored,
    Completed {
        record: VerificationRecord,
        persistence: AppendOutcome,
    },
    Failed(ScanFailure),
    Abandoned,
}

struct SessionState {
    phase: ScanPhase,
    trail: Vec<ScanPhase>,
}

/// One verification attempt.
///
/// All methods take `&self`; share the session (e.g. in an `Arc`) with
/// whatever may deliver further capture events or abandon it.
pub struct ScanSession {
    client: Arc<dyn AnalysisClient>,
    store: Arc<HistoryStore>,
    settings: ScanSettings,
    cancel: CancellationToken,
    state: Mutex<SessionState>,
}

impl ScanSession {
    #[must_use]
    pub fn new(
        client: Arc<dyn AnalysisClient>,
        store: Arc<HistoryStore>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            client,
            store,
            settings,
            cancel: CancellationToken::new(),
            state: Mutex::new(SessionState {
                phase: ScanPhase::Idle,
                trail: vec![ScanPhase::Idle],
            }),
        }
    }

    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        self.lock().phase
    }

    /// Every phase entered so far, starting with `Idle`.
    #[must_use]
    pub fn trail(&self) -> Vec<ScanPhase> {
        self.lock().trail.clone()
    }

    /// Token that abandons this session when cancelled.
    #[must_use]
    pub fn abandon_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Give up on the session. An in-flight call is dropped and its result,
    /// if any, is never appended.
    pub fn abandon(&self) {
        self.cancel.cancel();
        let mut state = self.lock();
        if state.phase == ScanPhase::Idle {
            Self::enter(&mut state, ScanPhase::Abandoned);
        }
    }

    /// Feed a capture event into the session and drive it to a terminal phase.
    ///
    /// `None` models a capture dialog that returned no file and is ignored.
    pub async fn capture(
        &self,
        image: Option<CapturedImage>,
        locale: Locale,
    ) -> Result<ScanOutcome, SessionError> {
        let Some(image) = image else {
            tracing::debug!("Capture without an image ignored");
            return Ok(ScanOutcome::Ignored);
        };

        {
            let mut state = self.lock();
            match state.phase {
                ScanPhase::Idle => Self::enter(&mut state, ScanPhase::Captured),
                ScanPhase::Captured | ScanPhase::Submitting => {
                    tracing::debug!("Capture rejected: session busy");
                    return Err(SessionError::Busy);
                }
                ScanPhase::Completed | ScanPhase::Failed | ScanPhase::Abandoned => {
                    return Err(SessionError::Finished);
                }
            }
        }
        tracing::info!(%locale, bytes = image.len(), mime = %image.mime(), "Image captured");

        self.set_phase(ScanPhase::Submitting);
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(self.abandoned()),
            result = self.analyze_with_timeout(&image, locale) => result,
        };

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%locale, "Verification failed: {e}");
                self.set_phase(ScanPhase::Failed);
                return Ok(ScanOutcome::Failed(e.into()));
            }
        };

        if !self.settings.min_display.is_zero() {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {}
                () = tokio::time::sleep(self.settings.min_display) => {}
            }
        }
        if self.cancel.is_cancelled() {
            tracing::info!(record_id = %record.id(), "Discarding result of abandoned session");
            return Ok(self.abandoned());
        }

        match self.store.append(record.clone()) {
            Ok(persistence) => {
                self.set_phase(ScanPhase::Completed);
                tracing::info!(
                    record_id = %record.id(),
                    flagged = record.is_flagged(),
                    persisted = persistence.is_persisted(),
                    "Verification completed"
                );
                Ok(ScanOutcome::Completed {
                    record,
                    persistence,
                })
            }
            Err(e) => {
                tracing::warn!("Verification result rejected by history: {e}");
                self.set_phase(ScanPhase::Failed);
                Ok(ScanOutcome::Failed(e.into()))
            }
        }
    }

    async fn analyze_with_timeout(
        &self,
        image: &CapturedImage,
        locale: Locale,
    ) -> Result<VerificationRecord, AnalysisError> {
        let limit = self.settings.analysis_timeout;
        match tokio::time::timeout(limit, self.client.analyze(image, locale)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::TimedOut(limit)),
        }
    }

    fn abandoned(&self) -> ScanOutcome {
        self.set_phase(ScanPhase::Abandoned);
        ScanOutcome::Abandoned
    }

    fn set_phase(&self, phase: ScanPhase) {
        Self::enter(&mut self.lock(), phase);
    }

    fn enter(state: &mut SessionState, phase: ScanPhase) {
        tracing::debug!(from = ?state.phase, to = ?phase, "Scan phase transition");
        state.phase = phase;
        state.trail.push(phase);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
