//! Clients for the external image-understanding service.
//!
//! # Architecture
//!
//! Three capabilities are exposed as object-safe traits so the scan lifecycle
//! and the dashboards can be driven by fakes in tests:
//!
//! - [`AnalysisClient`] - packaging photo + city in, [`VerificationRecord`] out
//! - [`NarrativeClient`] - recent records in, free-form action plan out
//! - [`WasteClassifier`] - photo in, [`WasteAnalysis`] out
//!
//! [`gemini::GeminiClient`] implements all three against the Gemini
//! `generateContent` API (non-streaming, JSON-constrained output).
//!
//! # Error Handling
//!
//! Every call resolves to an [`AnalysisError`]. Nothing here retries; a
//! response that does not match the requested schema is reported as
//! [`AnalysisError::MalformedResponse`] instead of being patched with defaults.

pub mod gemini;
mod prompts;
mod wire;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use dawa_types::{ApiKey, CapturedImage, Locale, ModelName, VerificationRecord, WasteAnalysis};
use thiserror::Error;

pub use dawa_types;
pub use gemini::GeminiClient;

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Boxed future returned by the client traits.
pub type AnalysisFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, AnalysisError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request to analysis service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("analysis service declined the request: {0}")]
    Service(String),
    #[error("analysis service did not answer within {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

/// Coarse failure class used for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Service unreachable, rejected the call, or timed out.
    AnalysisFailure,
    /// Service answered but the answer violated the schema.
    MalformedResponse,
}

impl AnalysisError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::MalformedResponse(_) => FailureKind::MalformedResponse,
            AnalysisError::Transport(_)
            | AnalysisError::Status { .. }
            | AnalysisError::Service(_)
            | AnalysisError::TimedOut(_) => FailureKind::AnalysisFailure,
        }
    }
}

/// Turns a packaging photo into a verification record.
pub trait AnalysisClient: Send + Sync {
    /// Analyze `image` taken in `locale`.
    ///
    /// The returned record carries a freshly generated id, the completion time,
    /// and `locale`.
    fn analyze<'a>(
        &'a self,
        image: &'a CapturedImage,
        locale: Locale,
    ) -> AnalysisFut<'a, VerificationRecord>;
}

/// Produces a prose action plan over recent field reports.
pub trait NarrativeClient: Send + Sync {
    fn summarize<'a>(&'a self, records: &'a [VerificationRecord]) -> AnalysisFut<'a, String>;
}

pub trait WasteClassifier: Send + Sync {
    fn classify<'a>(&'a self, image: &'a CapturedImage) -> AnalysisFut<'a, WasteAnalysis>;
}

/// Credentials, model selection, and endpoint for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: ApiKey,
    analysis_model: ModelName,
    narrative_model: ModelName,
    base_url: String,
    request_timeout: Duration,
}

impl GeminiConfig {
    #[must_use]
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            analysis_model: ModelName::ANALYSIS_DEFAULT,
            narrative_model: ModelName::NARRATIVE_DEFAULT,
            base_url: GEMINI_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_analysis_model(mut self, model: ModelName) -> Self {
        self.analysis_model = model;
        self
    }

    #[must_use]
    pub fn with_narrative_model(mut self, model: ModelName) -> Self {
        self.narrative_model = model;
        self
    }

    /// Point the client at a different API root (e.g. a local mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    #[must_use]
    pub fn analysis_model(&self) -> &ModelName {
        &self.analysis_model
    }

    #[must_use]
    pub fn narrative_model(&self) -> &ModelName {
        &self.narrative_model
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Build a client with a total request timeout.
///
/// Plain `http://` is only permitted when `https_only` is false, which callers
/// derive from the configured base URL.
pub fn http_client_with_timeout(
    timeout: Duration,
    https_only: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(https_only).timeout(timeout).build()
}

/// Read an error body, truncating anything past 32 KiB.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
