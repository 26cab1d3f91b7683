//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dawa_history::{HistoryStore, MemoryBackend};
use dawa_providers::{AnalysisClient, AnalysisError, AnalysisFut, GeminiConfig};
use dawa_types::{
    ApiKey, CapturedImage, ImageMime, Locale, NonEmptyString, ScanFacts, VerificationRecord,
};

pub const TEST_API_KEY: &str = "test-gemini-key";

/// Smallest buffer that passes the JPEG signature check.
pub fn jpeg() -> CapturedImage {
    CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], ImageMime::Jpeg).unwrap()
}

pub fn facts(name: &str, flagged: bool) -> ScanFacts {
    let text = |s: &str| NonEmptyString::new(s).unwrap();
    ScanFacts {
        subject_name: text(name),
        issuer: text("Getz Pharma"),
        reference_price: text("PKR 320"),
        is_flagged: flagged,
        local_summary: text("دن میں دو بار کھانے کے بعد لیں۔"),
        translated_summary: text("Take twice daily after meals."),
    }
}

pub fn record(name: &str, locale: Locale, flagged: bool) -> VerificationRecord {
    VerificationRecord::from_facts(facts(name, flagged), locale, Utc::now())
}

pub fn record_at(
    name: &str,
    locale: Locale,
    flagged: bool,
    created_at: DateTime<Utc>,
) -> VerificationRecord {
    VerificationRecord::from_facts(facts(name, flagged), locale, created_at)
}

/// Store backed by memory, already seeded.
pub fn memory_store() -> Arc<HistoryStore> {
    Arc::new(HistoryStore::open(Arc::new(MemoryBackend::new())).unwrap())
}

/// Answers every request with a record for `name`, counting calls.
pub struct FakeAnalyzer {
    name: &'static str,
    flagged: bool,
    calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn new(name: &'static str, flagged: bool) -> Self {
        Self {
            name,
            flagged,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisClient for FakeAnalyzer {
    fn analyze<'a>(
        &'a self,
        _image: &'a CapturedImage,
        locale: Locale,
    ) -> AnalysisFut<'a, VerificationRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let record = record(self.name, locale, self.flagged);
        Box::pin(async move { Ok(record) })
    }
}

/// Always fails with a service error.
pub struct FailingAnalyzer;

impl AnalysisClient for FailingAnalyzer {
    fn analyze<'a>(
        &'a self,
        _image: &'a CapturedImage,
        _locale: Locale,
    ) -> AnalysisFut<'a, VerificationRecord> {
        Box::pin(async { Err(AnalysisError::Service("quota exhausted".into())) })
    }
}

/// Holds every call open until [`GatedAnalyzer::release`].
pub struct GatedAnalyzer {
    pub started: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedAnalyzer {
    pub fn new() -> Self {
        Self {
            started: Notify::new(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisClient for GatedAnalyzer {
    fn analyze<'a>(
        &'a self,
        _image: &'a CapturedImage,
        locale: Locale,
    ) -> AnalysisFut<'a, VerificationRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.started.notify_one();
            self.gate.notified().await;
            Ok(record("Augmentin", locale, false))
        })
    }
}

/// Start a mock server that simulates the Gemini API
pub async fn start_gemini_mock() -> MockServer {
    MockServer::start().await
}

pub fn gemini_config(server: &MockServer) -> GeminiConfig {
    GeminiConfig::new(ApiKey::new(TEST_API_KEY).unwrap())
        .with_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(5))
}

/// `generateContent` envelope whose single candidate answers with `text`.
pub fn gemini_text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 1290,
            "candidatesTokenCount": 84
        }
    })
}

pub fn verification_json(name: &str, flagged: bool) -> String {
    serde_json::json!({
        "medName": name,
        "manufacturer": "Abbott Laboratories (Pakistan)",
        "officialPrice": "PKR 145",
        "isSuspectedFake": flagged,
        "urduInstructions": "ہر چھ گھنٹے بعد ایک گولی۔",
        "englishSummary": "One tablet every six hours for pain."
    })
    .to_string()
}

/// Mount a successful answer for `model`, requiring the API key header.
pub async fn mount_gemini_text(server: &MockServer, model: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{model}:generateContent")))
        .and(header("x-goog-api-key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(text)))
        .mount(server)
        .await;
}

pub async fn mount_gemini_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_gemini_json(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
