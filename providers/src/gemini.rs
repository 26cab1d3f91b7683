//! Google Gemini client (GenerateContent API, non-streaming).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use dawa_types::{CapturedImage, Locale, ModelName, VerificationRecord, WasteAnalysis};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::wire::{Response, VerificationPayload};
use crate::{
    AnalysisClient, AnalysisError, AnalysisFut, GeminiConfig, NarrativeClient, WasteClassifier,
    http_client_with_timeout, prompts, read_capped_error_body,
};

/// Gemini-backed implementation of every client trait in this crate.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AnalysisError> {
        let https_only = config.base_url().starts_with("https://");
        let http = http_client_with_timeout(config.request_timeout(), https_only)?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &ModelName) -> String {
        format!("{}/models/{model}:generateContent", self.config.base_url())
    }

    /// POST `body` to `model` and return the answer text.
    async fn generate(&self, model: &ModelName, body: &Value) -> Result<String, AnalysisError> {
        let url = self.endpoint(model);
        tracing::debug!(%model, "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.config.api_key().as_str())
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_capped_error_body(response).await;
            tracing::warn!(%model, status, "Gemini request failed");
            return Err(AnalysisError::Status { status, body });
        }

        let raw = response.text().await?;
        let parsed: Response = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::MalformedResponse(format!("unexpected response envelope: {e}"))
        })?;

        if let Some(reason) = parsed.block_reason() {
            return Err(AnalysisError::Service(format!("prompt blocked ({reason})")));
        }

        match parsed.answer_text() {
            Some(text) => Ok(text),
            None => match parsed.finish_reason() {
                Some(reason) if reason != "STOP" => Err(AnalysisError::Service(format!(
                    "generation stopped ({reason})"
                ))),
                _ => Err(AnalysisError::MalformedResponse(
                    "response contained no answer text".to_string(),
                )),
            },
        }
    }

    async fn verify(
        &self,
        image: &CapturedImage,
        locale: Locale,
    ) -> Result<VerificationRecord, AnalysisError> {
        let body = structured_request_body(
            image,
            &prompts::verification_prompt(locale),
            prompts::verification_schema(),
        );
        let text = self.generate(self.config.analysis_model(), &body).await?;
        let payload: VerificationPayload = parse_structured(&text)?;
        let record = VerificationRecord::from_facts(payload.into(), locale, Utc::now());
        tracing::info!(
            record_id = %record.id(),
            %locale,
            flagged = record.is_flagged(),
            "Analysis complete"
        );
        Ok(record)
    }

    async fn narrative(&self, records: &[VerificationRecord]) -> Result<String, AnalysisError> {
        let body = text_request_body(&prompts::narrative_prompt(records));
        let text = self.generate(self.config.narrative_model(), &body).await?;
        Ok(text.trim().to_string())
    }

    async fn waste(&self, image: &CapturedImage) -> Result<WasteAnalysis, AnalysisError> {
        let body =
            structured_request_body(image, prompts::WASTE_PROMPT, prompts::waste_schema());
        let text = self.generate(self.config.analysis_model(), &body).await?;
        parse_structured(&text)
    }
}

impl AnalysisClient for GeminiClient {
    fn analyze<'a>(
        &'a self,
        image: &'a CapturedImage,
        locale: Locale,
    ) -> AnalysisFut<'a, VerificationRecord> {
        Box::pin(self.verify(image, locale))
    }
}

impl NarrativeClient for GeminiClient {
    fn summarize<'a>(&'a self, records: &'a [VerificationRecord]) -> AnalysisFut<'a, String> {
        Box::pin(self.narrative(records))
    }
}

impl WasteClassifier for GeminiClient {
    fn classify<'a>(&'a self, image: &'a CapturedImage) -> AnalysisFut<'a, WasteAnalysis> {
        Box::pin(self.waste(image))
    }
}

/// Build an image + instruction request constrained to `schema`.
///
/// Note: `generationConfig` and its keys are camelCase; `inlineData` carries
/// standard (padded) base64.
fn structured_request_body(image: &CapturedImage, prompt: &str, schema: Value) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": image.mime().as_str(),
                        "data": STANDARD.encode(image.bytes()),
                    }
                },
                { "text": prompt }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }
    })
}

fn text_request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    })
}

/// Decode the model's JSON answer, tolerating a Markdown code fence around it.
fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, AnalysisError> {
    let trimmed = strip_code_fence(text.trim());
    serde_json::from_str(trimmed).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
