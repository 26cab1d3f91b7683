//! Typed `generateContent` response structures and service payloads.

use dawa_types::{NonEmptyString, ScanFacts};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Response {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    pub text: Option<String>,
    /// Reasoning parts are never part of the answer.
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl Response {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub(crate) fn answer_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub(crate) fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
    }

    pub(crate) fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
    }
}

/// JSON object the verification schema asks for.
///
/// Every field is mandatory and text fields must be non-blank; any deviation
/// is a deserialization error rather than a defaulted value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationPayload {
    med_name: NonEmptyString,
    manufacturer: NonEmptyString,
    official_price: NonEmptyString,
    is_suspected_fake: bool,
    urdu_instructions: NonEmptyString,
    english_summary: NonEmptyString,
}

impl From<VerificationPayload> for ScanFacts {
    fn from(payload: VerificationPayload) -> Self {
        ScanFacts {
            subject_name: payload.med_name,
            issuer: payload.manufacturer,
            reference_price: payload.official_price,
            is_flagged: payload.is_suspected_fake,
            local_summary: payload.urdu_instructions,
            translated_summary: payload.english_summary,
        }
    }
}
