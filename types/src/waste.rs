use serde::{Deserialize, Serialize};

use crate::NonEmptyString;

/// Result of the standalone waste-sorting classifier.
///
/// Never written to the verification history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteAnalysis {
    pub item: NonEmptyString,
    pub category: NonEmptyString,
    pub recyclable: bool,
    pub instructions: NonEmptyString,
    /// Model-reported confidence in `[0, 1]`.
    pub confidence: f64,
}

impl WasteAnalysis {
    /// Confidence as a whole percentage, clamped to `0..=100`.
    #[must_use]
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
