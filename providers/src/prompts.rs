//! Prompt text and response schemas sent to Gemini.

use dawa_types::{Locale, VerificationRecord};
use serde_json::{Value, json};

/// Instructions for reading a medicine package photo.
pub(crate) fn verification_prompt(locale: Locale) -> String {
    format!(
        "You are a pharmaceutical expert in Pakistan. Analyze this medicine packaging, \
         photographed by a customer in {locale}.\n\
         1. Identify the Medicine Name and Manufacturer.\n\
         2. Check if the packaging looks consistent with authorized products in Pakistan.\n\
         3. Provide a very simple 2-line summary in English.\n\
         4. Provide a very simple 2-line summary in URDU (using Urdu script) for a common \
         person to understand usage/warnings.\n\
         5. State the typical DRAP-regulated MRP (Maximum Retail Price) for this item in PKR.\n\
         Return the result in JSON format."
    )
}

/// Field names are the service-side contract; they are mapped onto
/// [`dawa_types::ScanFacts`] after parsing.
pub(crate) fn verification_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "medName": { "type": "STRING" },
            "manufacturer": { "type": "STRING" },
            "officialPrice": { "type": "STRING" },
            "isSuspectedFake": { "type": "BOOLEAN" },
            "urduInstructions": { "type": "STRING" },
            "englishSummary": { "type": "STRING" }
        },
        "required": [
            "medName",
            "manufacturer",
            "officialPrice",
            "isSuspectedFake",
            "urduInstructions",
            "englishSummary"
        ]
    })
}

pub(crate) const WASTE_PROMPT: &str = "Identify the waste item in this image and provide \
     category, recyclability status, and instructions in JSON format.";

pub(crate) fn waste_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "item": { "type": "STRING" },
            "category": { "type": "STRING" },
            "recyclable": { "type": "BOOLEAN" },
            "instructions": { "type": "STRING" },
            "confidence": { "type": "NUMBER" }
        },
        "required": ["item", "category", "recyclable", "instructions", "confidence"]
    })
}

/// One line per record, e.g. `Panadol CF in Islamabad (Valid)`.
pub(crate) fn field_report_line(record: &VerificationRecord) -> String {
    let verdict = if record.is_flagged() {
        "Fake Suspect"
    } else {
        "Valid"
    };
    format!(
        "{} in {} ({verdict})",
        record.subject_name(),
        record.locale()
    )
}

pub(crate) fn narrative_prompt(records: &[VerificationRecord]) -> String {
    let reports = records
        .iter()
        .map(field_report_line)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Acting as a Drug Health Inspector in Pakistan, analyze these recent field reports: \
         {reports}.\n\
         Provide a strategic 3-point action plan for the Health Ministry to address any \
         emerging clusters of counterfeit drugs or price violations.\n\
         Mention specific concerns for cities mentioned."
    )
}
