use chrono::{DateTime, Duration, Utc};
use dawa_types::{Locale, NonEmptyString, RecordId, ScanFacts, VerificationRecord};

/// Id of the illustrative record written on first run.
pub const SEED_RECORD_ID: &str = "seed-1";

/// The single example record a brand-new history starts with, dated one day
/// before `now`.
#[must_use]
pub fn seed_record(now: DateTime<Utc>) -> VerificationRecord {
    VerificationRecord::with_id(
        RecordId::new(SEED_RECORD_ID),
        ScanFacts {
            subject_name: fixed("Panadol CF"),
            issuer: fixed("GSK Pakistan"),
            reference_price: fixed("PKR 380"),
            is_flagged: false,
            local_summary: fixed("یہ زکام اور بخار کے لیے ہے۔ بڑوں کے لیے دن میں دو بار ایک گولی۔"),
            translated_summary: fixed("Effective for flu and fever. Adults: 1 tab twice daily."),
        },
        Locale::Islamabad,
        now - Duration::days(1),
    )
}

fn fixed(text: &'static str) -> NonEmptyString {
    NonEmptyString::new(text).unwrap_or_else(|_| unreachable!("seed text is non-empty"))
}
