use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::{Locale, NonEmptyString, RecordId};

/// Facts the analysis service extracts from a packaging photo.
///
/// This is the service-owned half of a [`VerificationRecord`]; the id, the
/// completion time and the locale are filled in locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFacts {
    pub subject_name: NonEmptyString,
    pub issuer: NonEmptyString,
    pub reference_price: NonEmptyString,
    pub is_flagged: bool,
    pub local_summary: NonEmptyString,
    pub translated_summary: NonEmptyString,
}

/// Outcome of one successful verification attempt.
///
/// Records are immutable once created. The history store orders them by
/// insertion, so `created_at` is for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    id: RecordId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    subject_name: NonEmptyString,
    issuer: NonEmptyString,
    reference_price: NonEmptyString,
    is_flagged: bool,
    local_summary: NonEmptyString,
    translated_summary: NonEmptyString,
    locale: Locale,
}

impl VerificationRecord {
    /// Build a record with a fresh id stamped at `created_at`.
    #[must_use]
    pub fn from_facts(facts: ScanFacts, locale: Locale, created_at: DateTime<Utc>) -> Self {
        Self::with_id(RecordId::generate(), facts, locale, created_at)
    }

    /// `created_at` is truncated to whole milliseconds, the persisted precision.
    #[must_use]
    pub fn with_id(
        id: RecordId,
        facts: ScanFacts,
        locale: Locale,
        created_at: DateTime<Utc>,
    ) -> Self {
        let ScanFacts {
            subject_name,
            issuer,
            reference_price,
            is_flagged,
            local_summary,
            translated_summary,
        } = facts;
        Self {
            id,
            created_at: created_at.trunc_subsecs(3),
            subject_name,
            issuer,
            reference_price,
            is_flagged,
            local_summary,
            translated_summary,
            locale,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn subject_name(&self) -> &str {
        self.subject_name.as_str()
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        self.issuer.as_str()
    }

    #[must_use]
    pub fn reference_price(&self) -> &str {
        self.reference_price.as_str()
    }

    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    #[must_use]
    pub fn local_summary(&self) -> &str {
        self.local_summary.as_str()
    }

    #[must_use]
    pub fn translated_summary(&self) -> &str {
        self.translated_summary.as_str()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }
}
