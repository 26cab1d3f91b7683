//! Read-only aggregations over a history snapshot.
//!
//! Everything here is a pure function of the records passed in; callers
//! re-query the store and recompute rather than caching results.

use std::collections::{BTreeMap, BTreeSet};

use dawa_providers::NarrativeClient;
use dawa_types::{Locale, VerificationRecord};

/// Shown in place of a narrative that was never produced.
pub const NO_NARRATIVE: &str = "No narrative available.";

#[must_use]
pub fn count_all(records: &[VerificationRecord]) -> usize {
    records.len()
}

#[must_use]
pub fn count_flagged(records: &[VerificationRecord]) -> usize {
    records.iter().filter(|r| r.is_flagged()).count()
}

#[must_use]
pub fn distinct_locales(records: &[VerificationRecord]) -> BTreeSet<Locale> {
    records.iter().map(VerificationRecord::locale).collect()
}

/// Report count per city. Cities with no reports are absent.
#[must_use]
pub fn group_by_locale(records: &[VerificationRecord]) -> BTreeMap<Locale, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.locale()).or_insert(0) += 1;
    }
    counts
}

/// Authentic vs. flagged counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSplit {
    pub authentic: usize,
    pub flagged: usize,
}

/// Exact authentic/flagged counts.
#[must_use]
pub fn flag_counts(records: &[VerificationRecord]) -> FlagSplit {
    let flagged = count_flagged(records);
    FlagSplit {
        authentic: records.len() - flagged,
        flagged,
    }
}

/// Split for chart rendering: an empty history reports one authentic entry so
/// the chart is never degenerate. Use [`flag_counts`] for anything numeric.
#[must_use]
pub fn split_by_flag(records: &[VerificationRecord]) -> FlagSplit {
    if records.is_empty() {
        return FlagSplit {
            authentic: 1,
            flagged: 0,
        };
    }
    flag_counts(records)
}

/// Per-city row of the market view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: Locale,
    pub reports: usize,
    pub flagged: usize,
}

#[must_use]
pub fn locale_reports(records: &[VerificationRecord]) -> Vec<LocaleReport> {
    let mut rows: BTreeMap<Locale, LocaleReport> = BTreeMap::new();
    for record in records {
        let row = rows.entry(record.locale()).or_insert(LocaleReport {
            locale: record.locale(),
            reports: 0,
            flagged: 0,
        });
        row.reports += 1;
        if record.is_flagged() {
            row.flagged += 1;
        }
    }
    rows.into_values().collect()
}

/// Holder for the inspector's generated action plan.
///
/// A failed refresh leaves the previous text in place.
#[derive(Debug, Default, Clone)]
pub struct InspectorNarrative {
    text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeRefresh {
    Updated,
    /// The call failed; any earlier narrative is still shown.
    Unavailable,
}

impl InspectorNarrative {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(
        &mut self,
        client: &dyn NarrativeClient,
        records: &[VerificationRecord],
    ) -> NarrativeRefresh {
        match client.summarize(records).await {
            Ok(text) if !text.trim().is_empty() => {
                self.text = Some(text);
                NarrativeRefresh::Updated
            }
            Ok(_) => {
                tracing::warn!("Narrative service returned empty text");
                NarrativeRefresh::Unavailable
            }
            Err(e) => {
                tracing::warn!("Narrative refresh failed: {e}");
                NarrativeRefresh::Unavailable
            }
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Narrative text, or [`NO_NARRATIVE`].
    #[must_use]
    pub fn display(&self) -> &str {
        self.text().unwrap_or(NO_NARRATIVE)
    }
}
