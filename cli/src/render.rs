//! Plain-text and JSON views.

use std::fmt::Write as _;

use serde_json::{Value, json};

use dawa_engine::dawa_types::{Capability, Role, VerificationRecord, WasteAnalysis};
use dawa_engine::{
    FlagSplit, InspectorNarrative, count_all, count_flagged, distinct_locales, flag_counts,
    locale_reports, split_by_flag,
};

pub const NOT_SAVED_WARNING: &str =
    "Warning: the result could not be saved and will be lost when dawa exits.";

const BAR_WIDTH: usize = 24;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn verdict(record: &VerificationRecord) -> &'static str {
    if record.is_flagged() {
        "SUSPECTED FAKE"
    } else {
        "Authentic"
    }
}

/// Full result of one verification.
pub fn record_card(record: &VerificationRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", record.subject_name(), verdict(record));
    let _ = writeln!(out, "  Manufacturer:   {}", record.issuer());
    let _ = writeln!(out, "  Official price: {}", record.reference_price());
    let _ = writeln!(out, "  City:           {}", record.locale());
    let _ = writeln!(
        out,
        "  Checked:        {}",
        record.created_at().format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", record.local_summary());
    let _ = write!(out, "  {}", record.translated_summary());
    out
}

/// One line per record, newest first.
pub fn cabinet(records: &[VerificationRecord]) -> String {
    if records.is_empty() {
        return "No verifications yet.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{}  {:<10} {:<15} {} ({})",
            record.created_at().format(TIMESTAMP_FORMAT),
            record.locale(),
            verdict(record),
            record.subject_name(),
            record.reference_price()
        );
    }
    out
}

fn bar(count: usize, total: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        (count * BAR_WIDTH).div_ceil(total).min(BAR_WIDTH)
    };
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn split_chart(records: &[VerificationRecord]) -> String {
    let chart = split_by_flag(records);
    let exact = flag_counts(records);
    let total = chart.authentic + chart.flagged;
    format!(
        "  Authentic  {} {}\n  Flagged    {} {}\n",
        bar(chart.authentic, total),
        exact.authentic,
        bar(chart.flagged, total),
        exact.flagged
    )
}

pub fn dashboard(
    role: Role,
    records: &[VerificationRecord],
    narrative: Option<&InspectorNarrative>,
) -> String {
    let mut out = String::new();
    for capability in role.capabilities() {
        match capability {
            Capability::Overview => {
                let _ = writeln!(out, "Overview");
                let _ = writeln!(out, "  Verified: {}", count_all(records));
                out.push_str(&split_chart(records));
            }
            Capability::Scan => {
                let _ = writeln!(out, "Scan: dawa scan <photo> [--locale <city>]");
            }
            Capability::Cabinet => {
                let _ = writeln!(out, "Cabinet");
                for line in cabinet(records).lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
            Capability::Markets => {
                let _ = writeln!(out, "Markets");
                let rows = locale_reports(records);
                if rows.is_empty() {
                    let _ = writeln!(out, "  No field reports.");
                }
                for row in rows {
                    let _ = writeln!(
                        out,
                        "  {:<10} {:>4} reports  {:>4} flagged",
                        row.locale, row.reports, row.flagged
                    );
                }
            }
            Capability::Analytics => {
                let _ = writeln!(out, "Analytics");
                let _ = writeln!(out, "  Total reports:  {}", count_all(records));
                let _ = writeln!(out, "  Flagged:        {}", count_flagged(records));
                let _ = writeln!(out, "  Active cities:  {}", distinct_locales(records).len());
            }
            Capability::PolicyNarrative => {
                if let Some(narrative) = narrative {
                    let _ = writeln!(out, "Action plan");
                    for line in narrative.display().lines() {
                        let _ = writeln!(out, "  {line}");
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

fn split_json(split: FlagSplit) -> Value {
    json!({ "authentic": split.authentic, "flagged": split.flagged })
}

pub fn dashboard_json(
    role: Role,
    records: &[VerificationRecord],
    narrative: Option<&InspectorNarrative>,
) -> Value {
    match role {
        Role::Citizen => json!({
            "role": role,
            "verified": count_all(records),
            "split": split_json(flag_counts(records)),
            "cabinet": records,
        }),
        Role::Inspector => json!({
            "role": role,
            "totalReports": count_all(records),
            "flagged": count_flagged(records),
            "activeCities": distinct_locales(records),
            "markets": locale_reports(records)
                .into_iter()
                .map(|row| json!({
                    "city": row.locale,
                    "reports": row.reports,
                    "flagged": row.flagged,
                }))
                .collect::<Vec<_>>(),
            "narrative": narrative.and_then(InspectorNarrative::text),
        }),
    }
}

pub fn waste_card(analysis: &WasteAnalysis) -> String {
    format!(
        "{} ({})\n  Recyclable: {}\n  Confidence: {}%\n  {}",
        analysis.item,
        analysis.category,
        if analysis.recyclable { "yes" } else { "no" },
        analysis.confidence_percent(),
        analysis.instructions
    )
}
