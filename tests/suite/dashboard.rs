//! Dashboard projection tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use dawa_engine::{
    FlagSplit, InspectorNarrative, LocaleReport, NO_NARRATIVE, NarrativeRefresh, count_all,
    count_flagged, distinct_locales, flag_counts, group_by_locale, locale_reports, split_by_flag,
};
use dawa_history::{HistoryStore, MemoryBackend};
use dawa_providers::GeminiClient;
use dawa_types::{Capability, Locale, ModelName, Role};

use crate::common::{
    gemini_config, memory_store, mount_gemini_status, mount_gemini_text, record, record_at,
    start_gemini_mock,
};

#[test]
fn empty_history_split_has_authentic_floor() {
    let store = HistoryStore::open(Arc::new(MemoryBackend::with_records(Vec::new()))).unwrap();
    let all = store.all();
    assert!(all.is_empty());

    assert_eq!(
        split_by_flag(&all),
        FlagSplit {
            authentic: 1,
            flagged: 0
        }
    );
    assert_eq!(count_all(&all), 0);
    assert!(distinct_locales(&all).is_empty());
    assert!(locale_reports(&all).is_empty());
}

#[test]
fn three_records_two_flagged() {
    let records = vec![
        record("Arinac", Locale::Lahore, true),
        record("Brufen", Locale::Karachi, true),
        record("Calpol", Locale::Lahore, false),
    ];

    assert_eq!(
        split_by_flag(&records),
        FlagSplit {
            authentic: 1,
            flagged: 2
        }
    );
    assert_eq!(flag_counts(&records), split_by_flag(&records));
    assert_eq!(count_flagged(&records), 2);
    assert_eq!(group_by_locale(&records).get(&Locale::Lahore), Some(&2));
    assert_eq!(
        locale_reports(&records),
        vec![
            LocaleReport {
                locale: Locale::Karachi,
                reports: 1,
                flagged: 1
            },
            LocaleReport {
                locale: Locale::Lahore,
                reports: 2,
                flagged: 1
            },
        ]
    );
}

#[test]
fn projections_follow_store_appends() {
    let store = memory_store();
    assert_eq!(count_all(&store.all()), 1);
    assert_eq!(distinct_locales(&store.all()).len(), 1);

    let earlier = Utc::now() - Duration::days(3);
    let _ = store
        .append(record_at("Arinac", Locale::Peshawar, true, earlier))
        .unwrap();

    let all = store.all();
    assert_eq!(count_all(&all), 2);
    assert_eq!(count_flagged(&all), 1);
    // Insertion order wins over timestamps.
    assert_eq!(all[0].subject_name(), "Arinac");
    assert_eq!(
        distinct_locales(&all).into_iter().collect::<Vec<_>>(),
        vec![Locale::Islamabad, Locale::Peshawar]
    );
}

#[test]
fn roles_gate_dashboard_views() {
    assert_eq!(Role::Citizen.landing(), Capability::Overview);
    assert_eq!(Role::Inspector.landing(), Capability::Markets);
    assert!(!Role::Citizen.can(Capability::PolicyNarrative));
    assert!(Role::Inspector.can(Capability::Analytics));
}

#[tokio::test]
async fn narrative_survives_later_failure() {
    let good = start_gemini_mock().await;
    mount_gemini_text(
        &good,
        ModelName::NARRATIVE_DEFAULT.as_str(),
        "1. Audit Lahore distributors.",
    )
    .await;
    let failing = start_gemini_mock().await;
    mount_gemini_status(&failing, 429, "quota").await;

    let records = vec![record("Arinac", Locale::Lahore, true)];
    let mut narrative = InspectorNarrative::new();
    assert_eq!(narrative.display(), NO_NARRATIVE);

    let client = GeminiClient::new(gemini_config(&good)).unwrap();
    assert_eq!(
        narrative.refresh(&client, &records).await,
        NarrativeRefresh::Updated
    );
    assert_eq!(narrative.display(), "1. Audit Lahore distributors.");

    let client = GeminiClient::new(gemini_config(&failing)).unwrap();
    assert_eq!(
        narrative.refresh(&client, &records).await,
        NarrativeRefresh::Unavailable
    );
    assert_eq!(narrative.display(), "1. Audit Lahore distributors.");
}
