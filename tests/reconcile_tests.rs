// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciling upsert tests against the in-memory store.
//!
//! These tests verify that:
//! 1. Re-running a batch never creates duplicates
//! 2. Matching honors the tolerance window, strict mode and claims
//! 3. One failing record does not stop the rest of the batch

use chrono::{Duration, TimeZone};
use garmin_notion_sync::config::{LabelLocale, MatchMode};
use garmin_notion_sync::db::{properties, MemoryStore};
use garmin_notion_sync::models::{FieldValue, Outcome};
use garmin_notion_sync::services::{
    ActivityMapper, ActivitySchema, CategoryTable, IconTable, LabelTable, MatchSettings, Reconciler,
};

mod common;
use common::{activity, dated_fields, jst, split, FailingStore, FakeGarmin};

fn mapper() -> ActivityMapper {
    ActivityMapper::for_locale(LabelLocale::Japanese, jst())
}

fn lenient(minutes: i64) -> MatchSettings {
    MatchSettings {
        tolerance: Duration::minutes(minutes),
        mode: MatchMode::Lenient,
    }
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let store = MemoryStore::new(jst());
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());
    let batch = vec![
        activity("1", "2024-03-01 22:30:00", "Morning Run", 10000.0),
        activity("2", "2024-03-03 22:30:00", "Long Run", 21000.0),
        activity("3", "2024-03-05 22:30:00", "Easy Run", 5000.0),
    ];

    let first = reconciler.reconcile(&batch).await;
    assert_eq!(first.created(), 3);

    let second = reconciler.reconcile(&batch).await;
    assert_eq!(second.created(), 0);
    assert_eq!(second.unchanged(), 3);
    assert_eq!(store.records().len(), 3);
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let store = MemoryStore::new(jst());
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());
    let record = activity("1", "2024-03-01 22:30:00", "Morning Run", 10000.0);

    reconciler.reconcile(std::slice::from_ref(&record)).await;
    let mut changed = record.clone();
    changed.metrics.distance_m = Some(10500.0);

    let updated = reconciler.reconcile(std::slice::from_ref(&changed)).await;
    assert_eq!(updated.updated(), 1);
    let after_first = store.records();

    let again = reconciler.reconcile(&[changed]).await;
    assert_eq!(again.unchanged(), 1);
    assert_eq!(store.records(), after_first);
    assert_eq!(
        after_first[0].number(properties::DISTANCE_KM),
        Some(10.5)
    );
}

#[tokio::test]
async fn test_tolerance_edge_is_matched() {
    let store = MemoryStore::new(jst());
    let start = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
    let existing = store.insert(dated_fields(start + Duration::minutes(5)));
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, lenient(5));

    let report = reconciler
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Run", 5000.0)])
        .await;

    assert_eq!(
        report.outcome_for("1"),
        Some(&Outcome::Updated {
            destination_id: existing
        })
    );
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_one_second_past_tolerance_creates() {
    let store = MemoryStore::new(jst());
    let start = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
    store.insert(dated_fields(
        start + Duration::minutes(5) + Duration::seconds(1),
    ));
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, lenient(5));

    let report = reconciler
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Run", 5000.0)])
        .await;

    assert_eq!(report.created(), 1);
    assert_eq!(store.records().len(), 2);
}

#[tokio::test]
async fn test_failure_is_isolated_to_one_record() {
    let store = FailingStore::new(&["Run 3"]);
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());
    let batch: Vec<_> = (1..=5)
        .map(|i| {
            activity(
                &i.to_string(),
                &format!("2024-03-{:02} 22:30:00", i * 3),
                &format!("Run {}", i),
                5000.0,
            )
        })
        .collect();

    let report = reconciler.reconcile(&batch).await;

    assert_eq!(report.records.len(), 5);
    assert_eq!(report.created(), 4);
    assert_eq!(report.errors(), 1);
    assert!(matches!(report.outcome_for("3"), Some(Outcome::Error { .. })));
    assert!(!report.all_failed());
    assert_eq!(store.inner.records().len(), 4);
}

#[tokio::test]
async fn test_every_record_failing_marks_batch_failed() {
    let store = FailingStore::always_failing();
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());

    let report = reconciler
        .reconcile(&[
            activity("1", "2024-03-01 22:30:00", "Run", 5000.0),
            activity("2", "2024-03-02 22:30:00", "Run", 5000.0),
        ])
        .await;
    assert!(report.all_failed());
}

#[tokio::test]
async fn test_strict_mode_requires_category_and_title() {
    let start = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
    let mapper = mapper();
    let record = activity("1", "2024-03-01 22:30:00", "Morning Run", 5000.0);

    let seed = |store: &MemoryStore| {
        let mut fields = dated_fields(start);
        fields.insert(
            properties::CATEGORY.to_string(),
            FieldValue::Select("サイクリング".to_string()),
        );
        fields.insert(
            properties::NAME.to_string(),
            FieldValue::Title("Commute".to_string()),
        );
        store.insert(fields)
    };

    let strict_store = MemoryStore::new(jst());
    seed(&strict_store);
    let strict = MatchSettings {
        mode: MatchMode::Strict,
        ..MatchSettings::default()
    };
    let report = Reconciler::new(&strict_store, &mapper, strict)
        .reconcile(std::slice::from_ref(&record))
        .await;
    assert_eq!(report.created(), 1);
    assert_eq!(strict_store.records().len(), 2);

    let lenient_store = MemoryStore::new(jst());
    seed(&lenient_store);
    let report = Reconciler::new(&lenient_store, &mapper, MatchSettings::default())
        .reconcile(&[record])
        .await;
    assert_eq!(report.updated(), 1);
    assert_eq!(lenient_store.records().len(), 1);
}

#[tokio::test]
async fn test_strict_mode_matches_same_activity() {
    let store = MemoryStore::new(jst());
    let mapper = mapper();
    let strict = MatchSettings {
        mode: MatchMode::Strict,
        ..MatchSettings::default()
    };
    let reconciler = Reconciler::new(&store, &mapper, strict);
    let batch = [activity("1", "2024-03-01 22:30:00", "Morning Run", 5000.0)];

    reconciler.reconcile(&batch).await;
    let second = reconciler.reconcile(&batch).await;
    assert_eq!(second.unchanged(), 1);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_two_activities_same_day_stay_separate() {
    let store = MemoryStore::new(jst());
    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());
    let batch = vec![
        activity("1", "2024-03-01 22:30:00", "Morning Run", 10000.0),
        activity("2", "2024-03-02 09:00:00", "Evening Run", 5000.0),
    ];

    let first = reconciler.reconcile(&batch).await;
    assert_eq!(first.created(), 2);

    let second = reconciler.reconcile(&batch).await;
    assert_eq!(second.created(), 0);
    assert_eq!(second.unchanged(), 2);

    let records = store.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text(properties::NAME), Some("Morning Run"));
    assert_eq!(records[1].text(properties::NAME), Some("Evening Run"));
}

#[tokio::test]
async fn test_destination_only_fields_survive_update() {
    let store = MemoryStore::new(jst());
    let start = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
    let mut fields = dated_fields(start);
    fields.insert(
        properties::COACH_ADVICE.to_string(),
        FieldValue::Text("Rest tomorrow".to_string()),
    );
    fields.insert("メモ".to_string(), FieldValue::Text("felt great".to_string()));
    let id = store.insert(fields);

    let mapper = mapper();
    let reconciler = Reconciler::new(&store, &mapper, MatchSettings::default());
    reconciler
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Morning Run", 10000.0)])
        .await;

    let record = store.get(&id).unwrap();
    assert_eq!(record.text("メモ"), Some("felt great"));
    assert_eq!(record.text(properties::COACH_ADVICE), Some("Rest tomorrow"));
    assert_eq!(record.number(properties::DISTANCE_KM), Some(10.0));
}

#[tokio::test]
async fn test_source_id_match_preferred() {
    let store = MemoryStore::new(jst());
    let start = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();

    let mut other = dated_fields(start);
    other.insert("Garmin ID".to_string(), FieldValue::Text("999".to_string()));
    store.insert(other);

    let mut own = dated_fields(start + Duration::hours(3));
    own.insert("Garmin ID".to_string(), FieldValue::Text("1".to_string()));
    let own_id = store.insert(own);

    let mapper = ActivityMapper::new(
        ActivitySchema::default().with_source_id("Garmin ID"),
        CategoryTable::default(),
        LabelTable::japanese(),
        IconTable::standard(),
        jst(),
    );
    let report = Reconciler::new(&store, &mapper, MatchSettings::default())
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Morning Run", 10000.0)])
        .await;

    assert_eq!(
        report.outcome_for("1"),
        Some(&Outcome::Updated {
            destination_id: own_id
        })
    );
}

#[tokio::test]
async fn test_lap_detail_fetched_when_not_embedded() {
    let store = MemoryStore::new(jst());
    let mut garmin = FakeGarmin::default();
    garmin
        .splits
        .insert("1".to_string(), vec![split(1, 1000.0, 300.0)]);
    let mapper = mapper();
    let reconciler =
        Reconciler::new(&store, &mapper, MatchSettings::default()).with_detail_source(&garmin);

    reconciler
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Run", 1000.0)])
        .await;

    let records = store.records();
    let record = &records[0];
    assert_eq!(
        record.text(properties::LAPS),
        Some("Lap 1: 1.00km, 5:00, 5:00 /km, 150bpm")
    );
    assert_eq!(*garmin.split_calls.lock().unwrap(), vec!["1".to_string()]);
}

#[tokio::test]
async fn test_embedded_splits_skip_detail_fetch() {
    let store = MemoryStore::new(jst());
    let garmin = FakeGarmin::default();
    let mapper = mapper();
    let reconciler =
        Reconciler::new(&store, &mapper, MatchSettings::default()).with_detail_source(&garmin);
    let mut record = activity("1", "2024-03-01 22:30:00", "Run", 1000.0);
    record.splits = Some(vec![split(1, 1000.0, 300.0)]);

    reconciler.reconcile(&[record]).await;
    assert!(garmin.split_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_lap_detail_failure_degrades() {
    let store = MemoryStore::new(jst());
    let garmin = FakeGarmin {
        fail_splits: true,
        ..FakeGarmin::default()
    };
    let mapper = mapper();
    let reconciler =
        Reconciler::new(&store, &mapper, MatchSettings::default()).with_detail_source(&garmin);

    let report = reconciler
        .reconcile(&[activity("1", "2024-03-01 22:30:00", "Run", 1000.0)])
        .await;

    assert_eq!(report.created(), 1);
    assert_eq!(store.records()[0].text(properties::LAPS), Some(""));
}
