// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily condition sync: one destination record per calendar day.

use chrono::{Duration, NaiveDate};

use crate::db::{properties::daily as p, DestinationStore};
use crate::error::StoreError;
use crate::models::{
    DailyMetrics, DateCondition, DateValue, FieldValue, Fields, Filter, NewRecord, Outcome, Query,
    SyncReport,
};
use crate::services::format::round_to;
use crate::services::garmin::WellnessSource;

/// Fetch every wellness metric for `date`. A failed metric is logged and
/// left empty.
pub async fn collect_daily(wellness: &dyn WellnessSource, date: NaiveDate) -> DailyMetrics {
    let mut metrics = DailyMetrics::empty(date);

    metrics.hrv = ok_or_warn(wellness.hrv(date).await, date, "hrv");
    metrics.rhr = ok_or_warn(wellness.resting_hr(date).await, date, "resting_hr");
    metrics.sleep_score = ok_or_warn(wellness.sleep_score(date).await, date, "sleep_score");
    if let Some(steps) = ok_or_warn(wellness.steps(date).await, date, "steps") {
        metrics.total_steps = steps.total_steps;
        metrics.step_goal = steps.step_goal;
        metrics.total_distance_km = steps.total_distance.map(|m| round_to(m / 1000.0, 2));
    }

    metrics
}

fn ok_or_warn<T, E: std::fmt::Display>(
    result: Result<Option<T>, E>,
    date: NaiveDate,
    metric: &str,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(%date, metric, error = %e, "Failed to fetch wellness metric");
            None
        }
    }
}

/// Title of a newly created daily record.
pub fn daily_title(date: NaiveDate) -> String {
    format!("{} の記録", date.format("%Y-%m-%d"))
}

/// Fields written for a day. Missing metrics are omitted, never nulled.
pub fn daily_fields(metrics: &DailyMetrics) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        p::DATE.to_string(),
        FieldValue::Date(DateValue::day(metrics.date)),
    );

    let numbers = [
        (p::HRV, metrics.hrv),
        (p::RESTING_HR, metrics.rhr),
        (p::SLEEP_SCORE, metrics.sleep_score),
        (p::STEPS, metrics.total_steps),
        (p::STEP_GOAL, metrics.step_goal),
        (p::WALK_DISTANCE_KM, metrics.total_distance_km),
    ];
    for (property, value) in numbers {
        if let Some(v) = value {
            fields.insert(property.to_string(), FieldValue::Number(v));
        }
    }
    fields
}

/// Update the record for `metrics.date`, or create it.
pub async fn upsert_daily(
    store: &dyn DestinationStore,
    metrics: &DailyMetrics,
) -> Result<Outcome, StoreError> {
    let query = Query::filtered(Filter::Date {
        property: p::DATE.to_string(),
        condition: DateCondition::Equals(metrics.date),
    })
    .with_limit(1);
    let existing = store.query(&query).await?;
    let fields = daily_fields(metrics);

    if let Some(record) = existing.first() {
        let changed = record.changed_fields(&fields);
        if changed.is_empty() {
            return Ok(Outcome::Unchanged {
                destination_id: record.id.clone(),
            });
        }
        let updated = store.update(&record.id, &changed).await?;
        tracing::info!(date = %metrics.date, destination_id = %updated.id, "Updated daily record");
        return Ok(Outcome::Updated {
            destination_id: updated.id,
        });
    }

    let mut fields = fields;
    fields.insert(
        p::TITLE.to_string(),
        FieldValue::Title(daily_title(metrics.date)),
    );
    let created = store.create(&NewRecord::new(fields)).await?;
    tracing::info!(date = %metrics.date, destination_id = %created.id, "Created daily record");
    Ok(Outcome::Created {
        destination_id: created.id,
    })
}

/// Sync yesterday and today. Days with no metrics are skipped; a store
/// failure on one day does not stop the other.
pub async fn sync_daily(
    wellness: &dyn WellnessSource,
    store: &dyn DestinationStore,
    today: NaiveDate,
) -> SyncReport {
    let mut report = SyncReport::default();

    for date in [today - Duration::days(1), today] {
        let metrics = collect_daily(wellness, date).await;
        if metrics.is_empty() {
            tracing::info!(%date, "No wellness data; skipping day");
            continue;
        }

        let outcome = upsert_daily(store, &metrics).await.unwrap_or_else(|e| {
            tracing::warn!(%date, error = %e, "Failed to write daily record");
            Outcome::Error {
                message: e.to_string(),
            }
        });
        report.push(date.format("%Y-%m-%d").to_string(), outcome);
    }

    report
}
