// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use garmin_notion_sync::db::{properties, DestinationStore, MemoryStore};
use garmin_notion_sync::error::{ProviderError, StoreError};
use garmin_notion_sync::models::{
    ActivityMetrics, DateValue, DestinationRecord, FieldValue, Fields, NewRecord, Query,
    SourceRecord, Split,
};
use garmin_notion_sync::services::{ActivitySource, GarminActivity, StepSummary, WellnessSource};
use garmin_notion_sync::time_utils::SourceTimestamp;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Japan Standard Time.
#[allow(dead_code)]
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// A running activity with the given GMT start time.
#[allow(dead_code)]
pub fn activity(id: &str, start_gmt: &str, name: &str, distance_m: f64) -> SourceRecord {
    SourceRecord {
        id: id.to_string(),
        start: SourceTimestamp::parse_utc(start_gmt).unwrap(),
        type_tag: "running".to_string(),
        name: name.to_string(),
        metrics: ActivityMetrics {
            distance_m: Some(distance_m),
            duration_s: Some(distance_m * 0.3),
            average_speed: Some(3.333),
            average_hr: Some(150.0),
            ..ActivityMetrics::default()
        },
        splits: None,
    }
}

/// Provider wire record as the activity search endpoint returns it.
#[allow(dead_code)]
pub fn garmin_activity(id: &str, start_gmt: &str, distance_m: f64) -> GarminActivity {
    serde_json::from_value(serde_json::json!({
        "activityId": id,
        "activityName": format!("Run {}", id),
        "startTimeGMT": start_gmt,
        "activityType": { "typeKey": "running" },
        "distance": distance_m,
        "duration": distance_m * 0.3,
        "averageSpeed": 3.333,
    }))
    .unwrap()
}

/// Fields of a destination record holding only a date.
#[allow(dead_code)]
pub fn dated_fields(dt: DateTime<FixedOffset>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        properties::DATE.to_string(),
        FieldValue::Date(DateValue::instant(dt)),
    );
    fields
}

/// One split of `distance_m` meters.
#[allow(dead_code)]
pub fn split(index: u32, distance_m: f64, duration_s: f64) -> Split {
    Split {
        index,
        distance_m,
        duration_s,
        average_speed: 3.333,
        average_hr: Some(150.0),
        split_type: None,
    }
}

/// Scripted Garmin double.
#[derive(Default)]
pub struct FakeGarmin {
    /// Pages returned in call order by `activities_page`
    pub pages: Vec<Vec<GarminActivity>>,
    /// Activities served by date range
    pub pool: Vec<GarminActivity>,
    pub splits: HashMap<String, Vec<Split>>,
    pub fail_splits: bool,
    pub fail_listing: bool,
    pub wellness: HashMap<NaiveDate, WellnessDay>,
    pub fail_metrics: HashSet<&'static str>,
    pub page_calls: Mutex<Vec<(usize, usize)>>,
    pub window_calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    pub split_calls: Mutex<Vec<String>>,
}

/// Wellness values for one day.
#[derive(Debug, Clone, Default)]
pub struct WellnessDay {
    pub hrv: Option<f64>,
    pub rhr: Option<f64>,
    pub sleep: Option<f64>,
    pub steps: Option<StepSummary>,
}

impl FakeGarmin {
    #[allow(dead_code)]
    pub fn with_pages(pages: Vec<Vec<GarminActivity>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn metric<T: Clone>(
        &self,
        name: &'static str,
        date: NaiveDate,
        pick: impl Fn(&WellnessDay) -> Option<T>,
    ) -> Result<Option<T>, ProviderError> {
        if self.fail_metrics.contains(name) {
            return Err(ProviderError::Status {
                status: 500,
                body: name.to_string(),
            });
        }
        Ok(self.wellness.get(&date).and_then(pick))
    }
}

#[async_trait]
impl ActivitySource for FakeGarmin {
    async fn activities_page(
        &self,
        start: usize,
        limit: usize,
    ) -> Result<Vec<GarminActivity>, ProviderError> {
        if self.fail_listing {
            return Err(ProviderError::Unauthorized);
        }
        let mut calls = self.page_calls.lock().unwrap();
        let page = self.pages.get(calls.len()).cloned().unwrap_or_default();
        calls.push((start, limit));
        Ok(page)
    }

    async fn activities_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GarminActivity>, ProviderError> {
        if self.fail_listing {
            return Err(ProviderError::Unauthorized);
        }
        self.window_calls.lock().unwrap().push((start, end));
        Ok(self
            .pool
            .iter()
            .filter(|a| {
                let day = a
                    .start_time_gmt
                    .as_deref()
                    .and_then(|s| NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").ok());
                day.is_some_and(|d| d >= start && d <= end)
            })
            .cloned()
            .collect())
    }

    async fn activity_splits(&self, activity_id: &str) -> Result<Vec<Split>, ProviderError> {
        self.split_calls.lock().unwrap().push(activity_id.to_string());
        if self.fail_splits {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        Ok(self.splits.get(activity_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl WellnessSource for FakeGarmin {
    async fn hrv(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        self.metric("hrv", date, |d| d.hrv)
    }

    async fn resting_hr(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        self.metric("rhr", date, |d| d.rhr)
    }

    async fn sleep_score(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        self.metric("sleep", date, |d| d.sleep)
    }

    async fn steps(&self, date: NaiveDate) -> Result<Option<StepSummary>, ProviderError> {
        self.metric("steps", date, |d| d.steps.clone())
    }
}

/// Memory store that fails writes for chosen activity names.
pub struct FailingStore {
    pub inner: MemoryStore,
    /// Titles whose create/update is rejected
    pub fail_titles: Vec<String>,
    pub fail_everything: bool,
}

impl FailingStore {
    #[allow(dead_code)]
    pub fn new(fail_titles: &[&str]) -> Self {
        Self {
            inner: MemoryStore::new(jst()),
            fail_titles: fail_titles.iter().map(|s| s.to_string()).collect(),
            fail_everything: false,
        }
    }

    #[allow(dead_code)]
    pub fn always_failing() -> Self {
        Self {
            fail_everything: true,
            ..Self::new(&[])
        }
    }

    fn rejects(&self, fields: &Fields) -> bool {
        self.fail_everything
            || fields
                .get(properties::NAME)
                .and_then(FieldValue::as_str)
                .is_some_and(|t| self.fail_titles.iter().any(|f| f == t))
    }

    fn failure() -> StoreError {
        StoreError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
    }
}

#[async_trait]
impl DestinationStore for FailingStore {
    async fn query(&self, query: &Query) -> Result<Vec<DestinationRecord>, StoreError> {
        if self.fail_everything {
            return Err(Self::failure());
        }
        self.inner.query(query).await
    }

    async fn create(&self, record: &NewRecord) -> Result<DestinationRecord, StoreError> {
        if self.rejects(&record.fields) {
            return Err(Self::failure());
        }
        self.inner.create(record).await
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<DestinationRecord, StoreError> {
        if self.rejects(fields) {
            return Err(Self::failure());
        }
        self.inner.update(id, fields).await
    }
}
