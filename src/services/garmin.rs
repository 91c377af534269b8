// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect API client for fetching activities and wellness data.
//!
//! Handles:
//! - Activity listing by offset/limit and by date range
//! - Per-activity lap detail
//! - Daily HRV, resting heart rate, sleep score and steps
//! - Lenient decoding: malformed metrics become missing, never errors

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::future::Future;

use crate::error::ProviderError;
use crate::http::{classify_status, read_json};
use crate::models::{ActivityMetrics, SourceRecord, Split};
use crate::time_utils::SourceTimestamp;

/// Page size used when walking a date range.
const RANGE_PAGE_SIZE: usize = 100;

/// Request pages at increasing offsets until one comes back short.
async fn collect_offset_pages<T, F, Fut>(
    page_size: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ProviderError>>,
{
    let mut all = Vec::new();
    loop {
        let page = fetch_page(all.len()).await?;
        let fetched = page.len();
        all.extend(page);
        if fetched == 0 || fetched < page_size {
            break;
        }
    }
    Ok(all)
}

/// Read access to a provider's activity history.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Activities newest first, skipping `start`, at most `limit`.
    async fn activities_page(
        &self,
        start: usize,
        limit: usize,
    ) -> Result<Vec<GarminActivity>, ProviderError>;

    /// Every activity that started between `start` and `end` (inclusive days).
    async fn activities_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GarminActivity>, ProviderError>;

    /// Lap breakdown of one activity.
    async fn activity_splits(&self, activity_id: &str) -> Result<Vec<Split>, ProviderError>;
}

/// Read access to daily wellness metrics. `None` means no data that day.
#[async_trait]
pub trait WellnessSource: Send + Sync {
    async fn hrv(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError>;
    async fn resting_hr(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError>;
    async fn sleep_score(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError>;
    async fn steps(&self, date: NaiveDate) -> Result<Option<StepSummary>, ProviderError>;
}

/// Daily step totals.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub total_steps: Option<f64>,
    pub step_goal: Option<f64>,
    /// Meters
    pub total_distance: Option<f64>,
}

/// Garmin Connect API client.
#[derive(Clone)]
pub struct GarminClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GarminClient {
    /// Create a client with a ready-to-use OAuth access token.
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// GET a JSON document; `None` for 204 or an empty body.
    async fn get_optional(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Value>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body).into());
        }
        if status.as_u16() == 204 {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn search(&self, query: &[(&str, String)]) -> Result<Vec<GarminActivity>, ProviderError> {
        let url = format!(
            "{}/activitylist-service/activities/search/activities",
            self.base_url
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(read_json(response).await?)
    }
}

#[async_trait]
impl ActivitySource for GarminClient {
    async fn activities_page(
        &self,
        start: usize,
        limit: usize,
    ) -> Result<Vec<GarminActivity>, ProviderError> {
        self.search(&[("start", start.to_string()), ("limit", limit.to_string())])
            .await
    }

    async fn activities_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GarminActivity>, ProviderError> {
        let (from, to) = (
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        );
        collect_offset_pages(RANGE_PAGE_SIZE, |offset| {
            let params = [
                ("startDate", from.clone()),
                ("endDate", to.clone()),
                ("start", offset.to_string()),
                ("limit", RANGE_PAGE_SIZE.to_string()),
            ];
            async move { self.search(&params).await }
        })
        .await
    }

    async fn activity_splits(&self, activity_id: &str) -> Result<Vec<Split>, ProviderError> {
        let path = format!("/activity-service/activity/{}/splits", activity_id);
        let Some(body) = self.get_optional(&path, &[]).await? else {
            return Ok(Vec::new());
        };
        let detail: GarminLaps =
            serde_json::from_value(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(detail.into_splits())
    }
}

#[async_trait]
impl WellnessSource for GarminClient {
    async fn hrv(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        let path = format!("/hrv-service/hrv/{}", date.format("%Y-%m-%d"));
        Ok(self.get_optional(&path, &[]).await?.and_then(|v| {
            number_at(&v, "/hrvSummary/weeklyAvg").or_else(|| number_at(&v, "/hrvSummary/lastNightAvg"))
        }))
    }

    async fn resting_hr(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        let body = self
            .get_optional(
                "/wellness-service/wellness/dailyHeartRate",
                &[("date", date.format("%Y-%m-%d").to_string())],
            )
            .await?;
        Ok(body.and_then(|v| number_at(&v, "/restingHeartRate")))
    }

    async fn sleep_score(&self, date: NaiveDate) -> Result<Option<f64>, ProviderError> {
        let body = self
            .get_optional(
                "/wellness-service/wellness/dailySleepData",
                &[
                    ("date", date.format("%Y-%m-%d").to_string()),
                    ("nonSleepBufferMinutes", "60".to_string()),
                ],
            )
            .await?;
        Ok(body.and_then(|v| number_at(&v, "/dailySleepDTO/sleepScores/overall/value")))
    }

    async fn steps(&self, date: NaiveDate) -> Result<Option<StepSummary>, ProviderError> {
        let day = date.format("%Y-%m-%d");
        let path = format!("/usersummary-service/stats/steps/daily/{}/{}", day, day);
        let body = self.get_optional(&path, &[]).await?;
        Ok(body.as_ref().and_then(|v| v.get(0)).map(|day| StepSummary {
            total_steps: number_at(day, "/totalSteps"),
            step_goal: number_at(day, "/stepGoal"),
            total_distance: number_at(day, "/totalDistance"),
        }))
    }
}

fn number_at(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(lenient_number)
}

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

/// Accept a number or numeric string; anything else is missing.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_number))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Activity summary as returned by the activity search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub activity_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub activity_name: Option<String>,
    #[serde(rename = "startTimeGMT", default, deserialize_with = "lenient_string")]
    pub start_time_gmt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_time_local: Option<String>,
    #[serde(default)]
    pub activity_type: Option<GarminActivityType>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_grade_adjusted_speed: Option<f64>,
    #[serde(rename = "averageHR", default, deserialize_with = "lenient_f64")]
    pub average_hr: Option<f64>,
    #[serde(rename = "maxHR", default, deserialize_with = "lenient_f64")]
    pub max_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub training_effect_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub aerobic_training_effect: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub aerobic_training_effect_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub anaerobic_training_effect: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anaerobic_training_effect_message: Option<String>,
    #[serde(default)]
    pub split_summaries: Option<Vec<GarminSplitSummary>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub pr: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivityType {
    #[serde(default)]
    pub type_key: Option<String>,
}

/// Split summary embedded in an activity listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminSplitSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub split_id: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_speed: Option<f64>,
    #[serde(rename = "averageHR", default, deserialize_with = "lenient_f64")]
    pub average_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub split_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminLaps {
    #[serde(rename = "lapDTOs", default)]
    laps: Vec<GarminLap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminLap {
    #[serde(default, deserialize_with = "lenient_f64")]
    lap_index: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    average_speed: Option<f64>,
    #[serde(rename = "averageHR", default, deserialize_with = "lenient_f64")]
    average_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    intensity_type: Option<String>,
}

impl GarminLaps {
    fn into_splits(self) -> Vec<Split> {
        self.laps
            .into_iter()
            .enumerate()
            .map(|(i, lap)| Split {
                index: lap.lap_index.map_or(i as u32 + 1, |n| n as u32),
                distance_m: lap.distance.unwrap_or(0.0),
                duration_s: lap.duration.unwrap_or(0.0),
                average_speed: lap.average_speed.unwrap_or(0.0),
                average_hr: lap.average_hr,
                split_type: lap.intensity_type,
            })
            .collect()
    }
}

/// A provider record that could not be turned into a [`SourceRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedActivity {
    pub id: String,
    pub reason: String,
}

impl GarminActivity {
    /// The provider ID, or a placeholder for logging when absent.
    pub fn id_or_placeholder(&self) -> String {
        self.activity_id
            .clone()
            .unwrap_or_else(|| "<missing id>".to_string())
    }

    /// Convert to the provider-independent model.
    pub fn into_source_record(self) -> Result<SourceRecord, RejectedActivity> {
        let Some(id) = self.activity_id.clone() else {
            return Err(RejectedActivity {
                id: self.id_or_placeholder(),
                reason: "activity has no id".to_string(),
            });
        };

        let start = self
            .start_time_gmt
            .as_deref()
            .and_then(SourceTimestamp::parse_utc)
            .or_else(|| {
                self.start_time_local
                    .as_deref()
                    .and_then(SourceTimestamp::parse_local)
            })
            .ok_or_else(|| RejectedActivity {
                id: id.clone(),
                reason: format!(
                    "unparseable start time {:?}",
                    self.start_time_gmt.as_deref().or(self.start_time_local.as_deref())
                ),
            })?;

        let splits = self.split_summaries.map(|summaries| {
            summaries
                .into_iter()
                .enumerate()
                .map(|(i, s)| Split {
                    index: s.split_id.map_or(i as u32 + 1, |n| n as u32),
                    distance_m: s.distance.unwrap_or(0.0),
                    duration_s: s.duration.unwrap_or(0.0),
                    average_speed: s.average_speed.unwrap_or(0.0),
                    average_hr: s.average_hr,
                    split_type: s.split_type,
                })
                .collect()
        });

        Ok(SourceRecord {
            id,
            start,
            type_tag: self
                .activity_type
                .and_then(|t| t.type_key)
                .unwrap_or_default(),
            name: self.activity_name.unwrap_or_default(),
            metrics: ActivityMetrics {
                distance_m: self.distance,
                duration_s: self.duration,
                calories: self.calories,
                average_speed: self.average_speed,
                grade_adjusted_speed: self.avg_grade_adjusted_speed,
                average_hr: self.average_hr,
                max_hr: self.max_hr,
                average_power: self.avg_power,
                max_power: self.max_power,
                training_effect_label: self.training_effect_label,
                aerobic_effect: self.aerobic_training_effect,
                aerobic_effect_message: self.aerobic_training_effect_message,
                anaerobic_effect: self.anaerobic_training_effect,
                anaerobic_effect_message: self.anaerobic_training_effect_message,
                personal_record: self.pr,
                favorite: self.favorite,
            },
            splits,
        })
    }
}
