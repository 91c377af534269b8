// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sheets export of the activity log.

use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{properties as p, DestinationStore};
use crate::error::SinkError;
use crate::http::{check_response, read_json};
use crate::models::{DestinationRecord, FieldValue, Query};
use crate::sinks::google::GoogleApi;
use crate::sinks::{recent_activities, SpreadsheetSink};
use crate::time_utils::DatePoint;

const SINK: &str = "sheets";

/// Name of the spreadsheet the log is written to.
pub const SPREADSHEET_NAME: &str = "Garmin Running Log";

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Header row of the export.
pub const HEADERS: [&str; 17] = [
    "Date",
    "Type",
    "Sub Type",
    "Name",
    "Distance (km)",
    "Time (min)",
    "Pace (/km)",
    "GAP (/km)",
    "Avg HR",
    "Max HR",
    "Calories",
    "Avg Power",
    "Max Power",
    "Training Effect",
    "Aerobic TE",
    "Anaerobic TE",
    "Laps",
];

/// One tab of a spreadsheet located in Drive.
pub struct SheetsClient {
    api: GoogleApi,
    spreadsheet_id: String,
    sheet_title: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl SheetsClient {
    /// Find [`SPREADSHEET_NAME`] in `folder_id` and use its first tab.
    pub async fn open(api: GoogleApi, folder_id: &str) -> Result<Self, SinkError> {
        let file = api
            .find_file(folder_id, SPREADSHEET_MIME, SINK, |name| {
                name == SPREADSHEET_NAME
            })
            .await?;
        tracing::info!(spreadsheet_id = %file.id, "Found spreadsheet");

        let response = api
            .http
            .get(format!("{}/spreadsheets/{}", api.sheets_base, file.id))
            .bearer_auth(&api.access_token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        let meta: SpreadsheetMeta = read_json(response).await.map_err(SinkError::http(SINK))?;

        let sheet_title = meta
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| SinkError::Missing {
                sink: SINK,
                message: format!("spreadsheet {} has no sheets", file.id),
            })?;

        Ok(Self {
            api,
            spreadsheet_id: file.id,
            sheet_title,
        })
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{}",
            self.api.sheets_base,
            self.spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }
}

#[async_trait]
impl SpreadsheetSink for SheetsClient {
    fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    async fn clear_range(&self, range: &str) -> Result<(), SinkError> {
        let response = self
            .api
            .http
            .post(self.values_url(range, ":clear"))
            .bearer_auth(&self.api.access_token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        check_response(response).await.map_err(SinkError::http(SINK))
    }

    async fn write_rows(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SinkError> {
        let response = self
            .api
            .http
            .put(self.values_url(range, ""))
            .bearer_auth(&self.api.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            }))
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        check_response(response).await.map_err(SinkError::http(SINK))
    }
}

fn text_or(record: &DestinationRecord, property: &str, default: &str) -> Value {
    let text = record
        .text(property)
        .filter(|s| !s.is_empty())
        .unwrap_or(default);
    Value::String(text.to_string())
}

fn number_or_zero(record: &DestinationRecord, property: &str) -> Value {
    match record.field(property) {
        Some(FieldValue::Number(n)) => json!(n),
        _ => json!(0),
    }
}

fn date_cell(record: &DestinationRecord, tz: FixedOffset) -> Value {
    let text = match record.date(p::DATE).map(|d| d.start) {
        Some(DatePoint::Instant(dt)) => dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
        Some(DatePoint::Day(day)) => day.format("%Y-%m-%d").to_string(),
        None => String::new(),
    };
    Value::String(text)
}

/// Header row followed by one row per activity.
pub fn rows_from_records(records: &[DestinationRecord], tz: FixedOffset) -> Vec<Vec<Value>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(HEADERS.iter().map(|h| Value::String(h.to_string())).collect());

    for r in records {
        rows.push(vec![
            date_cell(r, tz),
            text_or(r, p::CATEGORY, "Unknown"),
            text_or(r, p::SUBCATEGORY, "-"),
            text_or(r, p::NAME, "Untitled"),
            number_or_zero(r, p::DISTANCE_KM),
            number_or_zero(r, p::DURATION_MIN),
            text_or(r, p::AVERAGE_PACE, "-"),
            text_or(r, p::GAP, "-"),
            number_or_zero(r, p::AVERAGE_HR),
            number_or_zero(r, p::MAX_HR),
            number_or_zero(r, p::CALORIES),
            number_or_zero(r, p::AVERAGE_POWER),
            number_or_zero(r, p::MAX_POWER),
            text_or(r, p::TRAINING_EFFECT, "-"),
            number_or_zero(r, p::AEROBIC),
            number_or_zero(r, p::ANAEROBIC),
            text_or(r, p::LAPS, "-"),
        ]);
    }
    rows
}

/// Replace the sheet contents with the activity log. Returns the number of
/// rows written, header included.
pub async fn export_sheet(
    store: &dyn DestinationStore,
    sink: &dyn SpreadsheetSink,
    tz: FixedOffset,
) -> Result<usize, SinkError> {
    let records = recent_activities(store, Query::default()).await?;
    tracing::info!(records = records.len(), "Exporting activities to spreadsheet");

    let rows = rows_from_records(&records, tz);
    let title = sink.sheet_title();
    sink.clear_range(&format!("'{}'!A1:Z1000", title)).await?;
    sink.write_rows(&format!("'{}'!A1", title), &rows).await?;

    tracing::info!(rows = rows.len(), "Spreadsheet updated");
    Ok(rows.len())
}
