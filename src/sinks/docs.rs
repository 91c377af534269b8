// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Docs running journal.

use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::json;

use crate::db::{properties as p, DestinationStore};
use crate::error::SinkError;
use crate::http::{check_response, read_json};
use crate::models::{DestinationRecord, Query};
use crate::sinks::google::GoogleApi;
use crate::sinks::{recent_activities, DocumentSink};

const SINK: &str = "docs";
const DOCUMENT_MIME: &str = "application/vnd.google-apps.document";

/// First line of the journal.
pub const JOURNAL_HEADING: &str = "# Garmin Running Journal";

/// The journal document located in Drive.
pub struct DocsClient {
    api: GoogleApi,
    document_id: String,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    body: Option<DocumentBody>,
}

#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuralElement {
    #[serde(default)]
    end_index: Option<u64>,
}

impl DocsClient {
    /// Find the journal: a document in `folder_id` whose name mentions both
    /// "Garmin" and "Running".
    pub async fn open(api: GoogleApi, folder_id: &str) -> Result<Self, SinkError> {
        let file = api
            .find_file(folder_id, DOCUMENT_MIME, SINK, |name| {
                name.contains("Garmin") && name.contains("Running")
            })
            .await?;
        tracing::info!(document_id = %file.id, name = %file.name, "Found journal document");
        Ok(Self {
            api,
            document_id: file.id,
        })
    }

    async fn batch_update(&self, requests: serde_json::Value) -> Result<(), SinkError> {
        let response = self
            .api
            .http
            .post(format!(
                "{}/documents/{}:batchUpdate",
                self.api.docs_base, self.document_id
            ))
            .bearer_auth(&self.api.access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        check_response(response).await.map_err(SinkError::http(SINK))
    }
}

#[async_trait]
impl DocumentSink for DocsClient {
    async fn end_index(&self) -> Result<u64, SinkError> {
        let response = self
            .api
            .http
            .get(format!("{}/documents/{}", self.api.docs_base, self.document_id))
            .bearer_auth(&self.api.access_token)
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        let doc: Document = read_json(response).await.map_err(SinkError::http(SINK))?;

        Ok(doc
            .body
            .and_then(|b| b.content.last().and_then(|e| e.end_index))
            .unwrap_or(1))
    }

    async fn delete_range(&self, start: u64, end: u64) -> Result<(), SinkError> {
        self.batch_update(json!([{
            "deleteContentRange": {
                "range": { "startIndex": start, "endIndex": end }
            }
        }]))
        .await
    }

    async fn insert_text(&self, index: u64, text: &str) -> Result<(), SinkError> {
        self.batch_update(json!([{
            "insertText": {
                "location": { "index": index },
                "text": text
            }
        }]))
        .await
    }
}

/// Journal body: heading, then one section per activity, newest first.
pub fn journal_text(records: &[DestinationRecord], tz: FixedOffset) -> String {
    let mut out = format!("{}\n", JOURNAL_HEADING);

    for r in records {
        let when = r
            .date(p::DATE)
            .map(|d| d.start.instant(tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "\n## {} {}\n",
            when,
            r.text(p::NAME).unwrap_or("Untitled")
        ));
        out.push_str(&format!(
            "- {} / {}\n",
            r.text(p::CATEGORY).unwrap_or("Unknown"),
            r.text(p::SUBCATEGORY).unwrap_or("-")
        ));
        out.push_str(&format!(
            "- {} km, {} min\n",
            r.number(p::DISTANCE_KM).unwrap_or(0.0),
            r.number(p::DURATION_MIN).unwrap_or(0.0)
        ));
        if let Some(pace) = r.text(p::AVERAGE_PACE).filter(|s| !s.is_empty()) {
            out.push_str(&format!("- Pace {}\n", pace));
        }
        if let Some(hr) = r.number(p::AVERAGE_HR) {
            out.push_str(&format!("- Avg HR {}\n", hr));
        }
        if let Some(effect) = r.text(p::TRAINING_EFFECT) {
            out.push_str(&format!("- Training Effect {}\n", effect));
        }
        if let Some(laps) = r.text(p::LAPS).filter(|s| !s.is_empty()) {
            out.push_str(laps);
            out.push('\n');
        }
    }
    out
}

/// Rewrite the journal with the latest activities.
pub async fn export_journal(
    store: &dyn DestinationStore,
    sink: &dyn DocumentSink,
    tz: FixedOffset,
) -> Result<usize, SinkError> {
    let records = recent_activities(store, Query::default()).await?;
    let text = journal_text(&records, tz);

    let end = sink.end_index().await?;
    // The final newline of a document body cannot be deleted.
    if end > 2 {
        sink.delete_range(1, end - 1).await?;
    }
    sink.insert_text(1, &text).await?;

    tracing::info!(records = records.len(), chars = text.chars().count(), "Journal updated");
    Ok(records.len())
}
