// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secondary sinks: spreadsheet export, journal document, coach advice.
//!
//! Sinks only read the already-reconciled activity database and write to
//! their own service. A sink failure never touches the destination records
//! written by the sync.

pub mod coach;
pub mod docs;
pub mod google;
pub mod sheets;

pub use coach::GeminiClient;
pub use docs::DocsClient;
pub use google::GoogleApi;
pub use sheets::SheetsClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::db::{properties, DestinationStore};
use crate::error::SinkError;
use crate::models::{DestinationRecord, Query};

/// Most records any sink reads from the activity database.
pub const SINK_READ_LIMIT: usize = 500;

/// A spreadsheet tab that can be cleared and written.
#[async_trait]
pub trait SpreadsheetSink: Send + Sync {
    /// Title of the tab ranges refer to.
    fn sheet_title(&self) -> &str;

    async fn clear_range(&self, range: &str) -> Result<(), SinkError>;

    /// Write rows starting at the top-left cell of `range`.
    async fn write_rows(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SinkError>;
}

/// A text document addressed by character index.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Index one past the last character of the body.
    async fn end_index(&self) -> Result<u64, SinkError>;

    async fn delete_range(&self, start: u64, end: u64) -> Result<(), SinkError>;

    async fn insert_text(&self, index: u64, text: &str) -> Result<(), SinkError>;
}

/// A text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SinkError>;
}

/// Newest activities first, capped at [`SINK_READ_LIMIT`].
pub async fn recent_activities(
    store: &dyn DestinationStore,
    query: Query,
) -> Result<Vec<DestinationRecord>, SinkError> {
    let query = Query {
        sort: Query::newest_first(properties::DATE).sort,
        limit: Some(query.limit.unwrap_or(SINK_READ_LIMIT).min(SINK_READ_LIMIT)),
        ..query
    };
    Ok(store.query(&query).await?)
}
