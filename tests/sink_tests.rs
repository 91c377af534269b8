// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Secondary sink tests against recording doubles.

use async_trait::async_trait;
use chrono::TimeZone;
use garmin_notion_sync::db::{properties, MemoryStore, MAX_TEXT_CHARS};
use garmin_notion_sync::error::SinkError;
use garmin_notion_sync::models::FieldValue;
use garmin_notion_sync::sinks::coach::run_coach;
use garmin_notion_sync::sinks::docs::export_journal;
use garmin_notion_sync::sinks::sheets::{export_sheet, HEADERS};
use garmin_notion_sync::sinks::{DocumentSink, SpreadsheetSink, TextGenerator};
use serde_json::{json, Value};
use std::sync::Mutex;

mod common;
use common::{dated_fields, jst};

#[derive(Default)]
struct RecordingSheet {
    cleared: Mutex<Vec<String>>,
    written: Mutex<Vec<(String, Vec<Vec<Value>>)>>,
}

#[async_trait]
impl SpreadsheetSink for RecordingSheet {
    fn sheet_title(&self) -> &str {
        "Sheet1"
    }

    async fn clear_range(&self, range: &str) -> Result<(), SinkError> {
        self.cleared.lock().unwrap().push(range.to_string());
        Ok(())
    }

    async fn write_rows(&self, range: &str, rows: &[Vec<Value>]) -> Result<(), SinkError> {
        self.written
            .lock()
            .unwrap()
            .push((range.to_string(), rows.to_vec()));
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
enum DocCall {
    Delete(u64, u64),
    Insert(u64, String),
}

struct RecordingDoc {
    end: u64,
    calls: Mutex<Vec<DocCall>>,
}

impl RecordingDoc {
    fn with_end(end: u64) -> Self {
        Self {
            end,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentSink for RecordingDoc {
    async fn end_index(&self) -> Result<u64, SinkError> {
        Ok(self.end)
    }

    async fn delete_range(&self, start: u64, end: u64) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(DocCall::Delete(start, end));
        Ok(())
    }

    async fn insert_text(&self, index: u64, text: &str) -> Result<(), SinkError> {
        self.calls
            .lock()
            .unwrap()
            .push(DocCall::Insert(index, text.to_string()));
        Ok(())
    }
}

struct CannedAdvice {
    advice: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for CannedAdvice {
    async fn generate(&self, prompt: &str) -> Result<String, SinkError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.advice.clone())
    }
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new(jst());
    for (day, name) in [(1, "Older Run"), (3, "Latest Run"), (2, "Middle Run")] {
        let mut fields = dated_fields(jst().with_ymd_and_hms(2024, 3, day, 7, 0, 0).unwrap());
        fields.insert(
            properties::NAME.to_string(),
            FieldValue::Title(name.to_string()),
        );
        fields.insert(
            properties::CATEGORY.to_string(),
            FieldValue::Select("ランニング".to_string()),
        );
        fields.insert(properties::DISTANCE_KM.to_string(), FieldValue::Number(10.0));
        store.insert(fields);
    }
    store
}

#[tokio::test]
async fn test_export_sheet_rewrites_whole_tab() {
    let store = seeded_store();
    let sheet = RecordingSheet::default();

    let rows = export_sheet(&store, &sheet, jst()).await.unwrap();

    assert_eq!(rows, 4);
    assert_eq!(*sheet.cleared.lock().unwrap(), vec!["'Sheet1'!A1:Z1000"]);
    let written = sheet.written.lock().unwrap();
    assert_eq!(written.len(), 1);
    let (range, values) = &written[0];
    assert_eq!(range, "'Sheet1'!A1");
    assert_eq!(values[0].len(), HEADERS.len());
    assert_eq!(values[0][0], json!(HEADERS[0]));
    assert_eq!(values[1][0], json!("2024-03-03 07:00"));
    assert_eq!(values[1][3], json!("Latest Run"));
    assert_eq!(values[3][3], json!("Older Run"));
}

#[tokio::test]
async fn test_export_journal_replaces_body() {
    let store = seeded_store();
    let doc = RecordingDoc::with_end(120);

    let count = export_journal(&store, &doc, jst()).await.unwrap();

    assert_eq!(count, 3);
    let calls = doc.calls.lock().unwrap();
    assert_eq!(calls[0], DocCall::Delete(1, 119));
    match &calls[1] {
        DocCall::Insert(index, text) => {
            assert_eq!(*index, 1);
            assert!(text.starts_with("# Garmin Running Journal\n"));
            let latest = text.find("Latest Run").unwrap();
            let older = text.find("Older Run").unwrap();
            assert!(latest < older);
        }
        other => panic!("expected insert, got {:?}", other),
    }
}

#[tokio::test]
async fn test_export_journal_empty_document_skips_delete() {
    let store = seeded_store();
    let doc = RecordingDoc::with_end(2);

    export_journal(&store, &doc, jst()).await.unwrap();

    let calls = doc.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], DocCall::Insert(1, _)));
}

#[tokio::test]
async fn test_coach_advice_stored_on_latest_activity() {
    let store = seeded_store();
    let generator = CannedAdvice {
        advice: format!("  {}  ", "走".repeat(MAX_TEXT_CHARS + 50)),
        prompts: Mutex::new(Vec::new()),
    };
    let now = jst().with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

    let updated = run_coach(&store, &generator, now).await.unwrap();

    let latest = store.get(updated.as_deref().unwrap()).unwrap();
    assert_eq!(latest.text(properties::NAME), Some("Latest Run"));
    let advice = latest.text(properties::COACH_ADVICE).unwrap();
    assert_eq!(advice.chars().count(), MAX_TEXT_CHARS);
    assert!(advice.starts_with('走'));

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Middle Run"));
    assert_eq!(store.update_count(), 1);
}

#[tokio::test]
async fn test_coach_skips_without_recent_activities() {
    let store = seeded_store();
    let generator = CannedAdvice {
        advice: "rest".to_string(),
        prompts: Mutex::new(Vec::new()),
    };
    let now = jst().with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let updated = run_coach(&store, &generator, now).await.unwrap();

    assert!(updated.is_none());
    assert!(generator.prompts.lock().unwrap().is_empty());
    assert_eq!(store.update_count(), 0);
}
