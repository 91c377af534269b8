// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use garmin_notion_sync::config::{Config, ConfigError};
use garmin_notion_sync::error::{ProviderError, SinkError, StoreError, SyncError};
use garmin_notion_sync::jobs::{self, batch_status};
use garmin_notion_sync::models::{Outcome, SyncReport};

fn failed(reason: &str) -> Outcome {
    Outcome::Error {
        message: reason.to_string(),
    }
}

#[test]
fn test_exit_codes() {
    assert_eq!(SyncError::BatchFailed(3).exit_code(), 2);
    assert_eq!(SyncError::ProviderFetch(ProviderError::Unauthorized).exit_code(), 1);
    assert_eq!(SyncError::Store(StoreError::RateLimited).exit_code(), 1);
    assert_eq!(SyncError::Setup(ConfigError::Missing("NOTION_TOKEN")).exit_code(), 1);
    assert_eq!(
        SyncError::SinkWrite(SinkError::Missing {
            sink: "Sheets",
            message: "spreadsheet not found".to_string(),
        })
        .exit_code(),
        1
    );
}

#[test]
fn test_batch_status_all_failed() {
    let mut report = SyncReport::default();
    report.push("1", failed("bad gateway"));
    report.push("2", failed("bad gateway"));

    let err = batch_status(&report).unwrap_err();
    assert!(matches!(err, SyncError::BatchFailed(2)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_batch_status_partial_failure_is_success() {
    let mut report = SyncReport::default();
    report.push("1", failed("bad gateway"));
    report.push(
        "2",
        Outcome::Created {
            destination_id: "page-2".to_string(),
        },
    );

    assert!(batch_status(&report).is_ok());
}

#[test]
fn test_batch_status_empty_batch_is_success() {
    assert!(batch_status(&SyncReport::default()).is_ok());
}

#[tokio::test]
async fn test_missing_database_id() {
    let config = Config::from_vars(|key| match key {
        "NOTION_TOKEN" => Some("secret".to_string()),
        "GARMIN_ACCESS_TOKEN" => Some("token".to_string()),
        _ => None,
    })
    .expect("Config should load without database IDs");

    let err = jobs::sync_activities(&config).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Setup(ConfigError::Missing("NOTION_DB_ID"))
    ));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_init_databases_needs_parent_page() {
    let config = Config::from_vars(|key| (key == "NOTION_TOKEN").then(|| "secret".to_string()))
        .expect("Config should load");

    let err = jobs::init_databases(&config).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Setup(ConfigError::Missing("NOTION_PARENT_PAGE_ID"))
    ));
}

#[test]
fn test_missing_optional_credential() {
    let err = Config::require(&None, "GARMIN_ACCESS_TOKEN").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing required environment variable: GARMIN_ACCESS_TOKEN"
    );
}
