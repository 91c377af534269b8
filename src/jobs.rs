// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Jobs run by the CLI: wiring configuration to clients and services.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::config::{Config, SyncSettings};
use crate::db::{properties, DestinationStore, NotionStore};
use crate::error::{Result, SyncError};
use crate::models::{FieldKind, Icon, Outcome, SyncReport};
use crate::services::daily::sync_daily as sync_daily_records;
use crate::services::weekly::{generate_weekly_report, WeeklyStores};
use crate::services::{
    fetch_batch, ActivityMapper, ActivitySource, GarminClient, MatchSettings, Reconciler,
};
use crate::sinks::{coach, docs, sheets, DocsClient, GeminiClient, GoogleApi, SheetsClient};

/// Current time in the reference offset.
pub fn now_in(settings: &SyncSettings) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&settings.reference_offset)
}

/// Fail with exit status 2 when every record of a non-empty batch failed.
pub fn batch_status(report: &SyncReport) -> Result<()> {
    if report.all_failed() {
        return Err(SyncError::BatchFailed(report.errors()));
    }
    Ok(())
}

fn garmin_client(config: &Config) -> Result<GarminClient> {
    let token = Config::require(&config.garmin_access_token, "GARMIN_ACCESS_TOKEN")?;
    Ok(GarminClient::new(&config.garmin_base_url, token))
}

fn activity_store(config: &Config) -> Result<NotionStore> {
    let db = Config::require(&config.notion_db_id, "NOTION_DB_ID")?;
    Ok(NotionStore::new(&config.notion_token, db))
}

fn google_api(config: &Config) -> Result<(GoogleApi, &str)> {
    let token = Config::require(&config.google_access_token, "GOOGLE_ACCESS_TOKEN")?;
    let folder = Config::require(&config.google_drive_folder_id, "GOOGLE_DRIVE_FOLDER_ID")?;
    Ok((GoogleApi::new(token), folder))
}

/// Fetch a batch from `source` and reconcile it into `store`.
pub async fn run_activity_sync(
    source: &dyn ActivitySource,
    store: &dyn DestinationStore,
    mapper: &ActivityMapper,
    settings: &SyncSettings,
    today: NaiveDate,
) -> Result<SyncReport> {
    let batch = fetch_batch(source, settings, today).await?;
    tracing::info!(
        records = batch.records.len(),
        rejected = batch.rejected.len(),
        "Fetched activities"
    );

    let reconciler = Reconciler::new(store, mapper, MatchSettings::from(settings))
        .with_detail_source(source);
    Ok(reconciler.reconcile_batch(&batch).await)
}

/// IDs of the databases created by [`init_databases`].
#[derive(Debug, Default, Serialize)]
pub struct CreatedDatabases {
    #[serde(rename = "NOTION_DB_ID")]
    pub activities: Option<String>,
    #[serde(rename = "NOTION_DAILY_DB_ID")]
    pub daily: Option<String>,
    #[serde(rename = "NOTION_REPORT_DB_ID")]
    pub reports: Option<String>,
}

/// Create the activity, daily and weekly report databases under the parent
/// page. A failed database is logged and the others are still created;
/// fails only when none could be created.
pub async fn init_databases(config: &Config) -> Result<CreatedDatabases> {
    let parent = Config::require(&config.notion_parent_page_id, "NOTION_PARENT_PAGE_ID")?;
    let notion = NotionStore::new(&config.notion_token, parent);
    let mapper =
        ActivityMapper::for_locale(config.settings.label_locale, config.settings.reference_offset);

    let mut activity_columns = mapper.columns();
    activity_columns.push((properties::COACH_ADVICE, FieldKind::Text));

    let specs: [(&str, &[(&str, FieldKind)], &str); 3] = [
        ("Garmin アクティビティ", &activity_columns, "🏃"),
        ("Garmin デイリーログ", &properties::daily::COLUMNS, "🔋"),
        ("Garmin 週間ランニングレポート", &properties::report::COLUMNS, "📊"),
    ];

    let mut ids = Vec::with_capacity(specs.len());
    let mut last_error = None;
    for (title, columns, emoji) in specs {
        let icon = Icon::Emoji(emoji.to_string());
        match notion.create_database(parent, title, columns, &icon).await {
            Ok(id) => ids.push(Some(id)),
            Err(e) => {
                tracing::error!(title, error = %e, "Could not create database");
                ids.push(None);
                last_error = Some(e);
            }
        }
    }

    if let (true, Some(e)) = (ids.iter().all(Option::is_none), last_error) {
        return Err(e.into());
    }
    let mut ids = ids.into_iter();
    Ok(CreatedDatabases {
        activities: ids.next().flatten(),
        daily: ids.next().flatten(),
        reports: ids.next().flatten(),
    })
}

/// Garmin activities into the Notion activity database.
pub async fn sync_activities(config: &Config) -> Result<SyncReport> {
    let garmin = garmin_client(config)?;
    let store = activity_store(config)?;
    let settings = &config.settings;
    let mapper = ActivityMapper::for_locale(settings.label_locale, settings.reference_offset);

    if let Err(e) = store.ensure_properties(&mapper.columns()).await {
        tracing::warn!(error = %e, "Could not ensure activity database properties");
    }

    let today = now_in(settings).date_naive();
    run_activity_sync(&garmin, &store, &mapper, settings, today).await
}

/// Yesterday's and today's wellness metrics into the daily database.
pub async fn sync_daily(config: &Config) -> Result<SyncReport> {
    let garmin = garmin_client(config)?;
    let daily_db = Config::require(&config.notion_daily_db_id, "NOTION_DAILY_DB_ID")?;
    let store = NotionStore::new(&config.notion_token, daily_db);
    let today = now_in(&config.settings).date_naive();
    Ok(sync_daily_records(&garmin, &store, today).await)
}

/// Last week's report into the report database.
pub async fn weekly_report(config: &Config) -> Result<Outcome> {
    let daily_db = Config::require(&config.notion_daily_db_id, "NOTION_DAILY_DB_ID")?;
    let report_db = Config::require(&config.notion_report_db_id, "NOTION_REPORT_DB_ID")?;

    let activities = activity_store(config)?;
    let daily = activities.for_database(daily_db);
    let reports = activities.for_database(report_db);
    let mapper =
        ActivityMapper::for_locale(config.settings.label_locale, config.settings.reference_offset);

    let stores = WeeklyStores {
        activities: &activities,
        daily: &daily,
        reports: &reports,
    };
    Ok(generate_weekly_report(&stores, mapper.labels(), now_in(&config.settings)).await?)
}

/// Activity log into the Google spreadsheet.
pub async fn export_sheet(config: &Config) -> Result<usize> {
    let (api, folder) = google_api(config)?;
    let store = activity_store(config)?;
    let sheet = SheetsClient::open(api, folder).await?;
    Ok(sheets::export_sheet(&store, &sheet, config.settings.reference_offset).await?)
}

/// Activity journal into the Google document.
pub async fn export_doc(config: &Config) -> Result<usize> {
    let (api, folder) = google_api(config)?;
    let store = activity_store(config)?;
    let doc = DocsClient::open(api, folder).await?;
    Ok(docs::export_journal(&store, &doc, config.settings.reference_offset).await?)
}

/// Coach advice onto the newest activity.
pub async fn coach_advice(config: &Config) -> Result<Option<String>> {
    let api_key = Config::require(&config.gemini_api_key, "GEMINI_API_KEY")?;
    let store = activity_store(config)?;
    if let Err(e) = store
        .ensure_properties(&[(properties::COACH_ADVICE, FieldKind::Text)])
        .await
    {
        tracing::warn!(error = %e, "Could not ensure advice property");
    }

    let gemini = GeminiClient::new(api_key, &config.gemini_model);
    Ok(coach::run_coach(&store, &gemini, now_in(&config.settings)).await?)
}

/// Every job in order. The activity sync is fatal on failure; optional
/// jobs run only when configured and their failures are logged.
pub async fn run_all(config: &Config) -> Result<SyncReport> {
    let report = sync_activities(config).await?;

    if config.notion_daily_db_id.is_some() {
        log_failure("sync-daily", sync_daily(config).await);
        if config.notion_report_db_id.is_some() {
            log_failure("weekly-report", weekly_report(config).await);
        }
    }
    if config.google_access_token.is_some() && config.google_drive_folder_id.is_some() {
        log_failure("export-sheet", export_sheet(config).await);
        log_failure("export-doc", export_doc(config).await);
    }
    if config.gemini_api_key.is_some() {
        log_failure("coach", coach_advice(config).await);
    }

    Ok(report)
}

fn log_failure<T>(job: &str, result: Result<T>) {
    if let Err(e) = result {
        tracing::error!(job, error = %e, "Job failed; continuing");
    }
}
