// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! garmin-notion-sync CLI
//!
//! Syncs Garmin Connect activities and wellness data into Notion and
//! exports the result to Google Sheets, Google Docs and Gemini.

use clap::{Parser, Subcommand};
use garmin_notion_sync::{
    config::Config,
    error::{Result, SyncError},
    jobs,
    models::SyncReport,
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "garmin-notion-sync")]
#[command(about = "Sync Garmin Connect data into Notion and export it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile recent activities into the activity database
    SyncActivities,

    /// Upsert yesterday's and today's wellness metrics
    SyncDaily,

    /// Create last week's report if it does not exist yet
    WeeklyReport,

    /// Rewrite the Google spreadsheet from the activity database
    ExportSheet,

    /// Rewrite the Google Docs journal from the activity database
    ExportDoc,

    /// Generate coaching advice for the latest activity
    Coach,

    /// Run every configured job
    RunAll,

    /// Create the activity, daily and report databases under NOTION_PARENT_PAGE_ID
    InitDatabases,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "Job failed");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        fetch_mode = ?config.settings.fetch_mode,
        match_mode = ?config.settings.match_mode,
        tolerance_minutes = config.settings.tolerance.num_minutes(),
        "Configuration loaded"
    );

    match command {
        Commands::SyncActivities => finish_batch(jobs::sync_activities(&config).await?),
        Commands::SyncDaily => finish_batch(jobs::sync_daily(&config).await?),
        Commands::WeeklyReport => {
            let outcome = jobs::weekly_report(&config).await?;
            print_json(&outcome)
        }
        Commands::ExportSheet => {
            let rows = jobs::export_sheet(&config).await?;
            tracing::info!(rows, "Spreadsheet export finished");
            Ok(())
        }
        Commands::ExportDoc => {
            let records = jobs::export_doc(&config).await?;
            tracing::info!(records, "Journal export finished");
            Ok(())
        }
        Commands::Coach => {
            let updated = jobs::coach_advice(&config).await?;
            tracing::info!(destination_id = ?updated, "Coach finished");
            Ok(())
        }
        Commands::RunAll => finish_batch(jobs::run_all(&config).await?),
        Commands::InitDatabases => {
            let created = jobs::init_databases(&config).await?;
            print_json(&created)
        }
    }
}

/// Print the report and turn a fully failed batch into exit status 2.
fn finish_batch(report: SyncReport) -> Result<()> {
    tracing::info!(
        created = report.created(),
        updated = report.updated(),
        unchanged = report.unchanged(),
        errors = report.errors(),
        "Sync finished"
    );
    print_json(&report)?;
    jobs::batch_status(&report)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SyncError::Internal(e.into()))?;
    println!("{}", json);
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("garmin_notion_sync=debug".parse().expect("valid directive"))
                .add_directive("info".parse().expect("valid directive")),
        )
        .with(format)
        .init();
}
