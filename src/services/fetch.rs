// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch fetching from the source provider.
//!
//! Two strategies: offset/limit paging, and walking backwards from today in
//! fixed-size date windows. Both are strictly sequential and collapse
//! duplicate IDs, keeping the last fetched copy at the first position.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use crate::config::{FetchMode, SyncSettings};
use crate::error::ProviderError;
use crate::models::SourceRecord;
use crate::services::garmin::{ActivitySource, GarminActivity, RejectedActivity};

/// Result of a fetch: usable records plus those that failed conversion.
#[derive(Debug, Default)]
pub struct FetchedBatch {
    pub records: Vec<SourceRecord>,
    pub rejected: Vec<RejectedActivity>,
}

/// Fetch using the strategy configured in `settings`.
pub async fn fetch_batch(
    source: &dyn ActivitySource,
    settings: &SyncSettings,
    today: NaiveDate,
) -> Result<FetchedBatch, ProviderError> {
    let raw = match settings.fetch_mode {
        FetchMode::Paged => fetch_paged(source, settings.fetch_limit, settings.chunk_size).await?,
        FetchMode::Windowed => {
            fetch_windowed(source, today, settings.lookback_days, settings.window_days).await?
        }
    };
    Ok(convert(dedup_by_id(raw, |a| a.activity_id.clone())))
}

/// Page through the activity list until a short or empty page, or until
/// `limit` activities have been read.
pub async fn fetch_paged(
    source: &dyn ActivitySource,
    limit: usize,
    page_size: usize,
) -> Result<Vec<GarminActivity>, ProviderError> {
    let mut all = Vec::new();
    let page_size = page_size.max(1);

    while all.len() < limit {
        let want = page_size.min(limit - all.len());
        let page = source.activities_page(all.len(), want).await?;
        let fetched = page.len();
        tracing::debug!(start = all.len(), fetched, "Fetched activity page");

        all.extend(page);
        if fetched < want {
            break;
        }
    }

    all.truncate(limit);
    Ok(all)
}

/// Walk backwards from `today` in windows of `window_days` until
/// `lookback_days` are covered.
pub async fn fetch_windowed(
    source: &dyn ActivitySource,
    today: NaiveDate,
    lookback_days: i64,
    window_days: i64,
) -> Result<Vec<GarminActivity>, ProviderError> {
    let window_days = window_days.max(1);
    let earliest = Duration::try_days(lookback_days.max(0))
        .and_then(|d| today.checked_sub_signed(d))
        .unwrap_or(NaiveDate::MIN);
    let mut all = Vec::new();
    let mut end = today;

    loop {
        let start = Duration::try_days(window_days - 1)
            .and_then(|d| end.checked_sub_signed(d))
            .map_or(earliest, |s| s.max(earliest));
        let window = source.activities_between(start, end).await?;
        tracing::debug!(%start, %end, fetched = window.len(), "Fetched activity window");
        all.extend(window);

        match start.pred_opt() {
            Some(previous) if previous >= earliest => end = previous,
            _ => break,
        }
    }

    Ok(all)
}

/// Collapse items sharing an ID: the most recently fetched copy wins, at
/// the position where the ID first appeared. Items without an ID are all
/// kept.
pub fn dedup_by_id<T, F>(items: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> Option<String>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let Some(key) = id(&item) else {
            out.push(item);
            continue;
        };
        match positions.get(&key) {
            Some(&pos) => out[pos] = item,
            None => {
                positions.insert(key, out.len());
                out.push(item);
            }
        }
    }
    out
}

fn convert(raw: Vec<GarminActivity>) -> FetchedBatch {
    let mut batch = FetchedBatch::default();
    for activity in raw {
        match activity.into_source_record() {
            Ok(record) => batch.records.push(record),
            Err(rejected) => {
                tracing::warn!(
                    activity_id = %rejected.id,
                    reason = %rejected.reason,
                    "Rejecting activity"
                );
                batch.rejected.push(rejected);
            }
        }
    }
    batch
}
