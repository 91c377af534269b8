// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciling upsert of source activities into the destination store.
//!
//! For each source record the engine queries the store for records near the
//! record's start time and either merges into the best match or creates a
//! new record. Only fields owned by the mapping schema are ever written, so
//! anything added to a destination record by hand survives a re-sync.

use chrono::{DateTime, Duration, FixedOffset};
use std::collections::HashMap;

use crate::config::{MatchMode, SyncSettings};
use crate::db::DestinationStore;
use crate::error::StoreError;
use crate::models::{DestinationRecord, Filter, Outcome, Query, SourceRecord, Split, SyncReport};
use crate::services::fetch::FetchedBatch;
use crate::services::garmin::ActivitySource;
use crate::services::mapping::{activity_title, ActivityMapper};

/// How candidates are matched to a source record.
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    /// Inclusive radius of the candidate window
    pub tolerance: Duration,
    pub mode: MatchMode,
}

impl From<&SyncSettings> for MatchSettings {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            mode: settings.match_mode,
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from(&SyncSettings::default())
    }
}

/// The upsert engine. Holds only borrowed collaborators; one instance can
/// run any number of batches.
pub struct Reconciler<'a> {
    store: &'a dyn DestinationStore,
    detail: Option<&'a dyn ActivitySource>,
    mapper: &'a ActivityMapper,
    settings: MatchSettings,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        store: &'a dyn DestinationStore,
        mapper: &'a ActivityMapper,
        settings: MatchSettings,
    ) -> Self {
        Self {
            store,
            detail: None,
            mapper,
            settings,
        }
    }

    /// Fetch lap detail from `source` for records that carry no splits.
    pub fn with_detail_source(mut self, source: &'a dyn ActivitySource) -> Self {
        self.detail = Some(source);
        self
    }

    /// Reconcile a fetched batch; records rejected at conversion are
    /// reported as errors under their IDs.
    pub async fn reconcile_batch(&self, batch: &FetchedBatch) -> SyncReport {
        let mut report = SyncReport::default();
        for rejected in &batch.rejected {
            report.push(
                rejected.id.clone(),
                Outcome::Error {
                    message: rejected.reason.clone(),
                },
            );
        }
        report.merge(self.reconcile(&batch.records).await);
        report
    }

    /// Upsert every record in order. A failure on one record is recorded
    /// and the rest continue.
    pub async fn reconcile(&self, batch: &[SourceRecord]) -> SyncReport {
        let mut report = SyncReport::default();
        // destination ID -> source ID that claimed it during this run
        let mut claims: HashMap<String, String> = HashMap::new();

        for record in batch {
            let outcome = match self.reconcile_one(record, &claims).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        activity_id = %record.id,
                        error = %e,
                        "Failed to reconcile activity"
                    );
                    Outcome::Error {
                        message: e.to_string(),
                    }
                }
            };

            match &outcome {
                Outcome::Created { destination_id }
                | Outcome::Updated { destination_id }
                | Outcome::Unchanged { destination_id } => {
                    claims.insert(destination_id.clone(), record.id.clone());
                }
                Outcome::Error { .. } => {}
            }
            report.push(record.id.clone(), outcome);
        }

        tracing::info!(
            created = report.created(),
            updated = report.updated(),
            unchanged = report.unchanged(),
            errors = report.errors(),
            "Reconciliation finished"
        );
        report
    }

    async fn reconcile_one(
        &self,
        record: &SourceRecord,
        claims: &HashMap<String, String>,
    ) -> Result<Outcome, StoreError> {
        let start = self.mapper.normalized_start(record);
        let schema = self.mapper.schema();
        let query = Query::filtered(Filter::date_window(
            &schema.date_property,
            start,
            self.settings.tolerance,
        ));
        let candidates = self.store.query(&query).await?;

        let splits = self.splits_for(record).await;

        match self.select_match(record, start, &candidates, claims) {
            Some(existing) => {
                let fields = self.mapper.fields(record, &splits);
                let changed = existing.changed_fields(&fields);
                if changed.is_empty() {
                    tracing::debug!(
                        activity_id = %record.id,
                        destination_id = %existing.id,
                        "Activity already up to date"
                    );
                    return Ok(Outcome::Unchanged {
                        destination_id: existing.id.clone(),
                    });
                }

                let updated = self.store.update(&existing.id, &changed).await?;
                tracing::info!(
                    activity_id = %record.id,
                    destination_id = %updated.id,
                    fields = changed.len(),
                    "Updated activity record"
                );
                Ok(Outcome::Updated {
                    destination_id: updated.id,
                })
            }
            None => {
                let created = self
                    .store
                    .create(&self.mapper.new_record(record, &splits))
                    .await?;
                tracing::info!(
                    activity_id = %record.id,
                    destination_id = %created.id,
                    "Created activity record"
                );
                Ok(Outcome::Created {
                    destination_id: created.id,
                })
            }
        }
    }

    /// Embedded splits, else lap detail from the provider. A failed detail
    /// fetch degrades to no laps.
    async fn splits_for(&self, record: &SourceRecord) -> Vec<Split> {
        if let Some(splits) = record.splits.as_ref().filter(|s| !s.is_empty()) {
            return splits.clone();
        }
        let Some(source) = self.detail else {
            return Vec::new();
        };

        match source.activity_splits(&record.id).await {
            Ok(splits) => splits,
            Err(e) => {
                tracing::warn!(
                    activity_id = %record.id,
                    error = %e,
                    "Could not fetch lap detail; writing without laps"
                );
                record.splits.clone().unwrap_or_default()
            }
        }
    }

    /// Pick the destination record this source record corresponds to.
    ///
    /// Preference: same source ID, then same calendar day (closest first),
    /// then the nearest candidate within tolerance.
    fn select_match<'c>(
        &self,
        record: &SourceRecord,
        start: DateTime<FixedOffset>,
        candidates: &'c [DestinationRecord],
        claims: &HashMap<String, String>,
    ) -> Option<&'c DestinationRecord> {
        let tz = self.mapper.reference_offset();
        let schema = self.mapper.schema();
        let source_id_property = schema.source_id_property.as_deref();

        let strict = match self.settings.mode {
            MatchMode::Strict => Some((
                self.mapper.category_label(record),
                activity_title(record, self.mapper.labels()),
            )),
            MatchMode::Lenient => None,
        };

        let eligible: Vec<(&DestinationRecord, Duration)> = candidates
            .iter()
            .filter(|c| claims.get(&c.id).map_or(true, |owner| owner == &record.id))
            .filter(|c| match source_id_property.and_then(|p| c.text(p)) {
                Some(id) if !id.is_empty() => id == record.id,
                _ => true,
            })
            .filter(|c| match &strict {
                Some((category, title)) => {
                    c.text(&schema.category_property) == Some(category.as_str())
                        && c.text(&schema.title_property) == Some(title.as_str())
                }
                None => true,
            })
            .filter_map(|c| {
                let date = c.date(&schema.date_property)?;
                Some((c, (date.start.instant(tz) - start).abs()))
            })
            .collect();

        if let Some(property) = source_id_property {
            if let Some((c, _)) = eligible
                .iter()
                .find(|(c, _)| c.text(property) == Some(record.id.as_str()))
            {
                return Some(c);
            }
        }

        let day = start.date_naive();
        let same_day = eligible
            .iter()
            .filter(|(c, _)| {
                c.date(&schema.date_property)
                    .is_some_and(|d| d.start.day(tz) == day)
            })
            .min_by_key(|(_, diff)| *diff);
        if let Some((c, _)) = same_day {
            return Some(c);
        }

        eligible
            .iter()
            .min_by_key(|(_, diff)| *diff)
            .filter(|(_, diff)| *diff <= self.settings.tolerance)
            .map(|(c, _)| *c)
    }
}
