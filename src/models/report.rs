// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Per-record outcomes of a reconciliation run.

use serde::Serialize;

/// What happened to one source record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { destination_id: String },
    Updated { destination_id: String },
    /// Matched, and every owned field already held the computed value
    Unchanged { destination_id: String },
    Error { message: String },
}

/// Outcome for one source ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub source_id: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Summary of a reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub records: Vec<RecordOutcome>,
}

impl SyncReport {
    pub fn push(&mut self, source_id: impl Into<String>, outcome: Outcome) {
        self.records.push(RecordOutcome {
            source_id: source_id.into(),
            outcome,
        });
    }

    /// Fold another report's outcomes into this one.
    pub fn merge(&mut self, other: SyncReport) {
        self.records.extend(other.records);
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged { .. }))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Error { .. }))
    }

    /// True when the batch was non-empty and no record succeeded.
    pub fn all_failed(&self) -> bool {
        !self.records.is_empty() && self.errors() == self.records.len()
    }

    /// Outcome for a source ID, if it was processed.
    pub fn outcome_for(&self, source_id: &str) -> Option<&Outcome> {
        self.records
            .iter()
            .find(|r| r.source_id == source_id)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}
