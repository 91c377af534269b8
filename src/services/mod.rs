// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - sync logic layer.

pub mod category;
pub mod daily;
pub mod fetch;
pub mod format;
pub mod garmin;
pub mod mapping;
pub mod reconcile;
pub mod weekly;

pub use category::{Category, CategoryTable, IconTable, LabelTable};
pub use fetch::{fetch_batch, FetchedBatch};
pub use garmin::{ActivitySource, GarminActivity, GarminClient, StepSummary, WellnessSource};
pub use mapping::{ActivityMapper, ActivitySchema, FieldMapping};
pub use reconcile::{MatchSettings, Reconciler};
