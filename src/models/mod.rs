// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod daily;
pub mod destination;
pub mod report;

pub use activity::{ActivityMetrics, SourceRecord, Split};
pub use daily::{DailyMetrics, WeeklyStats};
pub use destination::{
    Block, DateCondition, DateValue, DestinationRecord, FieldKind, FieldValue, Fields, Filter, Icon,
    NewRecord, Query, Sort,
};
pub use report::{Outcome, RecordOutcome, SyncReport};
