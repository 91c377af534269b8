// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Source-side activity model, independent of any provider's wire format.

use serde::{Deserialize, Serialize};

use crate::time_utils::SourceTimestamp;

/// An activity as fetched from the source provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Provider activity ID (opaque)
    pub id: String,
    pub start: SourceTimestamp,
    /// Free-form type tag (e.g. "indoor_cycling")
    pub type_tag: String,
    /// Activity name/title
    pub name: String,
    pub metrics: ActivityMetrics,
    /// Splits embedded in the list response, if any
    pub splits: Option<Vec<Split>>,
}

/// Metrics carried by an activity. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Distance in meters
    pub distance_m: Option<f64>,
    /// Duration in seconds
    pub duration_s: Option<f64>,
    pub calories: Option<f64>,
    /// Average speed in m/s
    pub average_speed: Option<f64>,
    /// Grade-adjusted average speed in m/s
    pub grade_adjusted_speed: Option<f64>,
    pub average_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub average_power: Option<f64>,
    pub max_power: Option<f64>,
    /// Raw label, e.g. "AEROBIC_BASE"
    pub training_effect_label: Option<String>,
    pub aerobic_effect: Option<f64>,
    /// Raw message, e.g. "IMPROVING_AEROBIC_BASE_8"
    pub aerobic_effect_message: Option<String>,
    pub anaerobic_effect: Option<f64>,
    pub anaerobic_effect_message: Option<String>,
    pub personal_record: Option<bool>,
    pub favorite: Option<bool>,
}

/// A sub-interval (lap) of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// 1-based lap index as reported by the provider
    pub index: u32,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Average speed in m/s
    pub average_speed: f64,
    pub average_hr: Option<f64>,
    /// Provider tag, e.g. "INTERVAL_ACTIVE" or "REST"
    pub split_type: Option<String>,
}
