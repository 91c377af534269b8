// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily wellness metrics and weekly aggregates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wellness metrics for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub hrv: Option<f64>,
    /// Resting heart rate
    pub rhr: Option<f64>,
    pub sleep_score: Option<f64>,
    pub total_steps: Option<f64>,
    pub step_goal: Option<f64>,
    /// Walking distance in km (2 dp)
    pub total_distance_km: Option<f64>,
}

impl DailyMetrics {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            hrv: None,
            rhr: None,
            sleep_score: None,
            total_steps: None,
            step_goal: None,
            total_distance_km: None,
        }
    }

    /// True when no metric could be fetched.
    pub fn is_empty(&self) -> bool {
        self.hrv.is_none()
            && self.rhr.is_none()
            && self.sleep_score.is_none()
            && self.total_steps.is_none()
            && self.step_goal.is_none()
            && self.total_distance_km.is_none()
    }
}

/// Aggregates for one week of running.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyStats {
    /// Total distance in km (2 dp)
    pub distance_km: f64,
    /// Total duration in minutes (1 dp)
    pub duration_min: f64,
    pub activities_count: usize,
    /// Rounded average heart rate; 0 when unknown
    pub avg_hr: i64,
    /// Rounded average HRV; 0 when unknown
    pub avg_hrv: i64,
}
