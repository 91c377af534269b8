// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived text fields: pace, durations, and the laps summary.

use crate::models::Split;

/// Split types kept even when they cover no distance or time.
pub const REST_INTERVAL_TAGS: &[&str] = &["REST", "RWD_STAND", "INTERVAL_REST"];

/// Pace for a speed in m/s, as `m:ss /km`; empty for non-positive speed.
pub fn format_pace(speed_mps: f64) -> String {
    if !(speed_mps.is_finite() && speed_mps > 0.0) {
        return String::new();
    }
    let pace_min_km = 1000.0 / (speed_mps * 60.0);
    let minutes = pace_min_km.trunc() as u64;
    let seconds = ((pace_min_km - minutes as f64) * 60.0).trunc() as u64;
    format!("{}:{:02} /km", minutes, seconds)
}

/// Seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn is_rest_interval(split: &Split) -> bool {
    split
        .split_type
        .as_deref()
        .is_some_and(|t| REST_INTERVAL_TAGS.iter().any(|r| t.eq_ignore_ascii_case(r)))
}

fn is_negligible(split: &Split) -> bool {
    split.distance_m < 1.0 && split.duration_s < 1.0
}

fn format_split(split: &Split) -> String {
    let mut parts = vec![
        format!("{:.2}km", split.distance_m / 1000.0),
        format_duration(split.duration_s),
    ];
    let pace = format_pace(split.average_speed);
    if !pace.is_empty() {
        parts.push(pace);
    }
    if is_rest_interval(split) {
        parts.push("rest".to_string());
    }
    if let Some(hr) = split.average_hr.filter(|hr| *hr > 0.0) {
        parts.push(format!("{}bpm", hr.round() as i64));
    }
    format!("Lap {}: {}", split.index, parts.join(", "))
}

/// One line per split, negligible non-rest splits dropped, truncated to
/// `max_chars` at a line boundary.
pub fn format_laps(splits: &[Split], max_chars: usize) -> String {
    let lines: Vec<String> = splits
        .iter()
        .filter(|s| is_rest_interval(s) || !is_negligible(s))
        .map(format_split)
        .collect();
    truncate_lines(&lines.join("\n"), max_chars)
}

/// Truncate to at most `max_chars` characters, dropping whole lines. A first
/// line longer than the limit is cut at a character boundary.
pub fn truncate_lines(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for line in text.lines() {
        let sep = usize::from(!out.is_empty());
        let len = line.chars().count();
        if used + sep + len > max_chars {
            break;
        }
        if sep == 1 {
            out.push('\n');
        }
        out.push_str(line);
        used += sep + len;
    }

    if out.is_empty() {
        return truncate_chars(text, max_chars);
    }
    out
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
