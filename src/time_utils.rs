// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing, normalization and formatting.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};

/// Layouts Garmin uses for naive timestamps.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A source timestamp whose zone may or may not be known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTimestamp {
    /// Naive wall-clock time in UTC (e.g. Garmin `startTimeGMT`).
    NaiveUtc(NaiveDateTime),
    /// Naive wall-clock time in the reference zone (e.g. `startTimeLocal`).
    NaiveLocal(NaiveDateTime),
    /// A timestamp with an explicit offset.
    Zoned(DateTime<FixedOffset>),
}

impl SourceTimestamp {
    /// Parse a timestamp string; naive values are read as UTC.
    ///
    /// Accepts RFC 3339 (with `Z` or an offset) and the naive layouts in
    /// [`NAIVE_FORMATS`].
    pub fn parse_utc(raw: &str) -> Option<Self> {
        parse_zoned(raw)
            .map(SourceTimestamp::Zoned)
            .or_else(|| parse_naive(raw).map(SourceTimestamp::NaiveUtc))
    }

    /// Parse a timestamp string; naive values are read as reference-local.
    pub fn parse_local(raw: &str) -> Option<Self> {
        parse_zoned(raw)
            .map(SourceTimestamp::Zoned)
            .or_else(|| parse_naive(raw).map(SourceTimestamp::NaiveLocal))
    }

    /// Normalize to the reference offset. Total, and idempotent when the
    /// result is fed back in as `Zoned`.
    pub fn normalize(&self, tz: FixedOffset) -> DateTime<FixedOffset> {
        match *self {
            SourceTimestamp::NaiveUtc(naive) => Utc.from_utc_datetime(&naive).with_timezone(&tz),
            SourceTimestamp::NaiveLocal(naive) => {
                // A fixed offset has exactly one mapping for every local time.
                tz.from_utc_datetime(&(naive - Duration::seconds(tz.local_minus_utc() as i64)))
            }
            SourceTimestamp::Zoned(dt) => dt.with_timezone(&tz),
        }
    }
}

fn parse_zoned(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Parse a stored date value: a bare day or a full timestamp.
pub fn parse_date_or_datetime(raw: &str) -> Option<DatePoint> {
    if let Some(dt) = parse_zoned(raw) {
        return Some(DatePoint::Instant(dt));
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .map(DatePoint::Day)
}

/// A date value as a store keeps it: day precision or an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePoint {
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl DatePoint {
    /// The instant this point denotes; a bare day is its midnight in `tz`.
    pub fn instant(&self, tz: FixedOffset) -> DateTime<FixedOffset> {
        match *self {
            DatePoint::Instant(dt) => dt.with_timezone(&tz),
            DatePoint::Day(day) => start_of_day(day, tz),
        }
    }

    /// Calendar day of this point in `tz`.
    pub fn day(&self, tz: FixedOffset) -> NaiveDate {
        match *self {
            DatePoint::Day(day) => day,
            DatePoint::Instant(dt) => dt.with_timezone(&tz).date_naive(),
        }
    }

    /// Wire representation (`YYYY-MM-DD` or RFC 3339 with offset).
    pub fn to_wire(&self) -> String {
        match self {
            DatePoint::Day(day) => day.format("%Y-%m-%d").to_string(),
            DatePoint::Instant(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

/// Midnight of `day` in `tz`.
pub fn start_of_day(day: NaiveDate, tz: FixedOffset) -> DateTime<FixedOffset> {
    let naive = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    SourceTimestamp::NaiveLocal(naive).normalize(tz)
}

/// Monday 00:00:00 through Sunday 23:59:59 of the week before `now`.
pub fn previous_week_range(
    now: DateTime<FixedOffset>,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let tz = *now.offset();
    let today = now.date_naive();
    let days_since_monday = today.weekday().num_days_from_monday() as i64;
    let last_monday = today - Duration::days(days_since_monday + 7);
    let start = start_of_day(last_monday, tz);
    let end = start + Duration::days(6) + Duration::hours(23) + Duration::minutes(59)
        + Duration::seconds(59);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_naive_gmt_normalizes_to_reference_zone() {
        let ts = SourceTimestamp::parse_utc("2024-03-01 22:30:00").unwrap();
        let normalized = ts.normalize(jst());
        assert_eq!(normalized.to_rfc3339(), "2024-03-02T07:30:00+09:00");
    }

    #[test]
    fn test_utc_suffix_and_offset_inputs_agree() {
        let a = SourceTimestamp::parse_utc("2024-03-01T22:30:00Z").unwrap();
        let b = SourceTimestamp::parse_utc("2024-03-02T07:30:00+09:00").unwrap();
        let c = SourceTimestamp::parse_local("2024-03-02 07:30:00").unwrap();
        assert_eq!(a.normalize(jst()), b.normalize(jst()));
        assert_eq!(b.normalize(jst()), c.normalize(jst()));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let ts = SourceTimestamp::parse_utc("2024-03-01 22:30:00").unwrap();
        let once = ts.normalize(jst());
        let twice = SourceTimestamp::Zoned(once).normalize(jst());
        assert_eq!(once, twice);
        assert_eq!(once.offset(), twice.offset());
    }

    #[test]
    fn test_fractional_seconds_accepted() {
        let ts = SourceTimestamp::parse_utc("2024-03-01T22:30:00.0").unwrap();
        assert_eq!(ts.normalize(jst()).hour(), 7);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(SourceTimestamp::parse_utc("yesterday").is_none());
        assert!(SourceTimestamp::parse_utc("").is_none());
    }

    #[test]
    fn test_date_point_day_and_instant() {
        let day = parse_date_or_datetime("2024-03-02").unwrap();
        assert_eq!(day.to_wire(), "2024-03-02");
        assert_eq!(
            day.instant(jst()).to_rfc3339(),
            "2024-03-02T00:00:00+09:00"
        );

        let instant = parse_date_or_datetime("2024-03-01T23:30:00.000+00:00").unwrap();
        assert_eq!(
            instant.day(jst()),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_previous_week_range() {
        // Wednesday 2024-03-13
        let now = jst().with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap();
        let (start, end) = previous_week_range(now);
        assert_eq!(start.to_rfc3339(), "2024-03-04T00:00:00+09:00");
        assert_eq!(end.to_rfc3339(), "2024-03-10T23:59:59+09:00");
    }

    #[test]
    fn test_previous_week_range_on_monday() {
        let now = jst().with_ymd_and_hms(2024, 3, 11, 0, 30, 0).unwrap();
        let (start, _) = previous_week_range(now);
        assert_eq!(start.to_rfc3339(), "2024-03-04T00:00:00+09:00");
    }
}
