// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Destination-side record model: typed fields, filters and queries.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::time_utils::DatePoint;

/// Named fields of a destination record.
pub type Fields = BTreeMap<String, FieldValue>;

/// A date property: a point, or a range when `end` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: DatePoint,
    pub end: Option<DatePoint>,
}

impl DateValue {
    pub fn instant(dt: DateTime<FixedOffset>) -> Self {
        Self {
            start: DatePoint::Instant(dt),
            end: None,
        }
    }

    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: DatePoint::Day(day),
            end: None,
        }
    }

    pub fn day_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: DatePoint::Day(start),
            end: Some(DatePoint::Day(end)),
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Title(String),
    Select(String),
    Date(DateValue),
    Checkbox(bool),
}

/// The type of a destination property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Number,
    Text,
    Title,
    Select,
    Date,
    Checkbox,
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Title(_) => FieldKind::Title,
            FieldValue::Select(_) => FieldKind::Select,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Checkbox(_) => FieldKind::Checkbox,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content of text-like values (text, title, select).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Title(s) | FieldValue::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateValue> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Equality as the store would observe it. Dates compare by instant,
    /// so the same moment written with a different offset is unchanged.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Date(a), FieldValue::Date(b)) => {
                same_point(&a.start, &b.start)
                    && match (&a.end, &b.end) {
                        (None, None) => true,
                        (Some(x), Some(y)) => same_point(x, y),
                        _ => false,
                    }
            }
            (FieldValue::Number(a), FieldValue::Number(b)) => (a - b).abs() < 1e-9,
            _ => self == other,
        }
    }
}

fn same_point(a: &DatePoint, b: &DatePoint) -> bool {
    match (a, b) {
        (DatePoint::Instant(x), DatePoint::Instant(y)) => x == y,
        (DatePoint::Day(x), DatePoint::Day(y)) => x == y,
        _ => false,
    }
}

/// A record as held by the destination store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    /// Store-assigned ID
    pub id: String,
    pub fields: Fields,
}

impl DestinationRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_number)
    }

    pub fn date(&self, name: &str) -> Option<&DateValue> {
        self.field(name).and_then(FieldValue::as_date)
    }

    /// Owned fields in `fields` whose value differs from what is stored.
    pub fn changed_fields(&self, fields: &Fields) -> Fields {
        fields
            .iter()
            .filter(|(name, value)| {
                !self
                    .fields
                    .get(name.as_str())
                    .is_some_and(|stored| stored.same_as(value))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Page icon shown next to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Icon {
    External(String),
    Emoji(String),
}

/// Body content attached to a newly created record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Heading(String),
    Bullet(String),
    Paragraph(String),
}

/// A record to be created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecord {
    pub fields: Fields,
    pub icon: Option<Icon>,
    pub body: Vec<Block>,
}

impl NewRecord {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }
}

/// Date predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum DateCondition {
    OnOrAfter(DatePoint),
    OnOrBefore(DatePoint),
    Equals(NaiveDate),
}

/// Query filter; `And` composes predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Date {
        property: String,
        condition: DateCondition,
    },
    SelectEquals {
        property: String,
        value: String,
    },
    TitleEquals {
        property: String,
        value: String,
    },
    NumberEquals {
        property: String,
        value: f64,
    },
}

impl Filter {
    /// Inclusive window `[center - radius, center + radius]` on a date property.
    pub fn date_window(
        property: &str,
        center: DateTime<FixedOffset>,
        radius: chrono::Duration,
    ) -> Filter {
        Filter::And(vec![
            Filter::Date {
                property: property.to_string(),
                condition: DateCondition::OnOrAfter(DatePoint::Instant(center - radius)),
            },
            Filter::Date {
                property: property.to_string(),
                condition: DateCondition::OnOrBefore(DatePoint::Instant(center + radius)),
            },
        ])
    }

    /// Evaluate against a record, as the store would.
    pub fn matches(&self, record: &DestinationRecord, tz: FixedOffset) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(record, tz)),
            Filter::Date {
                property,
                condition,
            } => {
                let Some(date) = record.date(property) else {
                    return false;
                };
                match condition {
                    DateCondition::OnOrAfter(bound) => {
                        date.start.instant(tz) >= bound.instant(tz)
                    }
                    DateCondition::OnOrBefore(bound) => {
                        date.start.instant(tz) <= bound.instant(tz)
                    }
                    DateCondition::Equals(day) => date.start.day(tz) == *day,
                }
            }
            Filter::SelectEquals { property, value } => {
                matches!(record.field(property), Some(FieldValue::Select(s)) if s == value)
            }
            Filter::TitleEquals { property, value } => {
                matches!(record.field(property), Some(FieldValue::Title(s)) if s == value)
            }
            Filter::NumberEquals { property, value } => record
                .number(property)
                .is_some_and(|n| (n - value).abs() < 1e-9),
        }
    }
}

/// Sort order on one property.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub property: String,
    pub descending: bool,
}

/// A store query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sort: Option<Sort>,
    /// Stop after this many records
    pub limit: Option<usize>,
}

impl Query {
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn newest_first(property: &str) -> Self {
        Self {
            sort: Some(Sort {
                property: property.to_string(),
                descending: true,
            }),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn record_at(dt: DateTime<FixedOffset>) -> DestinationRecord {
        let mut fields = Fields::new();
        fields.insert("date".to_string(), FieldValue::Date(DateValue::instant(dt)));
        fields.insert("type".to_string(), FieldValue::Select("Running".to_string()));
        DestinationRecord {
            id: "page-1".to_string(),
            fields,
        }
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let center = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
        let window = Filter::date_window("date", center, chrono::Duration::minutes(5));

        let edge = record_at(center + chrono::Duration::minutes(5));
        assert!(window.matches(&edge, jst()));

        let past_edge = record_at(center + chrono::Duration::minutes(5) + chrono::Duration::seconds(1));
        assert!(!window.matches(&past_edge, jst()));
    }

    #[test]
    fn test_same_instant_different_offset_is_unchanged() {
        let jst_time = jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap();
        let utc_time = jst_time.with_timezone(&FixedOffset::east_opt(0).unwrap());
        let a = FieldValue::Date(DateValue::instant(jst_time));
        let b = FieldValue::Date(DateValue::instant(utc_time));
        assert!(a.same_as(&b));
    }

    #[test]
    fn test_changed_fields_ignores_equal_values() {
        let record = record_at(jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap());
        let mut owned = Fields::new();
        owned.insert("type".to_string(), FieldValue::Select("Running".to_string()));
        owned.insert("距離 (km)".to_string(), FieldValue::Number(10.0));

        let changed = record.changed_fields(&owned);
        assert_eq!(changed.len(), 1);
        assert!(changed.contains_key("距離 (km)"));
    }

    #[test]
    fn test_select_and_equals_filters() {
        let record = record_at(jst().with_ymd_and_hms(2024, 3, 2, 7, 30, 0).unwrap());
        let filter = Filter::And(vec![
            Filter::SelectEquals {
                property: "type".to_string(),
                value: "Running".to_string(),
            },
            Filter::Date {
                property: "date".to_string(),
                condition: DateCondition::Equals(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
            },
        ]);
        assert!(filter.matches(&record, jst()));

        let wrong = Filter::SelectEquals {
            property: "type".to_string(),
            value: "Cycling".to_string(),
        };
        assert!(!wrong.matches(&record, jst()));
    }
}
