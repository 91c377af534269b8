// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Declarative mapping from source activities to destination fields.
//!
//! A schema is a list of (property, kind, extractor) entries. Adding a
//! property to the destination means adding one entry here.

use chrono::{DateTime, FixedOffset};

use crate::config::LabelLocale;
use crate::db::{properties, MAX_TEXT_CHARS};
use crate::models::{DateValue, FieldKind, FieldValue, Fields, Icon, NewRecord, SourceRecord, Split};
use crate::services::category::{
    training_effect_label, training_effect_message, Category, CategoryTable, IconTable, LabelTable,
};
use crate::services::format::{format_laps, format_pace, round_to};

/// Canonical name written when an activity has none; localized on write.
pub const UNTITLED_ACTIVITY: &str = "Untitled Activity";

/// Everything an extractor may look at for one activity.
pub struct ActivityContext<'a> {
    pub record: &'a SourceRecord,
    /// Start time in the reference offset
    pub start: DateTime<FixedOffset>,
    /// Canonical (unlocalized) category
    pub category: Category,
    /// Splits to render into the laps blob
    pub splits: &'a [Split],
    pub labels: &'a LabelTable,
}

pub type Extractor = fn(&ActivityContext<'_>) -> Option<FieldValue>;

/// One destination property and how to compute it. An extractor returning
/// `None` leaves the property out of the write.
#[derive(Clone)]
pub struct FieldMapping {
    pub property: String,
    pub kind: FieldKind,
    pub extract: Extractor,
}

impl FieldMapping {
    pub fn new(property: &str, kind: FieldKind, extract: Extractor) -> Self {
        Self {
            property: property.to_string(),
            kind,
            extract,
        }
    }
}

/// The set of destination properties owned by the sync.
#[derive(Clone)]
pub struct ActivitySchema {
    pub date_property: String,
    pub category_property: String,
    pub title_property: String,
    /// Text property holding the provider ID, when the database has one
    pub source_id_property: Option<String>,
    pub fields: Vec<FieldMapping>,
}

fn number_or_zero(value: Option<f64>, places: i32) -> Option<FieldValue> {
    Some(FieldValue::Number(round_to(value.unwrap_or(0.0), places)))
}

fn number_if_present(value: Option<f64>) -> Option<FieldValue> {
    value.map(|v| FieldValue::Number(v.round()))
}

impl Default for ActivitySchema {
    fn default() -> Self {
        use properties as p;

        let fields = vec![
            FieldMapping::new(p::DATE, FieldKind::Date, |c| {
                Some(FieldValue::Date(DateValue::instant(c.start)))
            }),
            FieldMapping::new(p::CATEGORY, FieldKind::Select, |c| {
                Some(FieldValue::Select(c.labels.label(&c.category.category)))
            }),
            FieldMapping::new(p::SUBCATEGORY, FieldKind::Select, |c| {
                Some(FieldValue::Select(c.labels.label(&c.category.subcategory)))
            }),
            FieldMapping::new(p::NAME, FieldKind::Title, |c| {
                Some(FieldValue::Title(activity_title(c.record, c.labels)))
            }),
            FieldMapping::new(p::DISTANCE_KM, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.distance_m.map(|m| m / 1000.0), 2)
            }),
            FieldMapping::new(p::DURATION_MIN, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.duration_s.map(|s| s / 60.0), 2)
            }),
            FieldMapping::new(p::CALORIES, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.calories, 0)
            }),
            FieldMapping::new(p::AVERAGE_PACE, FieldKind::Text, |c| {
                Some(FieldValue::Text(format_pace(
                    c.record.metrics.average_speed.unwrap_or(0.0),
                )))
            }),
            FieldMapping::new(p::GAP, FieldKind::Text, |c| {
                let gap = c
                    .record
                    .metrics
                    .grade_adjusted_speed
                    .map(format_pace)
                    .filter(|pace| !pace.is_empty())
                    .unwrap_or_else(|| "-".to_string());
                Some(FieldValue::Text(gap))
            }),
            FieldMapping::new(p::AVERAGE_HR, FieldKind::Number, |c| {
                number_if_present(c.record.metrics.average_hr)
            }),
            FieldMapping::new(p::MAX_HR, FieldKind::Number, |c| {
                number_if_present(c.record.metrics.max_hr)
            }),
            FieldMapping::new(p::AVERAGE_POWER, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.average_power, 1)
            }),
            FieldMapping::new(p::MAX_POWER, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.max_power, 1)
            }),
            FieldMapping::new(p::TRAINING_EFFECT, FieldKind::Select, |c| {
                let label =
                    training_effect_label(c.record.metrics.training_effect_label.as_deref());
                Some(FieldValue::Select(c.labels.label(&label)))
            }),
            FieldMapping::new(p::AEROBIC, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.aerobic_effect, 1)
            }),
            FieldMapping::new(p::AEROBIC_EFFECT, FieldKind::Select, |c| {
                let message =
                    training_effect_message(c.record.metrics.aerobic_effect_message.as_deref());
                Some(FieldValue::Select(c.labels.label(&message)))
            }),
            FieldMapping::new(p::ANAEROBIC, FieldKind::Number, |c| {
                number_or_zero(c.record.metrics.anaerobic_effect, 1)
            }),
            FieldMapping::new(p::ANAEROBIC_EFFECT, FieldKind::Select, |c| {
                let message =
                    training_effect_message(c.record.metrics.anaerobic_effect_message.as_deref());
                Some(FieldValue::Select(c.labels.label(&message)))
            }),
            FieldMapping::new(p::LAPS, FieldKind::Text, |c| {
                Some(FieldValue::Text(format_laps(c.splits, MAX_TEXT_CHARS)))
            }),
            FieldMapping::new(p::PERSONAL_RECORD, FieldKind::Checkbox, |c| {
                Some(FieldValue::Checkbox(
                    c.record.metrics.personal_record.unwrap_or(false),
                ))
            }),
            FieldMapping::new(p::FAVORITE, FieldKind::Checkbox, |c| {
                Some(FieldValue::Checkbox(c.record.metrics.favorite.unwrap_or(false)))
            }),
        ];

        Self {
            date_property: p::DATE.to_string(),
            category_property: p::CATEGORY.to_string(),
            title_property: p::NAME.to_string(),
            source_id_property: None,
            fields,
        }
    }
}

impl ActivitySchema {
    /// Same schema, additionally recording the provider ID in `property`.
    pub fn with_source_id(mut self, property: &str) -> Self {
        self.source_id_property = Some(property.to_string());
        self
    }
}

/// Activity name, or the localized placeholder when blank.
pub fn activity_title(record: &SourceRecord, labels: &LabelTable) -> String {
    let name = record.name.trim();
    if name.is_empty() {
        labels.label(UNTITLED_ACTIVITY)
    } else {
        name.to_string()
    }
}

/// Turns source records into destination fields using a schema and the
/// category, label and icon tables.
#[derive(Clone)]
pub struct ActivityMapper {
    schema: ActivitySchema,
    categories: CategoryTable,
    labels: LabelTable,
    icons: IconTable,
    tz: FixedOffset,
}

impl ActivityMapper {
    pub fn new(
        schema: ActivitySchema,
        categories: CategoryTable,
        labels: LabelTable,
        icons: IconTable,
        tz: FixedOffset,
    ) -> Self {
        Self {
            schema,
            categories,
            labels,
            icons,
            tz,
        }
    }

    /// Default schema and tables for a label locale.
    pub fn for_locale(locale: LabelLocale, tz: FixedOffset) -> Self {
        let labels = match locale {
            LabelLocale::Japanese => LabelTable::japanese(),
            LabelLocale::English => LabelTable::identity(),
        };
        Self::new(
            ActivitySchema::default(),
            CategoryTable::default(),
            labels,
            IconTable::standard(),
            tz,
        )
    }

    pub fn schema(&self) -> &ActivitySchema {
        &self.schema
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn reference_offset(&self) -> FixedOffset {
        self.tz
    }

    pub fn normalized_start(&self, record: &SourceRecord) -> DateTime<FixedOffset> {
        record.start.normalize(self.tz)
    }

    pub fn category(&self, record: &SourceRecord) -> Category {
        self.categories.classify(&record.type_tag, &record.name)
    }

    /// Category as written to the destination.
    pub fn category_label(&self, record: &SourceRecord) -> String {
        self.labels.label(&self.category(record).category)
    }

    /// Compute every owned field for `record`, rendering laps from `splits`.
    pub fn fields(&self, record: &SourceRecord, splits: &[Split]) -> Fields {
        let context = ActivityContext {
            record,
            start: self.normalized_start(record),
            category: self.category(record),
            splits,
            labels: &self.labels,
        };

        let mut fields: Fields = self
            .schema
            .fields
            .iter()
            .filter_map(|m| (m.extract)(&context).map(|v| (m.property.clone(), v)))
            .collect();

        if let Some(property) = &self.schema.source_id_property {
            fields.insert(property.clone(), FieldValue::Text(record.id.clone()));
        }
        fields
    }

    /// A new destination record with its category icon.
    pub fn new_record(&self, record: &SourceRecord, splits: &[Split]) -> NewRecord {
        let icon = self
            .icons
            .lookup(&self.category(record))
            .map(|url| Icon::External(url.to_string()));
        NewRecord {
            fields: self.fields(record, splits),
            icon,
            body: Vec::new(),
        }
    }

    /// Column definitions for creating missing destination properties.
    pub fn columns(&self) -> Vec<(&str, FieldKind)> {
        let mut columns: Vec<(&str, FieldKind)> = self
            .schema
            .fields
            .iter()
            .map(|m| (m.property.as_str(), m.kind))
            .collect();
        if let Some(property) = &self.schema.source_id_property {
            columns.push((property.as_str(), FieldKind::Text));
        }
        columns
    }
}
