// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly running report, created once per week.

use chrono::{DateTime, FixedOffset};

use crate::db::{properties, DestinationStore};
use crate::error::StoreError;
use crate::models::{
    Block, DateCondition, DateValue, DestinationRecord, FieldValue, Fields, Filter, Icon, NewRecord,
    Outcome, Query, WeeklyStats,
};
use crate::services::category::LabelTable;
use crate::services::format::round_to;
use crate::time_utils::{previous_week_range, DatePoint};

const REPORT_ICON: &str = "📈";
const NOTES_PLACEHOLDER: &str = "今週のトレーニングの振り返りをここに記載します。";

/// Where the report reads from and writes to.
pub struct WeeklyStores<'a> {
    pub activities: &'a dyn DestinationStore,
    pub daily: &'a dyn DestinationStore,
    pub reports: &'a dyn DestinationStore,
}

/// Report title, e.g. `2024年03月 第1週 レポート (03/04-03/10)`.
pub fn report_title(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> String {
    use chrono::Datelike;
    format!(
        "{} 第{}週 レポート ({}-{})",
        start.format("%Y年%m月"),
        (start.day() - 1) / 7 + 1,
        start.format("%m/%d"),
        end.format("%m/%d")
    )
}

/// Aggregate running activities and daily conditions.
pub fn weekly_stats(activities: &[DestinationRecord], conditions: &[DestinationRecord]) -> WeeklyStats {
    let positive = |r: &DestinationRecord, property: &str| r.number(property).filter(|n| *n > 0.0);

    let distance: f64 = activities
        .iter()
        .filter_map(|r| positive(r, properties::DISTANCE_KM))
        .sum();
    let duration: f64 = activities
        .iter()
        .filter_map(|r| positive(r, properties::DURATION_MIN))
        .sum();
    let heart_rates: Vec<f64> = activities
        .iter()
        .filter_map(|r| positive(r, properties::AVERAGE_HR))
        .collect();
    let hrvs: Vec<f64> = conditions
        .iter()
        .filter_map(|r| positive(r, properties::daily::HRV))
        .collect();

    WeeklyStats {
        distance_km: round_to(distance, 2),
        duration_min: round_to(duration, 1),
        activities_count: activities.len(),
        avg_hr: mean(&heart_rates).round() as i64,
        avg_hrv: mean(&hrvs).round() as i64,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// The report record for a week.
pub fn report_record(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    stats: &WeeklyStats,
) -> NewRecord {
    use properties::report as p;

    let mut fields = Fields::new();
    fields.insert(p::TITLE.to_string(), FieldValue::Title(report_title(start, end)));
    fields.insert(
        p::WEEK.to_string(),
        FieldValue::Date(DateValue::day_range(start.date_naive(), end.date_naive())),
    );
    fields.insert(p::DISTANCE_KM.to_string(), FieldValue::Number(stats.distance_km));
    if stats.avg_hr > 0 {
        fields.insert(p::AVERAGE_HR.to_string(), FieldValue::Number(stats.avg_hr as f64));
    }
    if stats.avg_hrv > 0 {
        fields.insert(p::AVERAGE_HRV.to_string(), FieldValue::Number(stats.avg_hrv as f64));
    }
    fields.insert(p::NOTES.to_string(), FieldValue::Text(NOTES_PLACEHOLDER.to_string()));

    NewRecord {
        fields,
        icon: Some(Icon::Emoji(REPORT_ICON.to_string())),
        body: vec![
            Block::Heading("📊 今週のサマリー".to_string()),
            Block::Bullet(format!("ランニング回数: {}回", stats.activities_count)),
            Block::Bullet(format!("週間合計距離: {} km", stats.distance_km)),
            Block::Bullet(format!("合計時間: {} 分", stats.duration_min)),
        ],
    }
}

fn week_filter(property: &str, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Vec<Filter> {
    vec![
        Filter::Date {
            property: property.to_string(),
            condition: DateCondition::OnOrAfter(DatePoint::Instant(start)),
        },
        Filter::Date {
            property: property.to_string(),
            condition: DateCondition::OnOrBefore(DatePoint::Instant(end)),
        },
    ]
}

/// Create the report for the week before `now`, unless one with the same
/// title already exists.
pub async fn generate_weekly_report(
    stores: &WeeklyStores<'_>,
    labels: &LabelTable,
    now: DateTime<FixedOffset>,
) -> Result<Outcome, StoreError> {
    let (start, end) = previous_week_range(now);
    let title = report_title(start, end);
    tracing::info!(%start, %end, title = %title, "Generating weekly report");

    let existing = stores
        .reports
        .query(
            &Query::filtered(Filter::TitleEquals {
                property: properties::report::TITLE.to_string(),
                value: title.clone(),
            })
            .with_limit(1),
        )
        .await?;
    if let Some(record) = existing.first() {
        tracing::info!(title = %title, "Weekly report already exists; skipping");
        return Ok(Outcome::Unchanged {
            destination_id: record.id.clone(),
        });
    }

    let mut activity_filter = week_filter(properties::DATE, start, end);
    activity_filter.push(Filter::SelectEquals {
        property: properties::CATEGORY.to_string(),
        value: labels.label("Running"),
    });
    let activities = stores
        .activities
        .query(&Query::filtered(Filter::And(activity_filter)))
        .await?;
    let conditions = stores
        .daily
        .query(&Query::filtered(Filter::And(week_filter(
            properties::daily::DATE,
            start,
            end,
        ))))
        .await?;

    let stats = weekly_stats(&activities, &conditions);
    tracing::info!(
        distance_km = stats.distance_km,
        activities = stats.activities_count,
        "Weekly stats computed"
    );

    let created = stores
        .reports
        .create(&report_record(start, end, &stats))
        .await?;
    tracing::info!(title = %title, destination_id = %created.id, "Created weekly report");
    Ok(Outcome::Created {
        destination_id: created.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_report_title() {
        let now = jst().with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap();
        let (start, end) = previous_week_range(now);
        assert_eq!(report_title(start, end), "2024年03月 第1週 レポート (03/04-03/10)");
    }

    #[test]
    fn test_report_title_week_crossing_month() {
        let now = jst().with_ymd_and_hms(2024, 4, 3, 10, 0, 0).unwrap();
        let (start, end) = previous_week_range(now);
        assert_eq!(report_title(start, end), "2024年03月 第4週 レポート (03/25-03/31)");
    }

    #[test]
    fn test_zero_averages_omitted() {
        let now = jst().with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap();
        let (start, end) = previous_week_range(now);
        let record = report_record(start, end, &WeeklyStats::default());
        assert!(!record.fields.contains_key(properties::report::AVERAGE_HR));
        assert!(!record.fields.contains_key(properties::report::AVERAGE_HRV));
        assert_eq!(record.body.len(), 4);
        assert_eq!(record.icon, Some(Icon::Emoji("📈".to_string())));
    }
}
