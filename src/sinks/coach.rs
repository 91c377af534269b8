// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coaching advice from Gemini, written back to the latest activity.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use serde::Deserialize;
use serde_json::json;

use crate::db::{properties as p, DestinationStore, MAX_TEXT_CHARS};
use crate::error::SinkError;
use crate::http::read_json;
use crate::models::{DateCondition, DestinationRecord, FieldValue, Fields, Filter, Query};
use crate::services::format::truncate_chars;
use crate::sinks::{recent_activities, TextGenerator};
use crate::time_utils::DatePoint;

const SINK: &str = "gemini";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Days of history the coach looks at.
pub const COACH_LOOKBACK_DAYS: i64 = 30;

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(GEMINI_API_BASE, api_key, model)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, SinkError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await
            .map_err(|e| SinkError::http(SINK)(e.into()))?;
        let body: GenerateResponse = read_json(response).await.map_err(SinkError::http(SINK))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SinkError::Missing {
                sink: SINK,
                message: "response contained no text".to_string(),
            });
        }
        Ok(text)
    }
}

/// Prompt summarizing recent training, newest first.
pub fn coach_prompt(records: &[DestinationRecord], tz: FixedOffset) -> String {
    let mut prompt = String::from(
        "あなたはランニングコーチです。以下は直近30日間のトレーニング記録です。\
         疲労度とトレーニング負荷を評価し、次の1週間に向けた具体的なアドバイスを日本語で簡潔に書いてください。\n\n",
    );

    for r in records {
        let when = r
            .date(p::DATE)
            .map(|d| d.start.instant(tz).format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        prompt.push_str(&format!(
            "- {} {} {}: {} km, {} 分",
            when,
            r.text(p::CATEGORY).unwrap_or("-"),
            r.text(p::NAME).unwrap_or("-"),
            r.number(p::DISTANCE_KM).unwrap_or(0.0),
            r.number(p::DURATION_MIN).unwrap_or(0.0)
        ));
        if let Some(pace) = r.text(p::AVERAGE_PACE).filter(|s| !s.is_empty()) {
            prompt.push_str(&format!(", ペース {}", pace));
        }
        if let Some(hr) = r.number(p::AVERAGE_HR) {
            prompt.push_str(&format!(", 平均心拍 {}", hr));
        }
        if let Some(effect) = r.text(p::TRAINING_EFFECT) {
            prompt.push_str(&format!(", {}", effect));
        }
        prompt.push('\n');
    }
    prompt
}

/// Generate advice from the last 30 days and store it on the newest
/// activity. Returns the ID of the updated record, or `None` when there
/// was nothing to advise on.
pub async fn run_coach(
    store: &dyn DestinationStore,
    generator: &dyn TextGenerator,
    now: DateTime<FixedOffset>,
) -> Result<Option<String>, SinkError> {
    let since = now - Duration::days(COACH_LOOKBACK_DAYS);
    let records = recent_activities(
        store,
        Query::filtered(Filter::Date {
            property: p::DATE.to_string(),
            condition: DateCondition::OnOrAfter(DatePoint::Instant(since)),
        }),
    )
    .await?;

    let Some(latest) = records.first() else {
        tracing::info!("No recent activities; skipping coach advice");
        return Ok(None);
    };

    let prompt = coach_prompt(&records, *now.offset());
    let advice = generator.generate(&prompt).await?;

    let mut fields = Fields::new();
    fields.insert(
        p::COACH_ADVICE.to_string(),
        FieldValue::Text(truncate_chars(advice.trim(), MAX_TEXT_CHARS)),
    );
    let updated = store.update(&latest.id, &fields).await?;
    tracing::info!(
        destination_id = %updated.id,
        records = records.len(),
        "Stored coach advice"
    );
    Ok(Some(updated.id))
}
