// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notion database client implementing [`DestinationStore`].
//!
//! Provides:
//! - Database queries with cursor pagination
//! - Page creation (with icon and body blocks) and property updates
//! - Schema updates adding missing columns
//! - Conversion between typed fields and Notion property JSON

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::future::Future;

use crate::db::DestinationStore;
use crate::error::StoreError;
use crate::http::{check_response, read_json};
use crate::models::{
    Block, DateCondition, DateValue, DestinationRecord, FieldKind, FieldValue, Fields, Filter,
    Icon, NewRecord, Query,
};
use crate::time_utils::parse_date_or_datetime;

const NOTION_VERSION: &str = "2022-06-28";
/// Notion caps `page_size` at 100.
const MAX_PAGE_SIZE: usize = 100;

/// Notion database client bound to one database.
#[derive(Clone)]
pub struct NotionStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl NotionStore {
    /// Create a client for the given integration token and database.
    pub fn new(token: &str, database_id: &str) -> Self {
        Self::with_base_url("https://api.notion.com/v1", token, database_id)
    }

    /// Create a client against a custom API base URL.
    pub fn with_base_url(base_url: &str, token: &str, database_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            database_id: database_id.to_string(),
        }
    }

    /// Same credentials, different database.
    pub fn for_database(&self, database_id: &str) -> Self {
        Self {
            database_id: database_id.to_string(),
            ..self.clone()
        }
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Add the given properties to the database schema if missing.
    ///
    /// Notion treats existing properties of the same type as a no-op.
    pub async fn ensure_properties(&self, columns: &[(&str, FieldKind)]) -> Result<(), StoreError> {
        let properties = columns_to_json(columns);
        let url = format!("{}/databases/{}", self.base_url, self.database_id);
        let response = self
            .request(self.http.patch(&url))
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        check_response(response).await?;
        tracing::info!(
            database_id = %self.database_id,
            columns = columns.len(),
            "Database schema checked"
        );
        Ok(())
    }

    /// Create a database under a parent page. Returns the new database ID.
    pub async fn create_database(
        &self,
        parent_page_id: &str,
        title: &str,
        columns: &[(&str, FieldKind)],
        icon: &Icon,
    ) -> Result<String, StoreError> {
        let url = format!("{}/databases", self.base_url);
        let response = self
            .request(self.http.post(&url))
            .json(&database_to_json(parent_page_id, title, columns, icon))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let created: Value = read_json(response).await?;

        let id = created
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("created database has no id".to_string()))?;
        tracing::info!(database_id = %id, title, columns = columns.len(), "Created database");
        Ok(id.to_string())
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }
}

#[async_trait]
impl DestinationStore for NotionStore {
    async fn query(&self, query: &Query) -> Result<Vec<DestinationRecord>, StoreError> {
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let records = collect_pages(query, |body| {
            let request = self.request(self.http.post(&url)).json(&body);
            async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                let page: QueryResponse = read_json(response).await?;
                Ok::<_, StoreError>(page)
            }
        })
        .await?;

        tracing::debug!(count = records.len(), "Notion query complete");
        Ok(records)
    }

    async fn create(&self, record: &NewRecord) -> Result<DestinationRecord, StoreError> {
        let url = format!("{}/pages", self.base_url);
        let mut body = json!({
            "parent": { "database_id": self.database_id },
            "properties": fields_to_json(&record.fields),
        });
        if let Some(icon) = &record.icon {
            body["icon"] = icon_to_json(icon);
        }
        if !record.body.is_empty() {
            body["children"] = Value::Array(record.body.iter().map(block_to_json).collect());
        }

        let response = self
            .request(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let page: Value = read_json(response).await?;
        Ok(page_to_record(&page))
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<DestinationRecord, StoreError> {
        let url = format!("{}/pages/{}", self.base_url, id);
        let response = self
            .request(self.http.patch(&url))
            .json(&json!({ "properties": fields_to_json(fields) }))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let page: Value = read_json(response).await?;
        Ok(page_to_record(&page))
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// Body for the next page of `query`, resuming at `cursor`. `None` once
/// `fetched` records satisfy the query's limit.
fn query_page_body(query: &Query, cursor: Option<&str>, fetched: usize) -> Option<Value> {
    let remaining = query.limit.map(|l| l.saturating_sub(fetched));
    if remaining == Some(0) {
        return None;
    }

    let mut body = Map::new();
    if let Some(filter) = &query.filter {
        body.insert("filter".to_string(), filter_to_json(filter));
    }
    if let Some(sort) = &query.sort {
        body.insert(
            "sorts".to_string(),
            json!([{
                "property": sort.property,
                "direction": if sort.descending { "descending" } else { "ascending" },
            }]),
        );
    }
    if let Some(c) = cursor {
        body.insert("start_cursor".to_string(), json!(c));
    }
    let page_size = remaining.map_or(MAX_PAGE_SIZE, |r| r.min(MAX_PAGE_SIZE));
    body.insert("page_size".to_string(), json!(page_size));
    Some(Value::Object(body))
}

/// Follow `next_cursor` until the store reports no more pages or the limit
/// is reached. `fetch_page` sends one request body.
async fn collect_pages<F, Fut>(
    query: &Query,
    mut fetch_page: F,
) -> Result<Vec<DestinationRecord>, StoreError>
where
    F: FnMut(Value) -> Fut,
    Fut: Future<Output = Result<QueryResponse, StoreError>>,
{
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;

    while let Some(body) = query_page_body(query, cursor.as_deref(), records.len()) {
        let page = fetch_page(body).await?;
        records.extend(page.results.iter().map(page_to_record));

        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            _ => break,
        }
    }

    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    Ok(records)
}

fn kind_key(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "number",
        FieldKind::Text => "rich_text",
        FieldKind::Title => "title",
        FieldKind::Select => "select",
        FieldKind::Date => "date",
        FieldKind::Checkbox => "checkbox",
    }
}

fn columns_to_json(columns: &[(&str, FieldKind)]) -> Map<String, Value> {
    columns
        .iter()
        .map(|(name, kind)| (name.to_string(), json!({ kind_key(*kind): {} })))
        .collect()
}

/// Request body creating a database with `columns` under a page.
pub fn database_to_json(
    parent_page_id: &str,
    title: &str,
    columns: &[(&str, FieldKind)],
    icon: &Icon,
) -> Value {
    json!({
        "parent": { "type": "page_id", "page_id": parent_page_id },
        "title": rich_text(title),
        "properties": columns_to_json(columns),
        "icon": icon_to_json(icon),
    })
}

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn date_to_json(date: &DateValue) -> Value {
    json!({
        "start": date.start.to_wire(),
        "end": date.end.map(|e| e.to_wire()),
    })
}

/// Encode one field as a Notion property value.
pub fn property_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Number(n) => json!({ "number": n }),
        FieldValue::Text(s) => json!({ "rich_text": rich_text(s) }),
        FieldValue::Title(s) => json!({ "title": rich_text(s) }),
        FieldValue::Select(s) => json!({ "select": { "name": s } }),
        FieldValue::Date(d) => json!({ "date": date_to_json(d) }),
        FieldValue::Checkbox(b) => json!({ "checkbox": b }),
    }
}

fn fields_to_json(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), property_to_json(value)))
            .collect(),
    )
}

fn plain_text(items: &Value) -> String {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("plain_text")
                        .or_else(|| item.pointer("/text/content"))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a Notion property value. Empty values (null number, no select,
/// no date) decode to `None`.
pub fn property_from_json(property: &Value) -> Option<FieldValue> {
    let kind = property.get("type")?.as_str()?;
    let value = property.get(kind)?;
    match kind {
        "number" => value.as_f64().map(FieldValue::Number),
        "rich_text" => Some(FieldValue::Text(plain_text(value))),
        "title" => Some(FieldValue::Title(plain_text(value))),
        "select" => value
            .get("name")
            .and_then(Value::as_str)
            .map(|s| FieldValue::Select(s.to_string())),
        "date" => {
            let start = parse_date_or_datetime(value.get("start")?.as_str()?)?;
            let end = value
                .get("end")
                .and_then(Value::as_str)
                .and_then(parse_date_or_datetime);
            Some(FieldValue::Date(DateValue { start, end }))
        }
        "checkbox" => value.as_bool().map(FieldValue::Checkbox),
        _ => None,
    }
}

/// Decode a Notion page object into a record.
pub fn page_to_record(page: &Value) -> DestinationRecord {
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let fields = page
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, prop)| property_from_json(prop).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();
    DestinationRecord { id, fields }
}

fn flatten_and<'a>(filter: &'a Filter, out: &mut Vec<&'a Filter>) {
    match filter {
        Filter::And(filters) => filters.iter().for_each(|f| flatten_and(f, out)),
        other => out.push(other),
    }
}

/// Encode a filter. Nested `And`s are flattened, since Notion limits
/// compound filter depth.
pub fn filter_to_json(filter: &Filter) -> Value {
    let mut leaves = Vec::new();
    flatten_and(filter, &mut leaves);
    if leaves.len() == 1 {
        return leaf_to_json(leaves[0]);
    }
    json!({ "and": leaves.into_iter().map(leaf_to_json).collect::<Vec<_>>() })
}

fn leaf_to_json(filter: &Filter) -> Value {
    match filter {
        Filter::And(_) => filter_to_json(filter),
        Filter::Date {
            property,
            condition,
        } => {
            let condition = match condition {
                DateCondition::OnOrAfter(p) => json!({ "on_or_after": p.to_wire() }),
                DateCondition::OnOrBefore(p) => json!({ "on_or_before": p.to_wire() }),
                DateCondition::Equals(day) => json!({ "equals": day.format("%Y-%m-%d").to_string() }),
            };
            json!({ "property": property, "date": condition })
        }
        Filter::SelectEquals { property, value } => {
            json!({ "property": property, "select": { "equals": value } })
        }
        Filter::TitleEquals { property, value } => {
            json!({ "property": property, "title": { "equals": value } })
        }
        Filter::NumberEquals { property, value } => {
            json!({ "property": property, "number": { "equals": value } })
        }
    }
}

fn icon_to_json(icon: &Icon) -> Value {
    match icon {
        Icon::External(url) => json!({ "type": "external", "external": { "url": url } }),
        Icon::Emoji(emoji) => json!({ "type": "emoji", "emoji": emoji }),
    }
}

fn block_to_json(block: &Block) -> Value {
    let (kind, text) = match block {
        Block::Heading(t) => ("heading_2", t),
        Block::Bullet(t) => ("bulleted_list_item", t),
        Block::Paragraph(t) => ("paragraph", t),
    };
    json!({
        "object": "block",
        "type": kind,
        kind: { "rich_text": rich_text(text) },
    })
}
