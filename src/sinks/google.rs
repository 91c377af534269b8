// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared Google API plumbing: bearer-token requests and Drive lookup.

use serde::Deserialize;

use crate::error::SinkError;
use crate::http::read_json;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";

/// Authenticated access to the Drive, Sheets and Docs REST APIs.
#[derive(Clone)]
pub struct GoogleApi {
    pub(crate) http: reqwest::Client,
    pub(crate) access_token: String,
    pub(crate) drive_base: String,
    pub(crate) sheets_base: String,
    pub(crate) docs_base: String,
}

/// A Drive file entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

impl GoogleApi {
    /// Create a client with a ready-to-use OAuth access token.
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, None)
    }

    /// Point every API at `base` (e.g. a local mock server).
    pub fn with_base_url(access_token: &str, base: Option<&str>) -> Self {
        let pick = |default: &str, suffix: &str| match base {
            Some(b) => format!("{}{}", b.trim_end_matches('/'), suffix),
            None => default.to_string(),
        };
        Self {
            http: reqwest::Client::new(),
            access_token: access_token.to_string(),
            drive_base: pick(DRIVE_API_BASE, "/drive/v3"),
            sheets_base: pick(SHEETS_API_BASE, "/v4"),
            docs_base: pick(DOCS_API_BASE, "/v1"),
        }
    }

    /// First non-trashed file in `folder_id` of `mime_type` whose name
    /// satisfies `matches`.
    pub async fn find_file<F>(
        &self,
        folder_id: &str,
        mime_type: &str,
        sink: &'static str,
        matches: F,
    ) -> Result<DriveFile, SinkError>
    where
        F: Fn(&str) -> bool,
    {
        let q = format!(
            "'{}' in parents and trashed = false and mimeType = '{}'",
            folder_id, mime_type
        );
        let response = self
            .http
            .get(format!("{}/files", self.drive_base))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", q.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name, mimeType)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(|e| SinkError::http(sink)(e.into()))?;
        let list: FileList = read_json(response).await.map_err(SinkError::http(sink))?;

        for file in &list.files {
            tracing::debug!(file_id = %file.id, name = %file.name, "Found Drive file");
        }
        list.files
            .into_iter()
            .find(|f| matches(&f.name))
            .ok_or_else(|| SinkError::Missing {
                sink,
                message: format!("no matching file in folder {}", folder_id),
            })
    }
}
