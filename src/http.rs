// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response classification shared by every HTTP client in the crate.

use serde::de::DeserializeOwned;

/// Classified failure of a single HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum HttpFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HttpFailure {
    fn from(e: reqwest::Error) -> Self {
        HttpFailure::Transport(e.to_string())
    }
}

/// Check response status and return error if not successful.
pub async fn check_response(response: reqwest::Response) -> Result<(), HttpFailure> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(classify(response).await)
}

/// Check response and parse JSON body.
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HttpFailure> {
    if !response.status().is_success() {
        return Err(classify(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| HttpFailure::Decode(e.to_string()))
}

async fn classify(response: reqwest::Response) -> HttpFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, body)
}

/// Map a non-success status code to a failure.
pub fn classify_status(status: u16, body: String) -> HttpFailure {
    match status {
        401 | 403 => HttpFailure::Unauthorized,
        429 => {
            tracing::warn!("Rate limit hit (429)");
            HttpFailure::RateLimited
        }
        _ => HttpFailure::Status { status, body },
    }
}
