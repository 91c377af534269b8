// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for each external seam, and their mapping to exit status.

use crate::config::ConfigError;
use crate::http::HttpFailure;

/// Errors from the Garmin Connect read API.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Garmin request failed: {0}")]
    Transport(String),

    #[error("Garmin rejected the access token")]
    Unauthorized,

    #[error("Garmin rate limit hit")]
    RateLimited,

    #[error("Garmin HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Garmin response could not be decoded: {0}")]
    Decode(String),
}

impl From<HttpFailure> for ProviderError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Transport(msg) => ProviderError::Transport(msg),
            HttpFailure::Unauthorized => ProviderError::Unauthorized,
            HttpFailure::RateLimited => ProviderError::RateLimited,
            HttpFailure::Status { status, body } => ProviderError::Status { status, body },
            HttpFailure::Decode(msg) => ProviderError::Decode(msg),
        }
    }
}

/// Errors from a single Destination Store call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(String),

    #[error("Store rejected the token")]
    Unauthorized,

    #[error("Store rate limit hit")]
    RateLimited,

    #[error("Store HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Store response could not be decoded: {0}")]
    Decode(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<HttpFailure> for StoreError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Transport(msg) => StoreError::Transport(msg),
            HttpFailure::Unauthorized => StoreError::Unauthorized,
            HttpFailure::RateLimited => StoreError::RateLimited,
            HttpFailure::Status { status, body } => StoreError::Status { status, body },
            HttpFailure::Decode(msg) => StoreError::Decode(msg),
        }
    }
}

/// Errors from a secondary sink (spreadsheet, document, text generation).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("{sink} request failed: {failure}")]
    Http {
        sink: &'static str,
        failure: HttpFailure,
    },

    #[error("{sink}: {message}")]
    Missing {
        sink: &'static str,
        message: String,
    },

    #[error("Reading source records failed: {0}")]
    Store(#[from] StoreError),
}

impl SinkError {
    pub fn http(sink: &'static str) -> impl FnOnce(HttpFailure) -> SinkError {
        move |failure| SinkError::Http { sink, failure }
    }
}

/// Top-level error for a CLI job.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Setup(#[from] ConfigError),

    #[error("Source provider error: {0}")]
    ProviderFetch(#[from] ProviderError),

    #[error("Destination store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sink write failed: {0}")]
    SinkWrite(#[from] SinkError),

    #[error("Every record in the batch failed ({0} errors)")]
    BatchFailed(usize),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::BatchFailed(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for jobs
pub type Result<T> = std::result::Result<T, SyncError>;
