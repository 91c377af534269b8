// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin → Notion sync: pull activity and wellness data from Garmin Connect
//! and reconcile it into Notion databases.
//!
//! This crate provides the reconciling upsert engine plus the jobs built on
//! it (activity sync, daily conditions, weekly report) and the secondary
//! sinks that export the reconciled records to Google Sheets, Google Docs
//! and Gemini.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod jobs;
pub mod models;
pub mod services;
pub mod sinks;
pub mod time_utils;
