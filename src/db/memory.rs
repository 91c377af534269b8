// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory destination store.
//!
//! Evaluates filters the way Notion does, so reconciliation can be exercised
//! without network access.

use async_trait::async_trait;
use chrono::FixedOffset;
use std::cmp::Ordering;
use std::sync::Mutex;

use crate::db::DestinationStore;
use crate::error::StoreError;
use crate::models::{DestinationRecord, Fields, NewRecord, Query};

#[derive(Default)]
struct Inner {
    records: Vec<DestinationRecord>,
    next_id: u64,
    creates: usize,
    updates: usize,
}

/// In-memory destination store. Records keep insertion order.
pub struct MemoryStore {
    tz: FixedOffset,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store that interprets dates in `tz`.
    pub fn new(tz: FixedOffset) -> Self {
        Self {
            tz,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed a record with the given fields; returns its ID.
    pub fn insert(&self, fields: Fields) -> String {
        let mut inner = self.lock();
        let id = next_id(&mut inner);
        inner.records.push(DestinationRecord {
            id: id.clone(),
            fields,
        });
        id
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<DestinationRecord> {
        self.lock().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<DestinationRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    /// Number of `create` calls served.
    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    /// Number of `update` calls served.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn next_id(inner: &mut Inner) -> String {
    inner.next_id += 1;
    format!("mem-{}", inner.next_id)
}

#[async_trait]
impl DestinationStore for MemoryStore {
    async fn query(&self, query: &Query) -> Result<Vec<DestinationRecord>, StoreError> {
        let inner = self.lock();
        let mut results: Vec<DestinationRecord> = inner
            .records
            .iter()
            .filter(|r| query.filter.as_ref().map_or(true, |f| f.matches(r, self.tz)))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            results.sort_by(|a, b| {
                let key = |r: &DestinationRecord| r.date(&sort.property).map(|d| d.start.instant(self.tz));
                let ord = match (key(a), key(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if sort.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn create(&self, record: &NewRecord) -> Result<DestinationRecord, StoreError> {
        let mut inner = self.lock();
        let id = next_id(&mut inner);
        let stored = DestinationRecord {
            id,
            fields: record.fields.clone(),
        };
        inner.records.push(stored.clone());
        inner.creates += 1;
        Ok(stored)
    }

    async fn update(&self, id: &str, fields: &Fields) -> Result<DestinationRecord, StoreError> {
        let mut inner = self.lock();
        inner.updates += 1;
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        for (name, value) in fields {
            record.fields.insert(name.clone(), value.clone());
        }
        Ok(record.clone())
    }
}
