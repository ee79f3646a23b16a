// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier of a persisted context record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque identifier of the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted piece of user context (a captured note, selection, page, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: ContextId,
    pub user: UserId,
    pub raw_content: String,
    pub tags: Vec<String>,
    /// Inferred parent topic, when the hierarchy collaborator supplied one.
    pub parent_topic: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Store of persisted context records.
///
/// The core only consumes ids and lightweight content; embedding and
/// similarity internals belong to the production implementation.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Persist a new context record and return its id.
    async fn persist(
        &self,
        user: &UserId,
        raw_content: &str,
        tags: &[String],
        parent_topic: Option<&str>,
    ) -> anyhow::Result<ContextId>;

    /// Fetch records by id.  Unknown ids are skipped, not an error.
    async fn get(&self, ids: &[ContextId]) -> anyhow::Result<Vec<ContextRecord>>;

    /// All records owned by a user, newest first.
    async fn for_user(&self, user: &UserId) -> anyhow::Result<Vec<ContextRecord>>;
}

/// In-memory context store used by the core and its tests.
#[derive(Default)]
pub struct MemoryContextStore {
    records: Arc<RwLock<HashMap<ContextId, ContextRecord>>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn persist(
        &self,
        user: &UserId,
        raw_content: &str,
        tags: &[String],
        parent_topic: Option<&str>,
    ) -> anyhow::Result<ContextId> {
        let id = ContextId::new();
        let record = ContextRecord {
            id,
            user: *user,
            raw_content: raw_content.to_string(),
            tags: tags.to_vec(),
            parent_topic: parent_topic.map(str::to_string),
            created_at: Utc::now(),
        };
        self.records.write().await.insert(id, record);
        Ok(id)
    }

    async fn get(&self, ids: &[ContextId]) -> anyhow::Result<Vec<ContextRecord>> {
        let records = self.records.read().await;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn for_user(&self, user: &UserId) -> anyhow::Result<Vec<ContextRecord>> {
        let records = self.records.read().await;
        let mut out: Vec<ContextRecord> = records
            .values()
            .filter(|r| r.user == *user)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
