// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Knowledge retrieval over stored context records.
//!
//! The production deployment ranks by embedding similarity behind the same
//! trait; the in-repo default is keyword match-count ranking, which is
//! deterministic and needs no external service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{ContextId, ContextStore, UserId};

/// One retrieved snippet of stored context.
#[derive(Debug, Clone)]
pub struct KnowledgeHit {
    pub context_id: ContextId,
    pub content: String,
    /// Relevance score; for the keyword retriever this is the match count.
    pub score: usize,
}

/// Retrieval of context relevant to a query, on behalf of one user.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        user: &UserId,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<KnowledgeHit>>;
}

/// Keyword retriever: case-insensitive term matching, ranked by total match
/// count descending.
pub struct KeywordRetriever {
    store: Arc<dyn ContextStore>,
}

impl KeywordRetriever {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KnowledgeRetriever for KeywordRetriever {
    async fn retrieve(
        &self,
        user: &UserId,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<KnowledgeHit>> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let records = self.store.for_user(user).await?;

        let mut hits: Vec<KnowledgeHit> = records
            .into_iter()
            .filter_map(|r| {
                let haystack = format!("{} {}", r.raw_content, r.tags.join(" ")).to_lowercase();
                let score: usize = terms.iter().map(|t| haystack.matches(t.as_str()).count()).sum();
                if score == 0 {
                    return None;
                }
                Some(KnowledgeHit {
                    context_id: r.id,
                    content: r.raw_content,
                    score,
                })
            })
            .collect();

        // Most relevant first; ties broken by recency (for_user is newest first,
        // and the sort is stable).
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
