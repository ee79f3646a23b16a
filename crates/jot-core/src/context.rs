// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use jot_store::{ContextId, UserId};

use crate::result::Payload;

/// Input bundle an agent executes against.
///
/// Immutable once constructed and owned by the orchestrator for the
/// duration of one orchestration call.  Composite tasks never share mutable
/// state between agents; a sub-task sees its predecessor's output only
/// through the `carried` map of a freshly derived context.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    /// Captured text the task operates on (selection, snippet, page text).
    pub raw_text: Option<String>,
    /// Source URLs accompanying the capture.
    pub urls: Vec<String>,
    /// The user's instruction for this task, when one was given.
    pub user_defined_context: Option<String>,
    /// Already-persisted context records owned by the context store.
    pub resolved_context_ids: Vec<ContextId>,
    pub user: UserId,
    /// Output of a prior composite step (explicit data dependency).
    pub carried: Payload,
}

impl AgentContext {
    pub fn new(user: UserId) -> Self {
        Self { user, ..Default::default() }
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.user_defined_context = Some(instruction.into());
        self
    }

    pub fn with_context_ids(mut self, ids: Vec<ContextId>) -> Self {
        self.resolved_context_ids = ids;
        self
    }

    /// Derive the context for the next composite step: same inputs, with
    /// `carried` replaced by the accumulated upstream payload.
    pub fn with_carried(&self, carried: Payload) -> Self {
        let mut next = self.clone();
        next.carried = carried;
        next
    }

    /// The text an agent should operate on; empty when nothing was captured.
    pub fn source_text(&self) -> &str {
        self.raw_text.as_deref().unwrap_or_default()
    }

    pub fn instruction(&self) -> &str {
        self.user_defined_context.as_deref().unwrap_or_default()
    }
}
