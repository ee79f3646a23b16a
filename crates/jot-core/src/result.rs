// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Three-way execution status.
///
/// `Partial` is distinct from `Failed` so callers can retry only the failed
/// step of a multi-step task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Completed,
    Failed,
    Partial,
}

/// Classified failure cause carried inside results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Extraction produced zero rows — surfaced as a failure, never as an
    /// empty success.
    EmptyExtraction,
    Tool,
    Reasoner,
    Timeout,
    Cancelled,
    Workspace,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorDescriptor {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Agent-specific result data (generated file path, created page id, …).
pub type Payload = serde_json::Map<String, Value>;

/// Output contract every agent produces.  Created by `execute()`, never
/// mutated after return; the orchestrator aggregates these without merging
/// them destructively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub status: ExecStatus,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub error: Option<ErrorDescriptor>,
}

impl AgentResult {
    pub fn completed(payload: Payload) -> Self {
        Self { status: ExecStatus::Completed, payload, error: None }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Failed,
            payload: Payload::new(),
            error: Some(ErrorDescriptor::new(kind, message)),
        }
    }

    pub fn failed_with(error: ErrorDescriptor) -> Self {
        Self {
            status: ExecStatus::Failed,
            payload: Payload::new(),
            error: Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExecStatus::Completed
    }
}

/// Task-level result handed to the caller for persistence; the core never
/// persists it itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub execution_status: ExecStatus,
    /// One entry per executed agent, in declaration order.
    pub per_agent_results: Vec<AgentResult>,
    /// Union of the completed agents' payloads, in execution order.
    pub aggregated_payload: Payload,
}

/// Three-way aggregation over sub-results: completed iff all completed,
/// failed iff all failed, partial otherwise.
pub fn aggregate_status(results: &[AgentResult]) -> ExecStatus {
    if results.is_empty() {
        return ExecStatus::Failed;
    }
    if results.iter().all(|r| r.status == ExecStatus::Completed) {
        ExecStatus::Completed
    } else if results.iter().all(|r| r.status == ExecStatus::Failed) {
        ExecStatus::Failed
    } else {
        ExecStatus::Partial
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
