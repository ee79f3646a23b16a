// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use jot_registry::{TaskType, UnknownTaskType};
use thiserror::Error;

/// Spawn-time failures.  Both variants are configuration errors: a blueprint
/// referencing code that does not exist, or a hard tool requirement missing
/// from the registry.  Neither is retried.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("agent kind '{0}' has no registered constructor")]
    AgentKindNotImplemented(String),
    #[error("hard requirement '{tool}' unavailable for task type '{task_type}'")]
    MissingHardRequirement { task_type: TaskType, tool: String },
}

/// Hard orchestration failures.
///
/// Everything else — tool failures, reasoner failures, timeouts — is caught
/// inside agents and reported through `AgentResult`; only errors that mean
/// the request cannot be serviced at all propagate here.
#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error(transparent)]
    UnknownTaskType(#[from] UnknownTaskType),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}
