// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Orchestration core: agent contract, spawner, builtin agents, and the
//! task orchestrator.
//!
//! The flow: an identified task type is resolved to a blueprint
//! ([`jot_registry::AgentTypeRegistry`]), the [`AgentSpawner`] builds the
//! agent with its resolved tools / reasoner / knowledge handle, the
//! [`TaskOrchestrator`] executes it (or its composite sub-tasks in declared
//! order) and aggregates a three-way [`ExecStatus`].

mod agent;
pub mod agents;
mod context;
mod error;
mod evaluator;
mod observe;
mod orchestrator;
mod result;
mod spawner;

pub use agent::Agent;
pub use context::AgentContext;
pub use error::{OrchestrateError, SpawnError};
pub use evaluator::{EvaluationReport, Evaluator};
pub use observe::{ObsEvent, ObservabilitySink, Observer, TracingSink};
pub use orchestrator::TaskOrchestrator;
pub use result::{
    aggregate_status, AgentResult, ErrorDescriptor, ErrorKind, ExecStatus,
    OrchestrationResult, Payload,
};
pub use spawner::{AgentSpawner, SpawnReport};
