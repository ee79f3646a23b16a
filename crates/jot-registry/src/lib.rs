// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Agent type registry.
//!
//! Maps each task type to the [`AgentBlueprint`] describing what its agent
//! needs and can do.  The registry is loaded once at process start from a
//! declarative YAML source (the embedded default or a configured file),
//! validated fail-fast, and read-only afterwards — configuration errors
//! surface before any traffic is served, never at first use.

mod blueprint;
mod kinds;
mod registry;

pub use blueprint::{AgentBlueprint, TaskType};
pub use kinds::{get_kind, known_kind_ids, AgentKindMeta, AGENT_KINDS};
pub use registry::{AgentTypeRegistry, RegistryError, UnknownTaskType};
