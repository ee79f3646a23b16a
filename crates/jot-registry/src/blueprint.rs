// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed-set identifier naming what kind of work a request represents
/// (e.g. `note_taking`, `extract_data`).  The set is closed by the loaded
/// registry, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Static declaration of what an agent kind needs and can do.
///
/// Immutable once loaded.  Exactly one of `agent_kind` (atomic) or
/// `subtasks` (composite) is set; the registry loader rejects anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBlueprint {
    /// Unique key; one blueprint per task type.
    pub task_type: TaskType,
    /// Discriminator selecting the concrete agent implementation.
    /// `None` for composite task types.
    #[serde(default)]
    pub agent_kind: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Named abilities the agent's tools must provide (e.g. `tabular_write`).
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Tool names resolved at spawn time.
    #[serde(default)]
    pub required_tools: BTreeSet<String>,
    /// External integrations that must have stored credentials.
    #[serde(default)]
    pub required_accounts: BTreeSet<String>,
    /// Tool names whose absence is fatal at spawn.  Everything else is a
    /// soft requirement: the agent runs degraded without it.
    #[serde(default)]
    pub hard_requirements: BTreeSet<String>,
    /// Descriptive only; surfaced in discovery listings.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Ordered sub-task types for composite tasks.
    #[serde(default)]
    pub subtasks: Vec<TaskType>,
}

impl AgentBlueprint {
    /// Composite blueprints decompose into an ordered list of sub-tasks
    /// instead of naming an agent kind directly.
    pub fn is_composite(&self) -> bool {
        !self.subtasks.is_empty()
    }
}
