// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{get_kind, AgentBlueprint, TaskType};

/// Registry file embedded in the binary; used when no `registry.path` is
/// configured.  A test asserts it always validates.
const BUILTIN_REGISTRY: &str = include_str!("../agents.yaml");

/// Request for a task type no blueprint is registered for.
///
/// A client error: the request cannot be serviced and is not retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task type '{0}'")]
pub struct UnknownTaskType(pub TaskType);

/// Load-time validation failures.  All of these abort startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("reading registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing registry: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate task type '{0}'")]
    DuplicateTaskType(TaskType),
    #[error("task type '{task_type}' references unknown agent kind '{agent_kind}'")]
    UnknownAgentKind {
        task_type: TaskType,
        agent_kind: String,
    },
    #[error("composite task type '{task_type}' references {problem} subtask '{subtask}'")]
    BadSubtask {
        task_type: TaskType,
        subtask: TaskType,
        problem: &'static str,
    },
    #[error("task type '{0}' must declare exactly one of agent_kind or subtasks")]
    Malformed(TaskType),
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    agents: Vec<AgentBlueprint>,
}

/// Read-only catalog of agent blueprints, keyed by task type.
///
/// Populated once at startup and never mutated, so it is safe for unlimited
/// concurrent readers behind an `Arc` without locking.
#[derive(Debug)]
pub struct AgentTypeRegistry {
    blueprints: BTreeMap<TaskType, AgentBlueprint>,
}

impl AgentTypeRegistry {
    /// Parse and validate a registry from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(text)?;

        let mut blueprints = BTreeMap::new();
        for bp in file.agents {
            if blueprints.contains_key(&bp.task_type) {
                return Err(RegistryError::DuplicateTaskType(bp.task_type));
            }
            blueprints.insert(bp.task_type.clone(), bp);
        }

        let registry = Self { blueprints };
        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry from a YAML file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        debug!(path = %path.display(), "loading agent type registry");
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// The registry embedded in the binary.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_yaml(BUILTIN_REGISTRY)
    }

    /// Referential integrity: every atomic blueprint names an implemented
    /// agent kind, every composite decomposes into existing atomic sub-tasks.
    fn validate(&self) -> Result<(), RegistryError> {
        for bp in self.blueprints.values() {
            match (&bp.agent_kind, bp.is_composite()) {
                (Some(kind), false) => {
                    if get_kind(kind).is_none() {
                        return Err(RegistryError::UnknownAgentKind {
                            task_type: bp.task_type.clone(),
                            agent_kind: kind.clone(),
                        });
                    }
                }
                (None, true) => {
                    for sub in &bp.subtasks {
                        match self.blueprints.get(sub) {
                            None => {
                                return Err(RegistryError::BadSubtask {
                                    task_type: bp.task_type.clone(),
                                    subtask: sub.clone(),
                                    problem: "unknown",
                                })
                            }
                            Some(sub_bp) if sub_bp.is_composite() => {
                                return Err(RegistryError::BadSubtask {
                                    task_type: bp.task_type.clone(),
                                    subtask: sub.clone(),
                                    problem: "nested composite",
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Err(RegistryError::Malformed(bp.task_type.clone())),
            }
        }
        Ok(())
    }

    pub fn get_blueprint(&self, task_type: &TaskType) -> Result<&AgentBlueprint, UnknownTaskType> {
        self.blueprints
            .get(task_type)
            .ok_or_else(|| UnknownTaskType(task_type.clone()))
    }

    /// All blueprints whose declared capabilities include `capability`
    /// (discovery: "what can handle tabular_write?").
    pub fn list_by_capability(&self, capability: &str) -> Vec<&AgentBlueprint> {
        self.blueprints
            .values()
            .filter(|bp| bp.capabilities.contains(capability))
            .collect()
    }

    /// All blueprints in task-type order.
    pub fn blueprints(&self) -> impl Iterator<Item = &AgentBlueprint> {
        self.blueprints.values()
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
