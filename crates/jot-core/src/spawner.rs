// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Agent factory: blueprint + user credentials → fully wired agent.
//!
//! Spawning never fails merely because an optional tool or account is
//! missing — unresolved soft requirements are deferred to the agent, which
//! runs degraded.  Only an unimplemented agent kind or a missing hard
//! requirement is fatal.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use jot_reason::Reasoner;
use jot_registry::{AgentBlueprint, TaskType};
use jot_store::{Credentials, KnowledgeRetriever, UserId};
use jot_tools::ToolIntegration;

use crate::{
    agent::Agent,
    agents::{KnowledgeAgent, NoteAgent, TableExtractionAgent},
    error::SpawnError,
    observe::{ObsEvent, Observer},
};

/// Construction metadata for one spawn: which provider was picked per
/// capability and what was substituted or left unresolved.  Emitted through
/// the observability sink and returned for callers that inspect it.
#[derive(Debug, Clone)]
pub struct SpawnReport {
    pub task_type: TaskType,
    pub agent_kind: String,
    /// capability → chosen tool name.
    pub picks: BTreeMap<String, String>,
    /// Capabilities served by the bridge because the credentialed primary
    /// was unavailable.
    pub substituted: Vec<String>,
    /// Capabilities with no usable provider; the agent degrades.
    pub unresolved: Vec<String>,
    /// Soft-required tool names absent from the registry.
    pub missing_tools: Vec<String>,
}

/// Factory for fully wired agent instances.
pub struct AgentSpawner {
    integration: Arc<ToolIntegration>,
    reasoner: Arc<dyn Reasoner>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    artifact_dir: PathBuf,
    reason_timeout: Duration,
    observer: Observer,
}

impl AgentSpawner {
    pub fn new(
        integration: Arc<ToolIntegration>,
        reasoner: Arc<dyn Reasoner>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        artifact_dir: PathBuf,
        reason_timeout_secs: u64,
        observer: Observer,
    ) -> Self {
        Self {
            integration,
            reasoner,
            knowledge,
            artifact_dir,
            reason_timeout: Duration::from_secs(reason_timeout_secs.max(1)),
            observer,
        }
    }

    /// Build the agent for an atomic blueprint.
    ///
    /// Credentials are only consulted while resolving capabilities whose
    /// providers declare a required account; a blueprint with zero required
    /// accounts spawns identically for every credentials map.
    pub fn spawn(
        &self,
        blueprint: &AgentBlueprint,
        user: &UserId,
        credentials: &Credentials,
    ) -> Result<(Box<dyn Agent>, SpawnReport), SpawnError> {
        let kind = blueprint
            .agent_kind
            .as_deref()
            // Composite blueprints are decomposed by the orchestrator and
            // never reach the factory directly.
            .ok_or_else(|| SpawnError::AgentKindNotImplemented("(composite)".into()))?;

        // 1. Soft/hard tool requirements, by name.
        let mut missing_tools = Vec::new();
        for name in &blueprint.required_tools {
            if self.integration.registry().get(name).is_none() {
                if blueprint.hard_requirements.contains(name) {
                    return Err(SpawnError::MissingHardRequirement {
                        task_type: blueprint.task_type.clone(),
                        tool: name.clone(),
                    });
                }
                missing_tools.push(name.clone());
            }
        }

        // 2. Capability resolution with fallback substitution: candidates
        //    come ranked (credentialed primaries before bridges); the first
        //    one the user's credentials allow wins.
        let mut picks = BTreeMap::new();
        let mut substituted = Vec::new();
        let mut unresolved = Vec::new();
        for cap in &blueprint.capabilities {
            // Knowledge retrieval is served by the injected retriever
            // handle, not by a registry tool.
            if cap == "knowledge_search" {
                continue;
            }
            let candidates = self.integration.registry().resolve(cap);
            let had_primary = candidates.iter().any(|t| !t.is_bridge());
            let pick = candidates.iter().find(|t| {
                t.requires_account()
                    .map_or(true, |account| credentials.contains_key(account))
            });
            match pick {
                Some(tool) => {
                    if tool.is_bridge() && had_primary {
                        substituted.push(cap.clone());
                    }
                    picks.insert(cap.clone(), tool.name().to_string());
                }
                None => unresolved.push(cap.clone()),
            }
        }

        debug!(
            task_type = %blueprint.task_type,
            agent_kind = kind,
            user = %user,
            picks = ?picks,
            substituted = ?substituted,
            unresolved = ?unresolved,
            "spawning agent"
        );

        // 3+4. Instantiate the concrete implementation, injecting resolved
        //      tools, the reasoner, and (for knowledge task types) the
        //      retrieval handle.
        let agent: Box<dyn Agent> = match kind {
            "table_extraction" => Box::new(TableExtractionAgent::new(
                self.reasoner.clone(),
                self.integration.clone(),
                picks.get("tabular_write").cloned(),
                self.reason_timeout,
            )),
            "note_writer" => Box::new(NoteAgent::new(
                blueprint.task_type.clone(),
                self.reasoner.clone(),
                self.integration.clone(),
                picks.get("workspace_write").cloned(),
                self.artifact_dir.clone(),
                self.reason_timeout,
            )),
            "knowledge_answer" => Box::new(KnowledgeAgent::new(
                self.reasoner.clone(),
                self.knowledge.clone(),
                self.reason_timeout,
            )),
            other => return Err(SpawnError::AgentKindNotImplemented(other.to_string())),
        };

        let report = SpawnReport {
            task_type: blueprint.task_type.clone(),
            agent_kind: kind.to_string(),
            picks,
            substituted,
            unresolved,
            missing_tools,
        };
        self.observer.record(ObsEvent::SpawnResolved {
            task_type: report.task_type.to_string(),
            agent_kind: report.agent_kind.clone(),
            picks: report.picks.clone(),
            substituted: report.substituted.clone(),
            unresolved: report.unresolved.clone(),
        });

        Ok((agent, report))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jot_reason::ScriptedReasoner;
    use jot_store::{KeywordRetriever, MemoryContextStore};
    use jot_tools::builtin::{BridgeTool, FileWorkspace, TabularFileTool, WorkspaceTool};
    use jot_tools::ToolRegistry;
    use tempfile::TempDir;

    fn spawner(registry: ToolRegistry, dir: &TempDir) -> AgentSpawner {
        AgentSpawner::new(
            Arc::new(ToolIntegration::new(Arc::new(registry), 5)),
            Arc::new(ScriptedReasoner::new(vec![])),
            Arc::new(KeywordRetriever::new(Arc::new(MemoryContextStore::new()))),
            dir.path().to_path_buf(),
            5,
            Observer::disabled(),
        )
    }

    fn blueprint(yaml: &str) -> AgentBlueprint {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn full_registry(dir: &TempDir) -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(TabularFileTool::new(dir.path().join("artifacts")));
        reg.register(WorkspaceTool::new(Arc::new(FileWorkspace::new(
            dir.path().join("workspace"),
        ))));
        reg.register(BridgeTool::new(Arc::new(FileWorkspace::new(
            dir.path().join("bridge"),
        ))));
        reg
    }

    #[test]
    fn every_known_kind_has_a_constructor() {
        // Startup invariant: the registry's known kinds and the factory's
        // match arms must cover each other exactly.
        let dir = TempDir::new().unwrap();
        let sp = spawner(full_registry(&dir), &dir);
        for kind in jot_registry::known_kind_ids() {
            let bp = blueprint(&format!("task_type: probe\nagent_kind: {kind}"));
            let spawned = sp.spawn(&bp, &UserId::new(), &Credentials::new());
            assert!(spawned.is_ok(), "kind '{kind}' has no constructor");
            assert_eq!(spawned.unwrap().0.kind(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_not_implemented() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(ToolRegistry::new(), &dir);
        // Bypass registry validation by naming a kind the factory lacks.
        let mut bp = blueprint("task_type: probe\nagent_kind: table_extraction");
        bp.agent_kind = Some("teleportation".into());
        let err = sp.spawn(&bp, &UserId::new(), &Credentials::new()).err().unwrap();
        assert!(matches!(err, SpawnError::AgentKindNotImplemented(k) if k == "teleportation"));
    }

    #[test]
    fn zero_required_accounts_spawns_with_empty_credentials() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(full_registry(&dir), &dir);
        let bp = blueprint(
            "task_type: extract_data\nagent_kind: table_extraction\n\
             capabilities: [tabular_write]\nrequired_tools: [tabular_file]\n\
             hard_requirements: [tabular_file]",
        );
        let (_, report) = sp.spawn(&bp, &UserId::new(), &Credentials::new()).unwrap();
        assert_eq!(report.picks.get("tabular_write").map(String::as_str), Some("tabular_file"));
        assert!(report.substituted.is_empty());
    }

    #[test]
    fn missing_credential_substitutes_bridge() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(full_registry(&dir), &dir);
        let bp = blueprint(
            "task_type: note_taking\nagent_kind: note_writer\n\
             capabilities: [workspace_write]\nrequired_accounts: [workspace]",
        );
        let (_, report) = sp.spawn(&bp, &UserId::new(), &Credentials::new()).unwrap();
        assert_eq!(report.picks.get("workspace_write").map(String::as_str), Some("bridge"));
        assert_eq!(report.substituted, vec!["workspace_write"]);
    }

    #[test]
    fn present_credential_keeps_primary() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(full_registry(&dir), &dir);
        let bp = blueprint(
            "task_type: note_taking\nagent_kind: note_writer\n\
             capabilities: [workspace_write]\nrequired_accounts: [workspace]",
        );
        let mut creds = Credentials::new();
        creds.insert("workspace".into(), "tok".into());
        let (_, report) = sp.spawn(&bp, &UserId::new(), &creds).unwrap();
        assert_eq!(report.picks.get("workspace_write").map(String::as_str), Some("workspace"));
        assert!(report.substituted.is_empty());
    }

    #[test]
    fn no_provider_at_all_defers_to_agent() {
        let dir = TempDir::new().unwrap();
        let mut reg = ToolRegistry::new();
        reg.register(TabularFileTool::new(dir.path()));
        let sp = spawner(reg, &dir);
        let bp = blueprint(
            "task_type: note_taking\nagent_kind: note_writer\n\
             capabilities: [workspace_write]\nrequired_accounts: [workspace]",
        );
        let spawned = sp.spawn(&bp, &UserId::new(), &Credentials::new());
        let (_, report) = spawned.expect("soft-missing capability must not fail the spawn");
        assert_eq!(report.unresolved, vec!["workspace_write"]);
    }

    #[test]
    fn missing_hard_requirement_is_fatal() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(ToolRegistry::new(), &dir);
        let bp = blueprint(
            "task_type: extract_data\nagent_kind: table_extraction\n\
             required_tools: [tabular_file]\nhard_requirements: [tabular_file]",
        );
        let err = sp.spawn(&bp, &UserId::new(), &Credentials::new()).err().unwrap();
        assert!(matches!(err, SpawnError::MissingHardRequirement { .. }));
    }

    #[test]
    fn missing_soft_tool_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let sp = spawner(full_registry(&dir), &dir);
        let bp = blueprint(
            "task_type: extract_data\nagent_kind: table_extraction\n\
             required_tools: [tabular_file, exotic_tool]",
        );
        let (_, report) = sp.spawn(&bp, &UserId::new(), &Credentials::new()).unwrap();
        assert_eq!(report.missing_tools, vec!["exotic_tool"]);
    }
}
