// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Task orchestrator: the top-level entry point of the core.
//!
//! Looks up the blueprint for an identified task type, decides atomic vs
//! composite, spawns and executes the agent(s), and aggregates the outcome
//! three-way (completed / failed / partial).  A sub-task failure never
//! aborts the remaining sub-tasks; only lookup and spawn-configuration
//! errors propagate as hard failures.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use jot_registry::{AgentBlueprint, AgentTypeRegistry, TaskType};
use jot_store::CredentialStore;

use crate::{
    context::AgentContext,
    error::OrchestrateError,
    observe::{ObsEvent, Observer},
    result::{aggregate_status, AgentResult, ExecStatus, OrchestrationResult, Payload},
    spawner::AgentSpawner,
};

pub struct TaskOrchestrator {
    registry: Arc<AgentTypeRegistry>,
    spawner: AgentSpawner,
    credentials: Arc<dyn CredentialStore>,
    observer: Observer,
}

impl TaskOrchestrator {
    pub fn new(
        registry: Arc<AgentTypeRegistry>,
        spawner: AgentSpawner,
        credentials: Arc<dyn CredentialStore>,
        observer: Observer,
    ) -> Self {
        Self { registry, spawner, credentials, observer }
    }

    /// Execute one task to completion.
    pub async fn orchestrate(
        &self,
        task_type: &TaskType,
        ctx: AgentContext,
    ) -> Result<OrchestrationResult, OrchestrateError> {
        // The sender half stays alive for the whole call, so the receiver
        // never fires and the run is uncancellable.
        let (_keep_alive, cancel) = oneshot::channel::<()>();
        self.orchestrate_with_cancel(task_type, ctx, cancel).await
    }

    /// Like [`orchestrate`](Self::orchestrate) but accepts a cancellation
    /// channel.  Sending `()` (or dropping the sender) stops the run at the
    /// next await point: the in-flight agent call is abandoned, pending
    /// sub-tasks are not started, already-completed sub-results are
    /// preserved, and the overall status is `partial` with a `cancelled`
    /// marker in the aggregated payload.
    pub async fn orchestrate_with_cancel(
        &self,
        task_type: &TaskType,
        ctx: AgentContext,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<OrchestrationResult, OrchestrateError> {
        // Lookup failures propagate before any spawn happens.
        let blueprint = self.registry.get_blueprint(task_type)?;

        let steps: Vec<&AgentBlueprint> = if blueprint.is_composite() {
            blueprint
                .subtasks
                .iter()
                .map(|sub| self.registry.get_blueprint(sub))
                .collect::<Result<_, _>>()?
        } else {
            vec![blueprint]
        };
        debug!(task_type = %task_type, steps = steps.len(), "orchestrating");

        // One credential fetch per orchestration; a failing store degrades
        // agents (bridge/degraded mode), it does not fail the task.
        let credentials = self
            .credentials
            .credentials_for(&ctx.user)
            .await
            .unwrap_or_default();

        let mut results: Vec<AgentResult> = Vec::with_capacity(steps.len());
        let mut carried = ctx.carried.clone();
        let mut cancelled = false;

        for step in steps {
            // A cancellation that arrived between steps: stop before
            // spawning the next agent.  A dropped sender counts as a
            // cancellation too, which `is_ok()` alone would miss.
            match cancel.try_recv() {
                Err(oneshot::error::TryRecvError::Empty) => {}
                _ => {
                    cancelled = true;
                    break;
                }
            }

            let (agent, report) = self.spawner.spawn(step, &ctx.user, &credentials)?;
            self.observer.record(ObsEvent::AgentStarted {
                task_type: step.task_type.to_string(),
                agent_kind: report.agent_kind.clone(),
            });

            // Each step runs against a freshly derived context carrying the
            // accumulated upstream payload — the only data channel between
            // sub-tasks.
            let step_ctx = ctx.with_carried(carried.clone());

            let result = tokio::select! {
                biased;
                _ = &mut cancel => {
                    cancelled = true;
                    break;
                }
                result = agent.execute(&step_ctx) => result,
            };

            self.observer.record(ObsEvent::AgentFinished {
                task_type: step.task_type.to_string(),
                agent_kind: report.agent_kind.clone(),
                status: result.status,
            });

            if result.is_completed() {
                for (k, v) in &result.payload {
                    carried.insert(k.clone(), v.clone());
                }
            }
            results.push(result);
        }

        let execution_status = if cancelled {
            ExecStatus::Partial
        } else {
            aggregate_status(&results)
        };

        let mut aggregated_payload: Payload = carried;
        if cancelled {
            aggregated_payload.insert("cancelled".into(), serde_json::Value::Bool(true));
        }

        self.observer.record(ObsEvent::OrchestrationFinished {
            task_type: task_type.to_string(),
            status: execution_status,
            agents: results.len(),
        });

        Ok(OrchestrationResult {
            execution_status,
            per_agent_results: results,
            aggregated_payload,
        })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use jot_reason::ScriptedReasoner;
    use jot_store::{
        KeywordRetriever, MemoryContextStore, MemoryCredentialStore, UserId,
    };
    use jot_tools::builtin::{BridgeTool, FileWorkspace, TabularFileTool, WorkspaceTool};
    use jot_tools::{ToolIntegration, ToolRegistry};
    use serde_json::json;
    use tempfile::TempDir;

    const REGISTRY_YAML: &str = r#"
agents:
  - task_type: extract_data
    agent_kind: table_extraction
    capabilities: [tabular_write, tabular_read]
    required_tools: [tabular_file]
    hard_requirements: [tabular_file]
  - task_type: note_taking
    agent_kind: note_writer
    capabilities: [workspace_write, workspace_search]
    required_tools: [workspace]
    required_accounts: [workspace]
  - task_type: extract_and_note
    subtasks: [extract_data, note_taking]
"#;

    struct Fixture {
        orchestrator: TaskOrchestrator,
        reasoner: Arc<ScriptedReasoner>,
        user: UserId,
        _dir: TempDir,
        workspace_dir: std::path::PathBuf,
    }

    fn fixture(responses: Vec<&'static str>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let workspace_dir = dir.path().join("workspace");

        let mut tools = ToolRegistry::new();
        tools.register(TabularFileTool::new(dir.path().join("artifacts")));
        tools.register(WorkspaceTool::new(Arc::new(FileWorkspace::new(&workspace_dir))));
        tools.register(BridgeTool::new(Arc::new(FileWorkspace::new(
            dir.path().join("bridge"),
        ))));

        let integration = Arc::new(ToolIntegration::new(Arc::new(tools), 5));
        let reasoner = Arc::new(ScriptedReasoner::new(responses));
        let knowledge = Arc::new(KeywordRetriever::new(Arc::new(MemoryContextStore::new())));
        let spawner = AgentSpawner::new(
            integration,
            reasoner.clone(),
            knowledge,
            dir.path().join("artifacts"),
            5,
            Observer::disabled(),
        );

        let user = UserId::new();
        let creds = MemoryCredentialStore::new();
        creds.insert(user, "workspace", "tok");

        let orchestrator = TaskOrchestrator::new(
            Arc::new(jot_registry::AgentTypeRegistry::from_yaml(REGISTRY_YAML).unwrap()),
            spawner,
            Arc::new(creds),
            Observer::disabled(),
        );
        Fixture { orchestrator, reasoner, user, _dir: dir, workspace_dir }
    }

    fn extraction_rows() -> &'static str {
        r#"[{"name": "Product A", "price": "$100", "stock": "50"},
            {"name": "Product B", "price": "$200", "stock": "30"}]"#
    }

    fn note_payload() -> &'static str {
        r#"{"query": "products", "title": "Products"}"#
    }

    #[tokio::test]
    async fn unknown_task_type_fails_without_spawning() {
        let fx = fixture(vec![]);
        let ctx = AgentContext::new(fx.user).with_raw_text("x");
        let err = fx
            .orchestrator
            .orchestrate(&TaskType::from("not_a_real_type"), ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrateError::UnknownTaskType(_)));
        // No agent ran: the reasoner was never consulted.
        assert_eq!(fx.reasoner.call_count(), 0);
    }

    #[tokio::test]
    async fn atomic_task_produces_single_result() {
        let fx = fixture(vec![extraction_rows()]);
        let ctx = AgentContext::new(fx.user)
            .with_raw_text("Product A: $100, Stock: 50\nProduct B: $200, Stock: 30")
            .with_instruction("Extract product data with name, price, and stock");
        let result = fx
            .orchestrator
            .orchestrate(&TaskType::from("extract_data"), ctx)
            .await
            .unwrap();
        assert_eq!(result.execution_status, ExecStatus::Completed);
        assert_eq!(result.per_agent_results.len(), 1);
        assert_eq!(result.aggregated_payload["row_count"], json!(2));
    }

    #[tokio::test]
    async fn composite_runs_in_order_and_carries_payload() {
        let fx = fixture(vec![extraction_rows(), note_payload()]);
        let ctx = AgentContext::new(fx.user)
            .with_raw_text("Product A: $100, Stock: 50\nProduct B: $200, Stock: 30")
            .with_instruction("extract then file");
        let result = fx
            .orchestrator
            .orchestrate(&TaskType::from("extract_and_note"), ctx)
            .await
            .unwrap();
        assert_eq!(result.execution_status, ExecStatus::Completed);
        assert_eq!(result.per_agent_results.len(), 2);

        // Step A's artifact made it into step B's context: the created page
        // references the extraction artifact.
        let page = std::fs::read_dir(&fx.workspace_dir)
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let text = std::fs::read_to_string(page).unwrap();
        assert!(text.contains("Artifact: "), "{text}");
    }

    #[tokio::test]
    async fn composite_failure_still_runs_remaining_steps() {
        // First step fails (zero rows extracted); the note step still runs.
        let fx = fixture(vec!["[]", note_payload()]);
        let ctx = AgentContext::new(fx.user)
            .with_raw_text("nothing tabular here")
            .with_instruction("extract then file");
        let result = fx
            .orchestrator
            .orchestrate(&TaskType::from("extract_and_note"), ctx)
            .await
            .unwrap();
        assert_eq!(result.execution_status, ExecStatus::Partial);
        assert_eq!(result.per_agent_results.len(), 2);
        assert_eq!(result.per_agent_results[0].status, ExecStatus::Failed);
        assert_eq!(result.per_agent_results[1].status, ExecStatus::Completed);
    }

    #[tokio::test]
    async fn composite_all_failed_aggregates_failed() {
        let fx = fixture(vec!["[]", "not json"]);
        let ctx = AgentContext::new(fx.user)
            .with_raw_text("nothing tabular here")
            .with_instruction("extract then file");
        let result = fx
            .orchestrator
            .orchestrate(&TaskType::from("extract_and_note"), ctx)
            .await
            .unwrap();
        assert_eq!(result.execution_status, ExecStatus::Failed);
    }

    #[tokio::test]
    async fn pre_resolved_cancel_preserves_nothing_but_reports_partial() {
        let fx = fixture(vec![extraction_rows()]);
        let (tx, rx) = oneshot::channel();
        drop(tx);
        let ctx = AgentContext::new(fx.user).with_raw_text("Product A: $100");
        let result = fx
            .orchestrator
            .orchestrate_with_cancel(&TaskType::from("extract_data"), ctx, rx)
            .await
            .unwrap();
        assert_eq!(result.execution_status, ExecStatus::Partial);
        assert!(result.per_agent_results.is_empty());
        assert_eq!(result.aggregated_payload["cancelled"], json!(true));
        assert_eq!(fx.reasoner.call_count(), 0, "no spawn, no reasoning");
    }

    #[tokio::test]
    async fn unknown_subtask_dependency_cannot_load() {
        // Registry validation already rejects composites with unknown
        // subtasks; the orchestrator relies on that invariant.
        let yaml = "agents:\n  - task_type: broken\n    subtasks: [ghost]\n";
        assert!(jot_registry::AgentTypeRegistry::from_yaml(yaml).is_err());
    }
}
