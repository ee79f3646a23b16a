// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Note agent: structured content into the knowledge workspace.
//!
//! One execution path serves note-taking, to-do creation, and tabular note
//! filing; the task types differ only in how content is shaped into blocks
//! before writing.  Pipeline: derive a search payload → search the workspace
//! → append to the best match, or create a page when nothing matches.  When
//! no workspace provider resolved (no credential, no bridge) the agent
//! degrades to a local markdown artifact instead of failing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use jot_reason::{ReasonRequest, Reasoner};
use jot_registry::TaskType;
use jot_tools::builtin::Block;
use jot_tools::{ToolError, ToolIntegration};

use crate::{
    agent::Agent,
    agents::{parse_json_object, preview, reason_with_timeout},
    context::AgentContext,
    result::{AgentResult, ErrorKind, Payload},
};

const SYSTEM_PROMPT: &str = "You are a note-taking assistant that files content into \
a knowledge workspace. You do not call tools yourself; when asked, you answer with a \
single JSON object and nothing else.";

/// Agent for the `note_writer` kind.
pub struct NoteAgent {
    task_type: TaskType,
    reasoner: Arc<dyn Reasoner>,
    integration: Arc<ToolIntegration>,
    /// Resolved `workspace_write` provider (primary or bridge); `None`
    /// selects degraded mode.
    workspace_tool: Option<String>,
    /// Destination for degraded-mode artifacts.
    artifact_dir: PathBuf,
    reason_timeout: Duration,
}

impl NoteAgent {
    pub fn new(
        task_type: TaskType,
        reasoner: Arc<dyn Reasoner>,
        integration: Arc<ToolIntegration>,
        workspace_tool: Option<String>,
        artifact_dir: PathBuf,
        reason_timeout: Duration,
    ) -> Self {
        Self {
            task_type,
            reasoner,
            integration,
            workspace_tool,
            artifact_dir,
            reason_timeout,
        }
    }

    /// Shape the captured content into blocks according to the task type.
    fn shape_blocks(&self, ctx: &AgentContext) -> Vec<Block> {
        let content = ctx.source_text();
        let mut blocks: Vec<Block> = match self.task_type.as_str() {
            "create_todo" => split_items(content).into_iter().map(Block::todo).collect(),
            "add_to_knowledge_base" => {
                // Prefer rows carried from an upstream extraction step.
                match ctx.carried.get("rows").and_then(Value::as_array) {
                    Some(rows) if !rows.is_empty() => rows_to_blocks(rows),
                    _ => paragraphs(content),
                }
            }
            _ => paragraphs(content),
        };

        if let Some(path) = ctx.carried.get("artifact_path").and_then(Value::as_str) {
            blocks.push(Block::bullet(format!("Artifact: {path}")));
        }
        blocks
    }

    /// Ask the reasoner for the search payload: `{"query": …, "title": …}`.
    async fn derive_payload(&self, ctx: &AgentContext) -> Result<(String, String), AgentResult> {
        let prompt = format!(
            "Return ONLY a single JSON object with two string keys:\n\
             \"query\" — a short workspace search query locating the page this \
             content belongs to, and \"title\" — a page title to use if no page \
             exists yet.\n\nUser instruction:\n{}\n\nContent to save:\n{}{}\n\n\
             Output only the JSON object, no other text.",
            ctx.instruction(),
            preview(ctx.source_text(), 1000),
            if ctx.urls.is_empty() {
                String::new()
            } else {
                format!("\n\nSource URLs: {}", ctx.urls.join(", "))
            },
        );

        let req = ReasonRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_context("task_type", self.task_type.as_str());
        let outcome =
            match reason_with_timeout(self.reasoner.as_ref(), req, self.reason_timeout).await {
                Ok(o) => o,
                Err(error) => return Err(AgentResult::failed_with(error)),
            };

        let Some(payload) = parse_json_object(&outcome.text) else {
            return Err(AgentResult::failed(
                ErrorKind::Reasoner,
                "invalid search payload: need \"query\" and \"title\" strings",
            ));
        };
        let query = payload
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let title = payload
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        if query.is_empty() || title.is_empty() {
            return Err(AgentResult::failed(
                ErrorKind::Reasoner,
                "search payload query and title cannot be empty",
            ));
        }
        Ok((query, title))
    }

    async fn write_to_workspace(
        &self,
        tool: &str,
        query: &str,
        title: &str,
        blocks: &[Block],
        ctx: &AgentContext,
    ) -> AgentResult {
        let search = match self
            .integration
            .execute(tool, json!({ "action": "search", "query": query }))
            .await
        {
            Ok(v) => v,
            Err(e) => return workspace_error(e),
        };
        let results = search["results"].as_array().cloned().unwrap_or_default();
        debug!(results = results.len(), query, "workspace search finished");

        let (response, appended, summary) = if let Some(hit) = results.first() {
            let page_id = hit["page_id"].as_str().unwrap_or_default();
            let out = self
                .integration
                .execute(
                    tool,
                    json!({ "action": "append_blocks", "page_id": page_id, "blocks": blocks }),
                )
                .await;
            match out {
                Ok(v) => (v, true, "Content appended to existing workspace page."),
                Err(e) => return workspace_error(e),
            }
        } else {
            let out = self
                .integration
                .execute(
                    tool,
                    json!({ "action": "create_page", "title": title, "blocks": blocks }),
                )
                .await;
            match out {
                Ok(v) => (v, false, "Workspace page created."),
                Err(e) => return workspace_error(e),
            }
        };

        let mut payload = Payload::new();
        payload.insert("page_id".into(), response["page_id"].clone());
        payload.insert("page_url".into(), response["url"].clone());
        payload.insert("appended".into(), json!(appended));
        payload.insert("summary".into(), json!(summary));
        payload.insert(
            "content_preview".into(),
            json!(preview(ctx.source_text(), 200)),
        );
        AgentResult::completed(payload)
    }

    /// Degraded mode: no workspace capability resolved.  Produce a local
    /// markdown artifact so the captured content is never lost.
    fn write_degraded(&self, title: &str, blocks: &[Block], ctx: &AgentContext) -> AgentResult {
        let dir = self.artifact_dir.join("notes");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            return AgentResult::failed(ErrorKind::Internal, format!("creating {}: {e}", dir.display()));
        }

        let base: String = title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let base = base.trim_matches('-');
        let base = if base.is_empty() { "note" } else { base };
        let mut path = dir.join(format!("{base}.md"));
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = dir.join(format!("{base}-{n}.md"));
        }

        let mut text = format!("# {title}\n");
        for block in blocks {
            text.push('\n');
            text.push_str(&block.to_markdown());
        }
        text.push('\n');
        if let Err(e) = std::fs::write(&path, text) {
            return AgentResult::failed(ErrorKind::Internal, format!("writing {}: {e}", path.display()));
        }

        let mut payload = Payload::new();
        payload.insert("artifact_path".into(), json!(path.display().to_string()));
        payload.insert("workspace_degraded".into(), json!(true));
        payload.insert(
            "summary".into(),
            json!("Workspace unavailable — content saved as a local artifact."),
        );
        payload.insert(
            "content_preview".into(),
            json!(preview(ctx.source_text(), 200)),
        );
        AgentResult::completed(payload)
    }
}

fn paragraphs(content: &str) -> Vec<Block> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(Block::paragraph)
        .collect()
}

/// To-do items: one per line; a single line is split on commas so quick
/// captures like "milk, eggs, bread" become three items.
fn split_items(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() == 1 && lines[0].contains(',') {
        return lines[0]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    lines.into_iter().map(str::to_string).collect()
}

/// Render extracted rows as workspace blocks: one bullet per row.
fn rows_to_blocks(rows: &[Value]) -> Vec<Block> {
    let mut blocks = vec![Block::heading("Extracted data")];
    for row in rows {
        if let Some(obj) = row.as_object() {
            let line: Vec<String> = obj
                .iter()
                .map(|(k, v)| format!("{k}: {}", v.as_str().unwrap_or_default()))
                .collect();
            blocks.push(Block::bullet(line.join(", ")));
        }
    }
    blocks
}

fn workspace_error(e: ToolError) -> AgentResult {
    match e {
        ToolError::Timeout { tool, secs } => AgentResult::failed(
            ErrorKind::Timeout,
            format!("tool '{tool}' timed out after {secs}s"),
        ),
        other => AgentResult::failed(ErrorKind::Workspace, other.to_string()),
    }
}

#[async_trait]
impl Agent for NoteAgent {
    fn kind(&self) -> &str {
        "note_writer"
    }

    async fn execute(&self, ctx: &AgentContext) -> AgentResult {
        if ctx.source_text().trim().is_empty() && ctx.carried.is_empty() {
            return AgentResult::failed(ErrorKind::Internal, "nothing to save");
        }

        let (query, title) = match self.derive_payload(ctx).await {
            Ok(p) => p,
            Err(result) => return result,
        };
        debug!(query, title, task_type = %self.task_type, "note payload derived");

        let blocks = self.shape_blocks(ctx);
        if blocks.is_empty() {
            return AgentResult::failed(ErrorKind::Internal, "content shaped to zero blocks");
        }

        match &self.workspace_tool {
            Some(tool) => self.write_to_workspace(tool, &query, &title, &blocks, ctx).await,
            None => self.write_degraded(&title, &blocks, ctx),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
