// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Table extraction agent: unstructured text in, tabular artifact out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use jot_reason::{ReasonRequest, Reasoner};
use jot_tools::builtin::infer_columns;
use jot_tools::{ToolError, ToolIntegration};

use crate::{
    agent::Agent,
    agents::{parse_json_array, reason_with_timeout},
    context::AgentContext,
    evaluator::Evaluator,
    result::{AgentResult, ErrorKind, Payload},
};

const SYSTEM_PROMPT: &str = "You are a data extraction specialist. Parse unstructured \
text (comma-separated, natural language, mixed formats) into structured rows. Honor \
the requested column set exactly when one is given; otherwise infer sensible column \
names from the content. Be precise and extract every entry.";

const DEFAULT_FILE_NAME: &str = "extracted-data";

/// Agent for the `table_extraction` kind.
pub struct TableExtractionAgent {
    reasoner: Arc<dyn Reasoner>,
    integration: Arc<ToolIntegration>,
    /// Resolved `tabular_write` provider; `None` defers the failure to
    /// execution time (spawning never fails for a soft requirement).
    tabular_tool: Option<String>,
    evaluator: Evaluator,
    reason_timeout: Duration,
}

impl TableExtractionAgent {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        integration: Arc<ToolIntegration>,
        tabular_tool: Option<String>,
        reason_timeout: Duration,
    ) -> Self {
        Self {
            reasoner,
            integration,
            tabular_tool,
            evaluator: Evaluator::new(),
            reason_timeout,
        }
    }

    /// Explicit columns: the `columns` entry carried from an upstream step,
    /// or a `columns:`/`fields:`/`headers:` declaration in the instruction.
    fn parse_columns(ctx: &AgentContext) -> Vec<String> {
        if let Some(value) = ctx.carried.get("columns") {
            let cols = match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Value::String(s) => s.split(',').map(|c| c.trim().to_string()).collect(),
                _ => vec![],
            };
            let cols = dedup_columns(cols);
            if !cols.is_empty() {
                return cols;
            }
        }

        for line in ctx.instruction().lines() {
            let trimmed = line.trim_start();
            let lower = trimmed.to_lowercase();
            for prefix in ["columns:", "fields:", "headers:"] {
                // A matched prefix is pure ASCII, so the byte offset is
                // valid in the original-case line as well.
                if lower.starts_with(prefix) {
                    let rest = &trimmed[prefix.len()..];
                    let cols = dedup_columns(
                        rest.split(',').map(|c| c.trim().to_string()).collect(),
                    );
                    if !cols.is_empty() {
                        return cols;
                    }
                }
            }
        }
        vec![]
    }

    fn file_name(ctx: &AgentContext) -> String {
        ctx.carried
            .get("file_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
    }

    fn build_prompt(source: &str, columns: &[String]) -> String {
        if columns.is_empty() {
            format!(
                "Parse the following text and extract structured data.\n\
                 Infer appropriate column names from the content. Return a JSON \
                 array of objects, one object per entry, values as strings.\n\n\
                 Text to parse:\n{source}"
            )
        } else {
            format!(
                "Parse the following text and extract structured data for these \
                 columns: {}.\n\
                 Return a JSON array of objects. Each object must contain exactly \
                 these keys, values as strings.\n\n\
                 Text to parse:\n{source}",
                columns.join(", ")
            )
        }
    }

    /// Normalize rows so every column exists in every row.
    fn normalize(rows: Vec<Map<String, Value>>, columns: &[String]) -> Vec<Map<String, Value>> {
        rows.into_iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| {
                        (col.clone(), row.get(col).cloned().unwrap_or(Value::String(String::new())))
                    })
                    .collect()
            })
            .collect()
    }
}

fn dedup_columns(cols: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    cols.into_iter()
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

#[async_trait]
impl Agent for TableExtractionAgent {
    fn kind(&self) -> &str {
        "table_extraction"
    }

    async fn execute(&self, ctx: &AgentContext) -> AgentResult {
        let source = ctx.source_text();
        if source.trim().is_empty() {
            return AgentResult::failed(ErrorKind::EmptyExtraction, "no input text to extract from");
        }

        let mut columns = Self::parse_columns(ctx);
        debug!(columns = ?columns, source_len = source.len(), "extracting structured data");

        let req = ReasonRequest::new(Self::build_prompt(source, &columns))
            .with_system(SYSTEM_PROMPT)
            .with_context("user_context", ctx.instruction());

        let outcome = match reason_with_timeout(self.reasoner.as_ref(), req, self.reason_timeout).await
        {
            Ok(o) => o,
            Err(error) => return AgentResult::failed_with(error),
        };

        let rows = parse_json_array(&outcome.text);
        if rows.is_empty() {
            return AgentResult::failed(
                ErrorKind::EmptyExtraction,
                "no rows extracted from input",
            );
        }

        if columns.is_empty() {
            columns = infer_columns(&rows);
        }
        if columns.is_empty() {
            columns = vec!["data".to_string()];
        }
        let rows = Self::normalize(rows, &columns);

        let Some(tool) = &self.tabular_tool else {
            return AgentResult::failed(ErrorKind::Tool, "no tabular provider resolved");
        };

        let args = json!({
            "action": "create",
            "file_name": Self::file_name(ctx),
            "columns": &columns,
            "rows": &rows,
        });
        let artifact = match self.integration.execute(tool, args).await {
            Ok(v) => v,
            Err(ToolError::Timeout { tool, secs }) => {
                return AgentResult::failed(
                    ErrorKind::Timeout,
                    format!("tool '{tool}' timed out after {secs}s"),
                )
            }
            Err(e) => return AgentResult::failed(ErrorKind::Tool, e.to_string()),
        };

        let report = self.evaluator.evaluate_rows(&rows, &columns);

        let mut payload = Payload::new();
        payload.insert("artifact_path".into(), artifact["path"].clone());
        payload.insert("columns".into(), json!(columns));
        payload.insert("row_count".into(), json!(rows.len()));
        payload.insert("rows".into(), json!(rows));
        payload.insert(
            "evaluation".into(),
            json!({
                "passed": report.passed,
                "score": report.score,
                "errors": report.errors,
            }),
        );
        AgentResult::completed(payload)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jot_store::UserId;
    use jot_tools::builtin::TabularFileTool;
    use jot_tools::ToolRegistry;
    use tempfile::TempDir;

    fn agent_with(
        responses: Vec<&str>,
        dir: &TempDir,
    ) -> (TableExtractionAgent, Arc<ToolIntegration>) {
        let mut reg = ToolRegistry::new();
        reg.register(TabularFileTool::new(dir.path()));
        let integration = Arc::new(ToolIntegration::new(Arc::new(reg), 5));
        let agent = TableExtractionAgent::new(
            Arc::new(jot_reason::ScriptedReasoner::new(responses)),
            integration.clone(),
            Some("tabular_file".to_string()),
            Duration::from_secs(5),
        );
        (agent, integration)
    }

    fn ctx(text: &str, instruction: &str) -> AgentContext {
        AgentContext::new(UserId::new())
            .with_raw_text(text)
            .with_instruction(instruction)
    }

    #[tokio::test]
    async fn extracts_reference_product_rows() {
        let tmp = TempDir::new().unwrap();
        let (agent, _) = agent_with(
            vec![r#"[{"name": "Product A", "price": "$100", "stock": "50"},
                     {"name": "Product B", "price": "$200", "stock": "30"}]"#],
            &tmp,
        );
        let result = agent
            .execute(&ctx(
                "Product A: $100, Stock: 50\nProduct B: $200, Stock: 30",
                "Extract product data with name, price, and stock",
            ))
            .await;
        assert!(result.is_completed(), "{:?}", result.error);
        assert_eq!(result.payload["row_count"], json!(2));
        assert_eq!(result.payload["columns"], json!(["name", "price", "stock"]));
        let path = result.payload["artifact_path"].as_str().unwrap();
        assert!(std::path::Path::new(path).is_file());
    }

    #[tokio::test]
    async fn zero_rows_is_empty_extraction_failure() {
        let tmp = TempDir::new().unwrap();
        let (agent, _) = agent_with(vec!["[]"], &tmp);
        let result = agent.execute(&ctx("gibberish with no entries", "extract")).await;
        assert_eq!(result.status, crate::result::ExecStatus::Failed);
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::EmptyExtraction);
    }

    #[tokio::test]
    async fn empty_input_fails_without_reasoning() {
        let tmp = TempDir::new().unwrap();
        let (agent, _) = agent_with(vec![], &tmp);
        let result = agent.execute(&ctx("   ", "extract")).await;
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::EmptyExtraction);
    }

    #[tokio::test]
    async fn explicit_columns_from_instruction_win() {
        let tmp = TempDir::new().unwrap();
        let (agent, _) = agent_with(
            vec![r#"[{"name": "A", "price": "$1", "extra": "ignored"}]"#],
            &tmp,
        );
        let result = agent
            .execute(&ctx("A costs $1", "columns: name, price"))
            .await;
        assert!(result.is_completed());
        assert_eq!(result.payload["columns"], json!(["name", "price"]));
        // normalized rows drop the extra key
        assert!(result.payload["rows"][0].get("extra").is_none());
    }

    #[tokio::test]
    async fn reasoner_failure_becomes_failed_result() {
        let tmp = TempDir::new().unwrap();
        let mut reg = ToolRegistry::new();
        reg.register(TabularFileTool::new(tmp.path()));
        let integration = Arc::new(ToolIntegration::new(Arc::new(reg), 5));
        let agent = TableExtractionAgent::new(
            Arc::new(jot_reason::ScriptedReasoner::always_failing("down")),
            integration,
            Some("tabular_file".to_string()),
            Duration::from_secs(5),
        );
        let result = agent.execute(&ctx("some text", "extract")).await;
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Reasoner);
    }

    #[tokio::test]
    async fn missing_tabular_provider_fails_at_execute() {
        let tmp = TempDir::new().unwrap();
        let mut reg = ToolRegistry::new();
        reg.register(TabularFileTool::new(tmp.path()));
        let integration = Arc::new(ToolIntegration::new(Arc::new(reg), 5));
        let agent = TableExtractionAgent::new(
            Arc::new(jot_reason::ScriptedReasoner::new(vec![r#"[{"a": "1"}]"#])),
            integration,
            None,
            Duration::from_secs(5),
        );
        let result = agent.execute(&ctx("text", "extract")).await;
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Tool);
    }
}
