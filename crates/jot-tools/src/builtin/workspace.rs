// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `workspace` — structured content in the knowledge workspace.
//!
//! Actions: `search`, `create_page`, `append_blocks`.  The tool is a thin
//! dispatcher over a [`WorkspaceBackend`]; the in-repo [`FileWorkspace`]
//! stores pages as markdown files, while the hosted workspace integration
//! implements the same backend against its HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::{Tool, ToolCall, ToolOutput};

/// One block of structured page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: String,
    /// Only meaningful for `to_do` blocks.
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    ToDo,
    BulletedListItem,
    Quote,
    Divider,
}

impl Block {
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::Paragraph, content: content.into(), checked: false }
    }

    pub fn heading(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::Heading, content: content.into(), checked: false }
    }

    pub fn todo(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::ToDo, content: content.into(), checked: false }
    }

    pub fn bullet(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::BulletedListItem, content: content.into(), checked: false }
    }

    /// Markdown rendering used by the file backend and by degraded-mode
    /// artifacts.
    pub fn to_markdown(&self) -> String {
        match self.kind {
            BlockKind::Paragraph => self.content.clone(),
            BlockKind::Heading => format!("## {}", self.content),
            BlockKind::ToDo => {
                let mark = if self.checked { "x" } else { " " };
                format!("- [{mark}] {}", self.content)
            }
            BlockKind::BulletedListItem => format!("- {}", self.content),
            BlockKind::Quote => format!("> {}", self.content),
            BlockKind::Divider => "---".to_string(),
        }
    }
}

/// A page matched by a workspace search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageHit {
    pub page_id: String,
    pub title: String,
    /// Match count; higher is more relevant.
    pub score: usize,
}

/// Reference to a created or extended page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRef {
    pub page_id: String,
    pub url: String,
}

/// Backend the workspace tool dispatches to.
#[async_trait]
pub trait WorkspaceBackend: Send + Sync {
    /// Keyword search over pages, most relevant first.
    async fn search(&self, query: &str) -> anyhow::Result<Vec<PageHit>>;
    async fn create_page(&self, title: &str, blocks: &[Block]) -> anyhow::Result<PageRef>;
    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> anyhow::Result<PageRef>;
}

fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

/// File-backed workspace: every page is a markdown file under `root`,
/// the page id is the file stem.
pub struct FileWorkspace {
    root: PathBuf,
}

impl FileWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn page_path(&self, page_id: &str) -> PathBuf {
        self.root.join(format!("{page_id}.md"))
    }
}

#[async_trait]
impl WorkspaceBackend for FileWorkspace {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<PageHit>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let entries = match std::fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(_) => return Ok(vec![]),
        };

        let mut hits = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable workspace page");
                    continue;
                }
            };
            let title = text
                .lines()
                .next()
                .unwrap_or(stem)
                .trim_start_matches('#')
                .trim()
                .to_string();
            let haystack = text.to_lowercase();
            let score: usize = terms.iter().map(|t| haystack.matches(t).count()).sum();
            if score > 0 {
                hits.push(PageHit { page_id: stem.to_string(), title, score });
            }
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.page_id.cmp(&b.page_id)));
        Ok(hits)
    }

    async fn create_page(&self, title: &str, blocks: &[Block]) -> anyhow::Result<PageRef> {
        std::fs::create_dir_all(&self.root)?;
        // Disambiguate colliding titles rather than silently merging pages.
        let base = slugify(title);
        let mut page_id = base.clone();
        let mut n = 1;
        while self.page_path(&page_id).exists() {
            n += 1;
            page_id = format!("{base}-{n}");
        }
        let path = self.page_path(&page_id);

        let mut text = format!("# {title}\n");
        for block in blocks {
            text.push('\n');
            text.push_str(&block.to_markdown());
        }
        text.push('\n');
        std::fs::write(&path, text)?;
        Ok(PageRef { page_id, url: path.display().to_string() })
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Block]) -> anyhow::Result<PageRef> {
        let path = self.page_path(page_id);
        if !path.is_file() {
            anyhow::bail!("no page '{page_id}'");
        }
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new().append(true).open(&path)?;
        for block in blocks {
            writeln!(f, "\n{}", block.to_markdown())?;
        }
        Ok(PageRef { page_id: page_id.to_string(), url: path.display().to_string() })
    }
}

/// Shared action dispatch for workspace-shaped tools (primary and bridge).
pub(crate) async fn run_workspace_action(
    backend: &dyn WorkspaceBackend,
    call: &ToolCall,
) -> ToolOutput {
    match call.args.get("action").and_then(Value::as_str) {
        Some("search") => {
            let Some(query) = call.args.get("query").and_then(Value::as_str) else {
                return ToolOutput::err(&call.id, "missing 'query'");
            };
            match backend.search(query).await {
                Ok(hits) => ToolOutput::ok(&call.id, json!({ "results": hits })),
                Err(e) => ToolOutput::err(&call.id, format!("search failed: {e}")),
            }
        }
        Some("create_page") => {
            let Some(title) = call.args.get("title").and_then(Value::as_str) else {
                return ToolOutput::err(&call.id, "missing 'title'");
            };
            let blocks = match parse_blocks(&call.args) {
                Ok(b) => b,
                Err(e) => return ToolOutput::err(&call.id, e),
            };
            match backend.create_page(title, &blocks).await {
                Ok(page) => ToolOutput::ok(
                    &call.id,
                    json!({ "page_id": page.page_id, "url": page.url }),
                ),
                Err(e) => ToolOutput::err(&call.id, format!("create_page failed: {e}")),
            }
        }
        Some("append_blocks") => {
            let Some(page_id) = call.args.get("page_id").and_then(Value::as_str) else {
                return ToolOutput::err(&call.id, "missing 'page_id'");
            };
            let blocks = match parse_blocks(&call.args) {
                Ok(b) => b,
                Err(e) => return ToolOutput::err(&call.id, e),
            };
            if blocks.is_empty() {
                return ToolOutput::err(&call.id, "missing 'blocks'");
            }
            match backend.append_blocks(page_id, &blocks).await {
                Ok(page) => ToolOutput::ok(
                    &call.id,
                    json!({ "page_id": page.page_id, "url": page.url }),
                ),
                Err(e) => ToolOutput::err(&call.id, format!("append_blocks failed: {e}")),
            }
        }
        Some(other) => ToolOutput::err(&call.id, format!("unknown action '{other}'")),
        None => ToolOutput::err(&call.id, "missing 'action'"),
    }
}

fn parse_blocks(args: &Value) -> Result<Vec<Block>, String> {
    match args.get("blocks") {
        None => Ok(vec![]),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| format!("bad 'blocks': {e}")),
    }
}

fn workspace_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "enum": ["search", "create_page", "append_blocks"] },
            "query": { "type": "string" },
            "title": { "type": "string" },
            "page_id": { "type": "string" },
            "blocks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string" },
                        "content": { "type": "string" },
                        "checked": { "type": "boolean" }
                    },
                    "required": ["type"]
                }
            }
        },
        "required": ["action"],
        "additionalProperties": false
    })
}

/// The credentialed workspace integration.
pub struct WorkspaceTool {
    backend: Arc<dyn WorkspaceBackend>,
}

impl WorkspaceTool {
    pub fn new(backend: Arc<dyn WorkspaceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WorkspaceTool {
    fn name(&self) -> &str {
        "workspace"
    }

    fn description(&self) -> &str {
        "Search, create, and extend pages in the user's knowledge workspace.\n\
         Requires the user's stored workspace credential."
    }

    fn capabilities(&self) -> &[&str] {
        &["workspace_write", "workspace_search"]
    }

    fn parameters_schema(&self) -> Value {
        workspace_schema()
    }

    fn requires_account(&self) -> Option<&str> {
        Some("workspace")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        run_workspace_action(self.backend.as_ref(), call).await
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "w1".into(), name: "workspace".into(), args }
    }

    #[test]
    fn block_markdown_rendering() {
        assert_eq!(Block::paragraph("hi").to_markdown(), "hi");
        assert_eq!(Block::heading("Top").to_markdown(), "## Top");
        assert_eq!(Block::todo("buy milk").to_markdown(), "- [ ] buy milk");
        assert_eq!(Block::bullet("point").to_markdown(), "- point");
    }

    #[test]
    fn slugify_flattens_punctuation() {
        assert_eq!(slugify("Meeting Notes: Q3!"), "meeting-notes--q3");
        assert_eq!(slugify("   "), "page");
    }

    #[tokio::test]
    async fn create_page_then_search_finds_it() {
        let tmp = TempDir::new().unwrap();
        let ws = FileWorkspace::new(tmp.path());
        ws.create_page("Rust Notes", &[Block::paragraph("ownership and borrowing")])
            .await
            .unwrap();
        let hits = ws.search("ownership").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust Notes");
    }

    #[tokio::test]
    async fn search_ranks_by_match_count() {
        let tmp = TempDir::new().unwrap();
        let ws = FileWorkspace::new(tmp.path());
        ws.create_page("One", &[Block::paragraph("topic")]).await.unwrap();
        ws.create_page("Many", &[Block::paragraph("topic topic topic")])
            .await
            .unwrap();
        let hits = ws.search("topic").await.unwrap();
        assert_eq!(hits[0].page_id, "many");
    }

    #[tokio::test]
    async fn colliding_titles_get_distinct_ids() {
        let tmp = TempDir::new().unwrap();
        let ws = FileWorkspace::new(tmp.path());
        let a = ws.create_page("Same", &[]).await.unwrap();
        let b = ws.create_page("Same", &[]).await.unwrap();
        assert_ne!(a.page_id, b.page_id);
    }

    #[tokio::test]
    async fn append_blocks_extends_page() {
        let tmp = TempDir::new().unwrap();
        let ws = FileWorkspace::new(tmp.path());
        let page = ws.create_page("Log", &[]).await.unwrap();
        ws.append_blocks(&page.page_id, &[Block::todo("task")]).await.unwrap();
        let text = std::fs::read_to_string(tmp.path().join("log.md")).unwrap();
        assert!(text.contains("- [ ] task"));
    }

    #[tokio::test]
    async fn append_to_unknown_page_fails() {
        let tmp = TempDir::new().unwrap();
        let ws = FileWorkspace::new(tmp.path());
        assert!(ws.append_blocks("ghost", &[Block::paragraph("x")]).await.is_err());
    }

    #[tokio::test]
    async fn tool_dispatch_create_and_search() {
        let tmp = TempDir::new().unwrap();
        let tool = WorkspaceTool::new(Arc::new(FileWorkspace::new(tmp.path())));

        let out = tool
            .execute(&call(json!({
                "action": "create_page",
                "title": "Ideas",
                "blocks": [{ "type": "paragraph", "content": "a grand plan" }],
            })))
            .await;
        assert!(!out.is_error, "{}", out.message);
        assert!(out.value["page_id"].as_str().is_some());

        let found = tool
            .execute(&call(json!({ "action": "search", "query": "grand" })))
            .await;
        assert!(!found.is_error);
        assert_eq!(found.value["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tool_rejects_unknown_action() {
        let tmp = TempDir::new().unwrap();
        let tool = WorkspaceTool::new(Arc::new(FileWorkspace::new(tmp.path())));
        let out = tool.execute(&call(json!({ "action": "destroy" }))).await;
        assert!(out.is_error);
    }
}
