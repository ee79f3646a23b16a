// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `tabular_file` — generic tabular artifact tool (CSV files).
//!
//! Actions: `create` (new artifact, or transparent append when the target
//! already exists), `append`, `read`.  Artifacts live under the configured
//! artifact directory; the workspace-facing spreadsheet integration provides
//! the same capabilities against its own backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{Tool, ToolCall, ToolOutput};

/// Infer a column set from rows: first-seen key ordering, de-duplicated.
pub fn infer_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse one CSV line into fields, honoring quoted fields with embedded
/// commas and doubled quotes.
fn csv_parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Generic tabular artifact tool backed by CSV files.
pub struct TabularFileTool {
    pub artifact_dir: PathBuf,
}

impl TabularFileTool {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self { artifact_dir: artifact_dir.into() }
    }

    fn resolve_path(&self, file_name: &str) -> PathBuf {
        let name = if file_name.to_lowercase().ends_with(".csv") {
            file_name.to_string()
        } else {
            format!("{file_name}.csv")
        };
        self.artifact_dir.join(name)
    }

    fn parse_rows(args: &Value) -> Result<Vec<Map<String, Value>>, String> {
        let Some(rows) = args.get("rows").and_then(Value::as_array) else {
            return Err("missing 'rows' array".into());
        };
        let mut parsed = Vec::with_capacity(rows.len());
        for row in rows {
            match row.as_object() {
                Some(obj) => parsed.push(obj.clone()),
                None => return Err("'rows' entries must be objects".into()),
            }
        }
        Ok(parsed)
    }

    fn parse_columns(args: &Value) -> Vec<String> {
        args.get("columns")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn write_rows(
        path: &Path,
        columns: &[String],
        rows: &[Map<String, Value>],
        append: bool,
    ) -> std::io::Result<()> {
        let mut text = String::new();
        if !append {
            text.push_str(
                &columns.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(","),
            );
            text.push('\n');
        }
        for row in rows {
            let line: Vec<String> = columns
                .iter()
                .map(|col| csv_escape(&cell_to_string(row.get(col).unwrap_or(&Value::Null))))
                .collect();
            text.push_str(&line.join(","));
            text.push('\n');
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if append {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new().append(true).open(path)?;
            f.write_all(text.as_bytes())
        } else {
            std::fs::write(path, text)
        }
    }

    fn read_table(path: &Path) -> std::io::Result<(Vec<String>, Vec<Map<String, Value>>)> {
        let text = std::fs::read_to_string(path)?;
        let mut lines = text.lines();
        let columns: Vec<String> = match lines.next() {
            Some(header) => csv_parse_line(header),
            None => return Ok((vec![], vec![])),
        };
        let mut rows = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let fields = csv_parse_line(line);
            let mut row = Map::new();
            for (i, col) in columns.iter().enumerate() {
                let value = fields.get(i).cloned().unwrap_or_default();
                row.insert(col.clone(), Value::String(value));
            }
            rows.push(row);
        }
        Ok((columns, rows))
    }

    fn do_create(&self, call: &ToolCall) -> ToolOutput {
        let Some(file_name) = call.args.get("file_name").and_then(Value::as_str) else {
            return ToolOutput::err(&call.id, "missing 'file_name'");
        };
        let rows = match Self::parse_rows(&call.args) {
            Ok(r) => r,
            Err(e) => return ToolOutput::err(&call.id, e),
        };
        let path = self.resolve_path(file_name);

        // A create against an existing artifact extends it instead of
        // clobbering it; the existing header defines the column set.
        if path.is_file() {
            return self.append_to(&call.id, &path, &rows);
        }

        let mut columns = Self::parse_columns(&call.args);
        if columns.is_empty() {
            columns = infer_columns(&rows);
        }
        if columns.is_empty() {
            return ToolOutput::err(&call.id, "cannot create a table with no columns");
        }

        if let Err(e) = Self::write_rows(&path, &columns, &rows, false) {
            return ToolOutput::err(&call.id, format!("writing {}: {e}", path.display()));
        }
        ToolOutput::ok(
            &call.id,
            json!({
                "path": path.display().to_string(),
                "columns": columns,
                "rows_written": rows.len(),
                "appended": false,
            }),
        )
    }

    fn append_to(&self, call_id: &str, path: &Path, rows: &[Map<String, Value>]) -> ToolOutput {
        let (columns, _) = match Self::read_table(path) {
            Ok(t) => t,
            Err(e) => return ToolOutput::err(call_id, format!("reading {}: {e}", path.display())),
        };
        if columns.is_empty() {
            return ToolOutput::err(call_id, format!("{} has no header row", path.display()));
        }
        if let Err(e) = Self::write_rows(path, &columns, rows, true) {
            return ToolOutput::err(call_id, format!("appending {}: {e}", path.display()));
        }
        ToolOutput::ok(
            call_id,
            json!({
                "path": path.display().to_string(),
                "columns": columns,
                "rows_written": rows.len(),
                "appended": true,
            }),
        )
    }

    fn do_append(&self, call: &ToolCall) -> ToolOutput {
        let Some(file_name) = call.args.get("file_name").and_then(Value::as_str) else {
            return ToolOutput::err(&call.id, "missing 'file_name'");
        };
        let rows = match Self::parse_rows(&call.args) {
            Ok(r) => r,
            Err(e) => return ToolOutput::err(&call.id, e),
        };
        let path = self.resolve_path(file_name);
        if !path.is_file() {
            return ToolOutput::err(&call.id, format!("no artifact at {}", path.display()));
        }
        self.append_to(&call.id, &path, &rows)
    }

    fn do_read(&self, call: &ToolCall) -> ToolOutput {
        let Some(file_name) = call.args.get("file_name").and_then(Value::as_str) else {
            return ToolOutput::err(&call.id, "missing 'file_name'");
        };
        let path = self.resolve_path(file_name);
        match Self::read_table(&path) {
            Ok((columns, rows)) => ToolOutput::ok(
                &call.id,
                json!({
                    "path": path.display().to_string(),
                    "columns": columns,
                    "rows": rows,
                }),
            ),
            Err(e) => ToolOutput::err(&call.id, format!("reading {}: {e}", path.display())),
        }
    }
}

#[async_trait]
impl Tool for TabularFileTool {
    fn name(&self) -> &str {
        "tabular_file"
    }

    fn description(&self) -> &str {
        "Create, extend, and read tabular file artifacts (CSV).\n\
         `create` starts a new table — or extends an existing one with the\n\
         same name — `append` adds rows, `read` returns columns and rows."
    }

    fn capabilities(&self) -> &[&str] {
        &["tabular_write", "tabular_read"]
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["create", "append", "read"] },
                "file_name": { "type": "string" },
                "columns": { "type": "array", "items": { "type": "string" } },
                "rows": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["action", "file_name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match call.args.get("action").and_then(Value::as_str) {
            Some("create") => self.do_create(call),
            Some("append") => self.do_append(call),
            Some("read") => self.do_read(call),
            Some(other) => ToolOutput::err(&call.id, format!("unknown action '{other}'")),
            None => ToolOutput::err(&call.id, "missing 'action'"),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn call(args: Value) -> ToolCall {
        ToolCall { id: "t1".into(), name: "tabular_file".into(), args }
    }

    fn row(pairs: &[(&str, &str)]) -> Value {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), Value::String(v.to_string()));
        }
        Value::Object(m)
    }

    #[test]
    fn infer_columns_first_seen_order_dedup() {
        let rows: Vec<Map<String, Value>> = vec![
            serde_json::from_value(row(&[("name", "a"), ("price", "1")])).unwrap(),
            serde_json::from_value(row(&[("name", "b"), ("stock", "2")])).unwrap(),
        ];
        assert_eq!(infer_columns(&rows), vec!["name", "price", "stock"]);
    }

    #[test]
    fn csv_escape_quotes_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_parse_line_roundtrips_quoted_fields() {
        let line = "plain,\"a,b\",\"say \"\"hi\"\"\"";
        assert_eq!(csv_parse_line(line), vec!["plain", "a,b", "say \"hi\""]);
    }

    #[tokio::test]
    async fn create_then_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let tool = TabularFileTool::new(tmp.path());
        let out = tool
            .execute(&call(json!({
                "action": "create",
                "file_name": "products",
                "columns": ["name", "price"],
                "rows": [row(&[("name", "A"), ("price", "$100")])],
            })))
            .await;
        assert!(!out.is_error, "{}", out.message);
        assert_eq!(out.value["rows_written"], json!(1));

        let read = tool
            .execute(&call(json!({ "action": "read", "file_name": "products" })))
            .await;
        assert!(!read.is_error);
        assert_eq!(read.value["columns"], json!(["name", "price"]));
        assert_eq!(read.value["rows"][0]["name"], json!("A"));
    }

    #[tokio::test]
    async fn create_on_existing_file_appends() {
        let tmp = TempDir::new().unwrap();
        let tool = TabularFileTool::new(tmp.path());
        for name in ["A", "B"] {
            let out = tool
                .execute(&call(json!({
                    "action": "create",
                    "file_name": "products",
                    "rows": [row(&[("name", name)])],
                })))
                .await;
            assert!(!out.is_error, "{}", out.message);
        }
        let read = tool
            .execute(&call(json!({ "action": "read", "file_name": "products" })))
            .await;
        assert_eq!(read.value["rows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_infers_columns_when_absent() {
        let tmp = TempDir::new().unwrap();
        let tool = TabularFileTool::new(tmp.path());
        let out = tool
            .execute(&call(json!({
                "action": "create",
                "file_name": "t",
                "rows": [row(&[("x", "1"), ("y", "2")])],
            })))
            .await;
        assert_eq!(out.value["columns"], json!(["x", "y"]));
    }

    #[tokio::test]
    async fn append_to_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let tool = TabularFileTool::new(tmp.path());
        let out = tool
            .execute(&call(json!({
                "action": "append",
                "file_name": "nope",
                "rows": [row(&[("x", "1")])],
            })))
            .await;
        assert!(out.is_error);
    }

    #[tokio::test]
    async fn unknown_action_is_error() {
        let tool = TabularFileTool::new("/tmp");
        let out = tool
            .execute(&call(json!({ "action": "explode", "file_name": "x" })))
            .await;
        assert!(out.is_error);
        assert!(out.message.contains("unknown action"));
    }
}
