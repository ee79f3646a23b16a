// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `save_context` — persists content into the user's context store.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use jot_store::{ContextStore, UserId};

use crate::{Tool, ToolCall, ToolOutput};

pub struct ContextSaveTool {
    store: Arc<dyn ContextStore>,
}

impl ContextSaveTool {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ContextSaveTool {
    fn name(&self) -> &str {
        "save_context"
    }

    fn description(&self) -> &str {
        "Save content into the user's context store for later retrieval."
    }

    fn capabilities(&self) -> &[&str] {
        &["context_save"]
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "content": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "parent_topic": { "type": "string" }
            },
            "required": ["user_id", "content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(user_raw) = call.args.get("user_id").and_then(Value::as_str) else {
            return ToolOutput::err(&call.id, "missing 'user_id'");
        };
        let user = match Uuid::from_str(user_raw) {
            Ok(u) => UserId(u),
            Err(_) => return ToolOutput::err(&call.id, format!("bad user id '{user_raw}'")),
        };
        let Some(content) = call.args.get("content").and_then(Value::as_str) else {
            return ToolOutput::err(&call.id, "missing 'content'");
        };
        let tags: Vec<String> = call
            .args
            .get("tags")
            .and_then(Value::as_array)
            .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let parent_topic = call.args.get("parent_topic").and_then(Value::as_str);

        match self.store.persist(&user, content, &tags, parent_topic).await {
            Ok(id) => ToolOutput::ok(&call.id, json!({ "context_id": id.to_string() })),
            Err(e) => ToolOutput::err(&call.id, format!("persist failed: {e}")),
        }
    }
}
