// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `bridge` — generic automation bridge.
//!
//! Proxies the same workspace actions as the credentialed integration
//! without a user-specific stored key, so agents keep working for users who
//! have not connected their workspace account.  The capability registry
//! ranks it after credentialed providers; the spawner substitutes it only
//! when the primary is unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::workspace::{run_workspace_action, WorkspaceBackend};
use crate::{Tool, ToolCall, ToolOutput};

pub struct BridgeTool {
    backend: Arc<dyn WorkspaceBackend>,
}

impl BridgeTool {
    pub fn new(backend: Arc<dyn WorkspaceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for BridgeTool {
    fn name(&self) -> &str {
        "bridge"
    }

    fn description(&self) -> &str {
        "Generic automation bridge: proxies workspace actions through a\n\
         shared service account when no user-specific credential is stored."
    }

    fn capabilities(&self) -> &[&str] {
        &["workspace_write", "workspace_search"]
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["search", "create_page", "append_blocks"] },
                "query": { "type": "string" },
                "title": { "type": "string" },
                "page_id": { "type": "string" },
                "blocks": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["action"],
            "additionalProperties": false
        })
    }

    fn is_bridge(&self) -> bool {
        true
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        run_workspace_action(self.backend.as_ref(), call).await
    }
}
