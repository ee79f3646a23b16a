// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{Tool, ToolCall, ToolRegistry};

/// Failures at the tool-integration boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No registered provider for a capability a caller insisted on.
    #[error("no tool provides capability '{0}'")]
    CapabilityNotFound(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    /// The tool ran and reported failure; the underlying message is wrapped,
    /// never swallowed.
    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
    #[error("tool '{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
}

/// Runtime bridge between agents and the tool registry.
///
/// Resolution is forgiving (missing capabilities are omitted so the spawner
/// can decide what is fatal); execution is strict (failures come back as
/// typed errors) and bounded (every call carries the configured timeout).
pub struct ToolIntegration {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
    next_call: AtomicU64,
}

impl ToolIntegration {
    pub fn new(registry: Arc<ToolRegistry>, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs.max(1)),
            next_call: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve each requested capability to its highest-ranked provider.
    ///
    /// Capabilities with no registered provider are omitted from the result
    /// rather than raising — callers decide whether a missing tool is fatal.
    pub fn discover(&self, capabilities: &BTreeSet<String>) -> BTreeMap<String, Arc<dyn Tool>> {
        let mut resolved = BTreeMap::new();
        for cap in capabilities {
            if let Some(tool) = self.registry.resolve(cap).into_iter().next() {
                resolved.insert(cap.clone(), tool);
            } else {
                debug!(capability = %cap, "no provider registered — omitting");
            }
        }
        resolved
    }

    /// Resolve a capability or fail.  For callers (not the spawner) that
    /// cannot proceed without it.
    pub fn resolve_required(&self, capability: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.registry
            .resolve(capability)
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::CapabilityNotFound(capability.to_string()))
    }

    /// Execute a tool by name with JSON arguments.
    ///
    /// Wraps tool-reported failures in [`ToolError::Execution`] and enforces
    /// the configured per-call timeout.
    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let call = ToolCall {
            id: format!("call-{}", self.next_call.fetch_add(1, Ordering::Relaxed)),
            name: tool_name.to_string(),
            args,
        };

        debug!(tool = tool_name, call_id = %call.id, "executing tool");

        let output = tokio::time::timeout(self.timeout, tool.execute(&call))
            .await
            .map_err(|_| ToolError::Timeout {
                tool: tool_name.to_string(),
                secs: self.timeout.as_secs(),
            })?;

        if output.is_error {
            return Err(ToolError::Execution {
                tool: tool_name.to_string(),
                message: output.message,
            });
        }
        Ok(output.value)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
