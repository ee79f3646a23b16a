// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use crate::Tool;

/// A tool schema for discovery listings.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub parameters: serde_json::Value,
}

/// Central registry holding all available tools, indexed by capability.
///
/// Populated once during wiring and immutable afterwards; all lookup methods
/// take `&self`, so an `Arc<ToolRegistry>` is safe for unlimited concurrent
/// readers.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All providers of `capability`, ranked: credential-specific tools
    /// first, generic bridges last, name order within each group so the
    /// ranking is deterministic.
    pub fn resolve(&self, capability: &str) -> Vec<Arc<dyn Tool>> {
        let mut candidates: Vec<Arc<dyn Tool>> = self
            .tools
            .values()
            .filter(|t| t.capabilities().contains(&capability))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            a.is_bridge()
                .cmp(&b.is_bridge())
                .then_with(|| a.name().cmp(b.name()))
        });
        candidates
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.tools.values().any(|t| t.capabilities().contains(&capability))
    }

    /// Produce schemas for all registered tools, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                capabilities: t.capabilities().iter().map(|c| c.to_string()).collect(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
