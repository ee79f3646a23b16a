// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Agent kind registry: static metadata for every implemented agent kind.
//!
//! Single source of truth for which `agent_kind` discriminators exist.
//! The spawner's constructor match must cover exactly this set; registry
//! loading validates blueprint references against it so a typo in the YAML
//! fails at startup instead of at first use.

/// Metadata describing an implemented agent kind.
#[derive(Debug, Clone)]
pub struct AgentKindMeta {
    /// Unique id referenced by blueprint `agent_kind` fields.
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// One-line description shown by `jot list-agents`.
    pub description: &'static str,
}

/// Complete registry of implemented agent kinds.
pub static AGENT_KINDS: &[AgentKindMeta] = &[
    AgentKindMeta {
        id: "table_extraction",
        name: "Table extraction",
        description: "Parses unstructured text into rows and writes a tabular artifact",
    },
    AgentKindMeta {
        id: "note_writer",
        name: "Note writer",
        description: "Creates or appends structured content in the knowledge workspace",
    },
    AgentKindMeta {
        id: "knowledge_answer",
        name: "Knowledge answer",
        description: "Answers questions grounded in retrieved user context",
    },
];

/// Look up an agent kind by its id.  Returns `None` for unknown ids.
pub fn get_kind(id: &str) -> Option<&'static AgentKindMeta> {
    AGENT_KINDS.iter().find(|k| k.id == id)
}

/// Returns an iterator over all known agent kind ids.
pub fn known_kind_ids() -> impl Iterator<Item = &'static str> {
    AGENT_KINDS.iter().map(|k| k.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for k in AGENT_KINDS {
            assert!(seen.insert(k.id), "duplicate agent kind id: {}", k.id);
        }
    }

    #[test]
    fn get_kind_returns_correct_entry() {
        let k = get_kind("table_extraction").expect("must be registered");
        assert_eq!(k.name, "Table extraction");
    }

    #[test]
    fn get_kind_returns_none_for_unknown() {
        assert!(get_kind("not-an-agent-kind").is_none());
    }
}
