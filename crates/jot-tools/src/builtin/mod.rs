// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Builtin tools.
//!
//! These are the in-repo providers for the capabilities the builtin agents
//! need.  External SaaS integrations implement the same traits behind the
//! same capabilities and are registered alongside (or instead of) these.

mod bridge;
mod context_save;
mod tabular;
mod workspace;

pub use bridge::BridgeTool;
pub use context_save::ContextSaveTool;
pub use tabular::{infer_columns, TabularFileTool};
pub use workspace::{
    Block, BlockKind, FileWorkspace, PageHit, PageRef, WorkspaceBackend, WorkspaceTool,
};
