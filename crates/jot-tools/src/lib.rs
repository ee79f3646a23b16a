// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tool layer: capability registry, tool integration, and builtin tools.
//!
//! A capability (e.g. `tabular_write`) names an ability; a [`Tool`] provides
//! one or more capabilities and is executed by name with JSON arguments.
//! The [`ToolRegistry`] indexes providers per capability, ranked so that
//! credential-specific integrations come before the generic bridge; the
//! spawner picks the first candidate the user's credentials allow.

pub mod builtin;
mod integration;
mod registry;
mod tool;

pub use integration::{ToolError, ToolIntegration};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{Tool, ToolCall, ToolOutput};
