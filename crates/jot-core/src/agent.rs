// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::{context::AgentContext, result::AgentResult};

/// The polymorphic unit of work: one concrete behavior per agent kind.
///
/// `execute` must not fail outward — any internal failure is caught and
/// translated into an `AgentResult` with `status: failed`, so the
/// orchestrator always receives a well-formed result.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The agent kind discriminator this implementation answers to.
    fn kind(&self) -> &str;

    async fn execute(&self, ctx: &AgentContext) -> AgentResult;
}
