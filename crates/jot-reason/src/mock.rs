// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;

use crate::{ReasonOutcome, ReasonRequest, Reasoner};

/// Deterministic mock reasoner for tests.  Echoes the prompt back.
#[derive(Default)]
pub struct MockReasoner;

#[async_trait]
impl Reasoner for MockReasoner {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn reason(&self, req: ReasonRequest) -> anyhow::Result<ReasonOutcome> {
        Ok(ReasonOutcome {
            text: format!("MOCK: {}", req.prompt),
            input_tokens: 10,
            output_tokens: 10,
        })
    }
}

/// A pre-scripted mock reasoner.  Each call pops the next response from the
/// front of the queue, so tests specify exact answer sequences without
/// network access.
pub struct ScriptedReasoner {
    scripts: Mutex<Vec<String>>,
    /// When set, every call fails with this message regardless of the queue.
    failure: Option<String>,
    calls: AtomicUsize,
    /// The last `ReasonRequest` seen, so tests can inspect what was sent.
    pub last_request: Arc<Mutex<Option<ReasonRequest>>>,
}

impl ScriptedReasoner {
    /// Build a reasoner that answers with the given texts, in order.
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            scripts: Mutex::new(responses.into_iter().map(str::to_string).collect()),
            failure: None,
            calls: AtomicUsize::new(0),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Build a reasoner whose every call fails with the given message.
    pub fn always_failing(message: &str) -> Self {
        Self {
            scripts: Mutex::new(vec![]),
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Number of `reason` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn reason(&self, req: ReasonRequest) -> anyhow::Result<ReasonOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(req);

        if let Some(msg) = &self.failure {
            anyhow::bail!("{msg}");
        }

        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            anyhow::bail!("scripted reasoner exhausted");
        }
        Ok(ReasonOutcome {
            text: scripts.remove(0),
            input_tokens: 1,
            output_tokens: 1,
        })
    }
}
