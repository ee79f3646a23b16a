// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Best-effort observability.
//!
//! Core logic never learns whether a sink is attached, disabled, or broken:
//! every record call goes through the [`Observer`] adapter, which swallows
//! sink errors.  A failing sink is indistinguishable from a no-op.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, trace};

use crate::result::ExecStatus;

/// Events emitted by the spawner and orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ObsEvent {
    /// Capability resolution finished for one spawn: which provider was
    /// picked per capability, what was substituted, what stayed unresolved.
    SpawnResolved {
        task_type: String,
        agent_kind: String,
        picks: BTreeMap<String, String>,
        substituted: Vec<String>,
        unresolved: Vec<String>,
    },
    AgentStarted {
        task_type: String,
        agent_kind: String,
    },
    AgentFinished {
        task_type: String,
        agent_kind: String,
        status: ExecStatus,
    },
    OrchestrationFinished {
        task_type: String,
        status: ExecStatus,
        agents: usize,
    },
}

/// Sink for observability events.  `record` must not block the caller for
/// long; failures are tolerated and swallowed by [`Observer`].
pub trait ObservabilitySink: Send + Sync {
    fn record(&self, event: &ObsEvent) -> anyhow::Result<()>;
}

/// Default sink: structured tracing events.
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, event: &ObsEvent) -> anyhow::Result<()> {
        let json = serde_json::to_string(event)?;
        info!(target: "jot::observe", %json, "orchestration event");
        Ok(())
    }
}

/// Result-swallowing adapter around an optional sink.
#[derive(Clone, Default)]
pub struct Observer {
    sink: Option<Arc<dyn ObservabilitySink>>,
}

impl Observer {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// An observer with no sink; every record is a no-op.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Record an event.  Never raises into the caller.
    pub fn record(&self, event: ObsEvent) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(&event) {
                trace!(error = %e, "observability sink failed — ignoring");
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    impl ObservabilitySink for CountingSink {
        fn record(&self, _event: &ObsEvent) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl ObservabilitySink for FailingSink {
        fn record(&self, _event: &ObsEvent) -> anyhow::Result<()> {
            anyhow::bail!("sink is down")
        }
    }

    fn event() -> ObsEvent {
        ObsEvent::OrchestrationFinished {
            task_type: "note_taking".into(),
            status: ExecStatus::Completed,
            agents: 1,
        }
    }

    #[test]
    fn disabled_observer_is_a_noop() {
        Observer::disabled().record(event());
    }

    #[test]
    fn observer_forwards_to_sink() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let observer = Observer::new(sink.clone());
        observer.record(event());
        observer.record(event());
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_sink_never_raises() {
        let observer = Observer::new(Arc::new(FailingSink));
        observer.record(event());
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&event()).unwrap();
        assert!(json.contains("\"event\":\"orchestration_finished\""));
    }
}
