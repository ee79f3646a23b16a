// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Builtin agent implementations and their shared helpers.

mod extraction;
mod knowledge;
mod notes;

pub use extraction::TableExtractionAgent;
pub use knowledge::KnowledgeAgent;
pub use notes::NoteAgent;

use std::time::Duration;

use serde_json::{Map, Value};

use jot_reason::{ReasonOutcome, ReasonRequest, Reasoner};

use crate::result::{ErrorDescriptor, ErrorKind};

/// Run one reasoning call under the configured timeout, mapping failures to
/// result-level error descriptors.  A hung provider surfaces as a timeout
/// failure instead of blocking the orchestration.
pub(crate) async fn reason_with_timeout(
    reasoner: &dyn Reasoner,
    req: ReasonRequest,
    timeout: Duration,
) -> Result<ReasonOutcome, ErrorDescriptor> {
    match tokio::time::timeout(timeout, reasoner.reason(req)).await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(ErrorDescriptor::new(ErrorKind::Reasoner, e.to_string())),
        Err(_) => Err(ErrorDescriptor::new(
            ErrorKind::Timeout,
            format!("reasoning call exceeded {}s", timeout.as_secs()),
        )),
    }
}

/// Extract the first JSON array of objects from model text.
///
/// Models wrap answers in prose or code fences; scanning from the first `[`
/// to the last `]` recovers the payload without a strict-parse round trip.
pub(crate) fn parse_json_array(text: &str) -> Vec<Map<String, Value>> {
    let Some(start) = text.find('[') else { return vec![] };
    let Some(end) = text.rfind(']') else { return vec![] };
    if end <= start {
        return vec![];
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

/// Extract the first JSON object from model text.
pub(crate) fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Truncate a preview to at most `max` characters on a char boundary.
pub(crate) fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}…")
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
