// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Knowledge agent: answers questions grounded in the user's stored context.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use jot_reason::{ReasonRequest, Reasoner};
use jot_store::KnowledgeRetriever;

use crate::{
    agent::Agent,
    agents::reason_with_timeout,
    context::AgentContext,
    result::{AgentResult, ErrorKind, Payload},
};

const SYSTEM_PROMPT: &str = "You answer questions using only the provided stored \
context. When the context does not contain the answer, say so plainly instead of \
guessing.";

const RETRIEVAL_LIMIT: usize = 5;

/// Agent for the `knowledge_answer` kind.
pub struct KnowledgeAgent {
    reasoner: Arc<dyn Reasoner>,
    knowledge: Arc<dyn KnowledgeRetriever>,
    reason_timeout: Duration,
}

impl KnowledgeAgent {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        reason_timeout: Duration,
    ) -> Self {
        Self { reasoner, knowledge, reason_timeout }
    }
}

#[async_trait]
impl Agent for KnowledgeAgent {
    fn kind(&self) -> &str {
        "knowledge_answer"
    }

    async fn execute(&self, ctx: &AgentContext) -> AgentResult {
        let question = if !ctx.source_text().trim().is_empty() {
            ctx.source_text()
        } else {
            ctx.instruction()
        };
        if question.trim().is_empty() {
            return AgentResult::failed(ErrorKind::Internal, "no question provided");
        }

        let hits = match self.knowledge.retrieve(&ctx.user, question, RETRIEVAL_LIMIT).await {
            Ok(h) => h,
            Err(e) => {
                return AgentResult::failed(
                    ErrorKind::Internal,
                    format!("knowledge retrieval failed: {e}"),
                )
            }
        };
        debug!(hits = hits.len(), "retrieved context for question");

        let context_section = if hits.is_empty() {
            "(no stored context matched)".to_string()
        } else {
            hits.iter()
                .enumerate()
                .map(|(i, h)| format!("[{}] {}", i + 1, h.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Answer the question below using the stored context.\n\n\
             Stored context:\n{context_section}\n\nQuestion:\n{question}"
        );
        let req = ReasonRequest::new(prompt).with_system(SYSTEM_PROMPT);
        let outcome =
            match reason_with_timeout(self.reasoner.as_ref(), req, self.reason_timeout).await {
                Ok(o) => o,
                Err(error) => return AgentResult::failed_with(error),
            };

        let sources: Vec<String> = hits.iter().map(|h| h.context_id.to_string()).collect();
        let mut payload = Payload::new();
        payload.insert("answer".into(), json!(outcome.text));
        payload.insert("sources".into(), json!(sources));
        payload.insert("snippets_used".into(), json!(hits.len()));
        AgentResult::completed(payload)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use jot_store::{ContextStore, KeywordRetriever, MemoryContextStore, UserId};

    async fn retriever_with(user: &UserId, notes: &[&str]) -> Arc<KeywordRetriever> {
        let store = Arc::new(MemoryContextStore::new());
        for note in notes {
            store.persist(user, note, &[], None).await.unwrap();
        }
        Arc::new(KeywordRetriever::new(store))
    }

    #[tokio::test]
    async fn answers_with_retrieved_sources() {
        let user = UserId::new();
        let knowledge = retriever_with(&user, &["the deploy key lives in vault"]).await;
        let reasoner = Arc::new(jot_reason::ScriptedReasoner::new(vec!["In the vault."]));
        let agent = KnowledgeAgent::new(reasoner.clone(), knowledge, Duration::from_secs(5));

        let ctx = AgentContext::new(user).with_raw_text("where is the deploy key?");
        let result = agent.execute(&ctx).await;
        assert!(result.is_completed(), "{:?}", result.error);
        assert_eq!(result.payload["answer"], json!("In the vault."));
        assert_eq!(result.payload["snippets_used"], json!(1));

        // The retrieved snippet made it into the prompt.
        let last = reasoner.last_request.lock().unwrap();
        assert!(last.as_ref().unwrap().prompt.contains("vault"));
    }

    #[tokio::test]
    async fn empty_question_fails() {
        let user = UserId::new();
        let knowledge = retriever_with(&user, &[]).await;
        let agent = KnowledgeAgent::new(
            Arc::new(jot_reason::ScriptedReasoner::new(vec![])),
            knowledge,
            Duration::from_secs(5),
        );
        let result = agent.execute(&AgentContext::new(user)).await;
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn no_matching_context_still_answers() {
        let user = UserId::new();
        let knowledge = retriever_with(&user, &[]).await;
        let agent = KnowledgeAgent::new(
            Arc::new(jot_reason::ScriptedReasoner::new(vec!["I don't know."])),
            knowledge,
            Duration::from_secs(5),
        );
        let ctx = AgentContext::new(user).with_raw_text("anything stored?");
        let result = agent.execute(&ctx).await;
        assert!(result.is_completed());
        assert_eq!(result.payload["snippets_used"], json!(0));
    }
}
