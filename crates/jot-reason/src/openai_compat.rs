// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! OpenAI-compatible chat completion driver.
//!
//! Every hosted and local provider in the registry speaks the same
//! `/chat/completions` wire format; this single implementation is configured
//! with each driver's defaults (URL, auth style) by `from_config`.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::{ReasonOutcome, ReasonRequest, Reasoner};

/// How to send the API key in HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` — standard for hosted providers.
    Bearer,
    /// No authentication header — local servers (Ollama, vLLM).
    None,
}

pub(crate) struct OpenAICompatReasoner {
    driver_name: &'static str,
    model: String,
    api_key: Option<String>,
    /// Full chat completions URL, e.g. `https://api.groq.com/openai/v1/chat/completions`.
    chat_url: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
    auth_style: AuthStyle,
}

impl OpenAICompatReasoner {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        driver_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: &str,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_secs: u64,
        auth_style: AuthStyle,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        // The request-level timeout is the outermost guard: a hung provider
        // resolves to an error here, never an unresolved future.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        Self {
            driver_name,
            model,
            api_key,
            chat_url: format!("{base}/chat/completions"),
            max_tokens: max_tokens.unwrap_or(4096),
            temperature: temperature.unwrap_or(0.2),
            client,
            auth_style,
        }
    }
}

#[async_trait]
impl Reasoner for OpenAICompatReasoner {
    fn name(&self) -> &str {
        self.driver_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn reason(&self, req: ReasonRequest) -> anyhow::Result<ReasonOutcome> {
        let mut messages: Vec<Value> = Vec::with_capacity(2);
        if let Some(system) = &req.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": req.full_prompt() }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": req.max_tokens.unwrap_or(self.max_tokens),
            "temperature": self.temperature,
        });

        debug!(driver = self.driver_name, model = %self.model, "reasoning request");

        let mut http = self.client.post(&self.chat_url).json(&body);
        if let (AuthStyle::Bearer, Some(key)) = (&self.auth_style, &self.api_key) {
            http = http.bearer_auth(key);
        }

        let resp = http
            .send()
            .await
            .with_context(|| format!("reasoner request to {}", self.chat_url))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("reasoner HTTP {status}: {text}");
        }

        let payload: Value = resp.json().await.context("parsing reasoner response")?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            bail!("reasoner returned an empty completion");
        }

        Ok(ReasonOutcome {
            text,
            input_tokens: payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }
}
