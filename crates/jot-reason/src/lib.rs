// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Reasoning backend abstraction.
//!
//! Agents perform decision-making through the [`Reasoner`] trait; the
//! concrete provider is opaque to them.  Driver construction is centralised
//! in [`from_config`], driver metadata in [`registry`].

mod mock;
mod openai_compat;
pub mod registry;
mod types;

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;

pub use mock::{MockReasoner, ScriptedReasoner};
pub use openai_compat::AuthStyle;
pub use types::{ReasonOutcome, ReasonRequest};

/// Stateless reasoning capability, injected per agent.
///
/// Implementations carry connection state only (HTTP client, endpoint);
/// no per-agent mutable state lives here, so a single instance is shared by
/// unlimited concurrent orchestrations.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Driver id for status display (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Run one reasoning call and return the structured outcome.
    async fn reason(&self, req: ReasonRequest) -> anyhow::Result<ReasonOutcome>;
}

/// Resolve the API key for a driver: explicit config key, then the
/// config-named env var, then the driver's canonical env var.
fn resolve_api_key(cfg: &jot_config::ReasonerConfig) -> Option<String> {
    if let Some(key) = &cfg.api_key {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }
    if let Some(var) = &cfg.api_key_env {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    registry::get_driver(&cfg.provider)
        .and_then(|d| d.default_api_key_env)
        .and_then(|var| std::env::var(var).ok())
        .filter(|k| !k.is_empty())
}

/// Construct a reasoner from configuration.
///
/// Fails when the provider id is unknown or a required API key cannot be
/// resolved — both are configuration errors that should surface at startup,
/// not at the first agent execution.
pub fn from_config(cfg: &jot_config::ReasonerConfig) -> anyhow::Result<Arc<dyn Reasoner>> {
    let Some(driver) = registry::get_driver(&cfg.provider) else {
        bail!(
            "unknown reasoner provider '{}' (run `jot list-providers`)",
            cfg.provider
        );
    };

    if driver.id == "mock" {
        return Ok(Arc::new(MockReasoner));
    }

    let api_key = resolve_api_key(cfg);
    if driver.requires_api_key && api_key.is_none() {
        bail!(
            "no API key for provider '{}': set reasoner.api_key_env or {}",
            driver.id,
            driver.default_api_key_env.unwrap_or("the provider env var")
        );
    }

    let base_url = match cfg.base_url.as_deref().or(driver.default_base_url) {
        Some(u) => u.to_string(),
        None => bail!("provider '{}' needs reasoner.base_url", driver.id),
    };

    let auth_style = if api_key.is_some() {
        AuthStyle::Bearer
    } else {
        AuthStyle::None
    };

    Ok(Arc::new(openai_compat::OpenAICompatReasoner::new(
        driver.id,
        cfg.name.clone(),
        api_key,
        &base_url,
        cfg.max_tokens,
        cfg.temperature,
        cfg.timeout_secs,
        auth_style,
    )))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_unknown_provider_fails() {
        let cfg = jot_config::ReasonerConfig {
            provider: "not-a-provider".into(),
            ..Default::default()
        };
        assert!(from_config(&cfg).is_err());
    }

    #[test]
    fn from_config_mock_needs_no_key() {
        let cfg = jot_config::ReasonerConfig {
            provider: "mock".into(),
            ..Default::default()
        };
        let reasoner = from_config(&cfg).unwrap();
        assert_eq!(reasoner.name(), "mock");
    }

    #[test]
    fn from_config_local_provider_needs_no_key() {
        let cfg = jot_config::ReasonerConfig {
            provider: "ollama".into(),
            name: "llama3.2".into(),
            ..Default::default()
        };
        let reasoner = from_config(&cfg).unwrap();
        assert_eq!(reasoner.name(), "ollama");
        assert_eq!(reasoner.model_name(), "llama3.2");
    }

    #[test]
    fn explicit_api_key_wins() {
        let cfg = jot_config::ReasonerConfig {
            provider: "openai".into(),
            api_key: Some("sk-explicit".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).as_deref(), Some("sk-explicit"));
    }
}
