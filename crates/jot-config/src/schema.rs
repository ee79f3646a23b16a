// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `bool::default()`
/// (i.e. `false`), so fields that should be on unless explicitly disabled
/// need a named function.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reasoner: ReasonerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Configuration for the reasoning backend.
///
/// The reasoner is an opaque provider behind a stable interface; this block
/// selects the driver and its connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Driver identifier.  Run `jot list-providers` for the full list.
    /// Common values: "openai" | "groq" | "ollama" | "mock"
    pub provider: String,
    /// Model name forwarded to the provider API
    pub name: String,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files
    pub api_key: Option<String>,
    /// Base URL override.  Useful for local proxies or gateways.
    /// For hosted providers the correct default is auto-selected.
    pub base_url: Option<String>,
    /// Maximum tokens to request in a single reasoning call
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0–2.0)
    pub temperature: Option<f32>,
    /// Hard timeout for a single reasoning call, in seconds.  A hung
    /// provider call surfaces as a timeout failure inside the agent result
    /// instead of blocking the orchestration.
    #[serde(default = "default_reason_timeout")]
    pub timeout_secs: u64,
}

fn default_reason_timeout() -> u64 {
    120
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            name: "gpt-4o".into(),
            // api_key_env is intentionally None here.  resolve_api_key()
            // falls through to the driver registry, which knows the canonical
            // env-var name for each provider.
            api_key_env: None,
            api_key: None,
            base_url: None,
            max_tokens: Some(4096),
            temperature: Some(0.2),
            timeout_secs: default_reason_timeout(),
        }
    }
}

/// Where the agent type registry is loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to a YAML registry file.  When unset, the built-in registry
    /// embedded in the binary is used.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Hard timeout for a single tool execution, in seconds.
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// Local directories for produced artifacts and the file-backed workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where agents write file artifacts (tables, degraded notes).
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// Root of the file-backed workspace (pages as markdown files).
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".jot/artifacts")
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from(".jot/workspace")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            workspace_dir: default_workspace_dir(),
        }
    }
}

/// Where per-user integration credentials are read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Path to a TOML credentials file.  When unset, no stored credentials
    /// are available and account-requiring tools fall back to the bridge.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Emit orchestration events through the tracing sink.  Disabling this
    /// is indistinguishable from a failing sink: a no-op.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Expand `~` and environment variables in all configured paths.
    pub fn expand_paths(&mut self) {
        let expand = |p: &PathBuf| -> PathBuf {
            let s = p.to_string_lossy();
            PathBuf::from(shellexpand::tilde(s.as_ref()).into_owned())
        };
        self.storage.artifact_dir = expand(&self.storage.artifact_dir);
        self.storage.workspace_dir = expand(&self.storage.workspace_dir);
        if let Some(p) = &self.registry.path {
            self.registry.path = Some(expand(p));
        }
        if let Some(p) = &self.credentials.path {
            self.credentials.path = Some(expand(p));
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_complete() {
        let cfg = Config::default();
        assert_eq!(cfg.reasoner.provider, "openai");
        assert_eq!(cfg.reasoner.timeout_secs, 120);
        assert_eq!(cfg.tools.timeout_secs, 60);
        assert!(cfg.observability.enabled);
        assert!(cfg.registry.path.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"[reasoner]
provider = "groq"
name = "llama-3.3-70b""#,
        )
        .unwrap();
        assert_eq!(cfg.reasoner.provider, "groq");
        assert_eq!(cfg.reasoner.timeout_secs, 120);
        assert_eq!(cfg.storage.artifact_dir, PathBuf::from(".jot/artifacts"));
    }

    #[test]
    fn observability_can_be_disabled() {
        let cfg: Config = toml::from_str(
            r#"[observability]
enabled = false"#,
        )
        .unwrap();
        assert!(!cfg.observability.enabled);
    }

    #[test]
    fn expand_paths_resolves_tilde() {
        let mut cfg = Config::default();
        cfg.storage.artifact_dir = PathBuf::from("~/artifacts");
        cfg.expand_paths();
        assert!(!cfg.storage.artifact_dir.to_string_lossy().starts_with('~'));
    }
}
