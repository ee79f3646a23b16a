// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Read-only access to per-user integration credentials.
//!
//! ## File format
//!
//! The file-backed store reads a TOML file keyed by user id; each user table
//! maps an account name (e.g. `workspace`) to its stored secret:
//!
//! ```toml
//! [users."5f6e0d4c-0f3a-4d6a-9d8a-1e2f3a4b5c6d"]
//! workspace = "secret-token"
//! sheets    = "another-token"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::UserId;

/// Stored credentials for one user: account name → secret.
pub type Credentials = BTreeMap<String, String>;

/// Read-only credential lookup, one call per orchestration.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credentials for the given user.  A user with no stored credentials
    /// yields an empty map, not an error.
    async fn credentials_for(&self, user: &UserId) -> anyhow::Result<Credentials>;
}

#[derive(Debug, Default, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: HashMap<String, Credentials>,
}

/// TOML-file-backed credential store.
///
/// The file is re-read on every lookup so token updates written by the
/// integrations API become visible without a restart.  A missing file is
/// treated as "no credentials stored", a malformed file is a warning plus
/// empty credentials — credential trouble must degrade agents, not break
/// orchestration.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_file(path: &Path) -> CredentialFile {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(_) => return CredentialFile::default(),
        };
        match toml::from_str(&text) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed credentials file — ignoring");
                CredentialFile::default()
            }
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn credentials_for(&self, user: &UserId) -> anyhow::Result<Credentials> {
        let file = Self::read_file(&self.path);
        Ok(file.users.get(&user.to_string()).cloned().unwrap_or_default())
    }
}

/// In-memory credential store for tests and single-process setups.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<UserId, Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserId, account: &str, secret: &str) {
        self.users
            .lock()
            .unwrap()
            .entry(user)
            .or_default()
            .insert(account.to_string(), secret.to_string());
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn credentials_for(&self, user: &UserId) -> anyhow::Result<Credentials> {
        Ok(self.users.lock().unwrap().get(user).cloned().unwrap_or_default())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
