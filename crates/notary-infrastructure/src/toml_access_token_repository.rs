//! TOML-based AccessTokenRepository implementation

use crate::paths::NotaryPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notary_core::access_token::{AccessToken, AccessTokenRepository};
use notary_core::error::{NotaryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: Vec<AccessToken>,
}

/// Keeps every issued token in a single `tokens.toml`.
///
/// Each mutation is a locked read-modify-write of the whole file, which
/// makes `mark_consumed` a compare-and-set even across processes.
#[derive(Clone)]
pub struct TomlAccessTokenRepository {
    file: Arc<AtomicTomlFile<TokenFile>>,
}

impl TomlAccessTokenRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(NotaryPaths::tokens_file(
                base_dir.as_ref(),
            ))),
        }
    }

    async fn update<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Vec<AccessToken>) -> R + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            file.update(TokenFile::default(), |data| Ok(f(&mut data.tokens)))
        })
        .await
        .map_err(|e| NotaryError::internal(format!("token storage task failed: {e}")))?
    }
}

#[async_trait]
impl AccessTokenRepository for TomlAccessTokenRepository {
    async fn insert(&self, token: AccessToken) -> Result<()> {
        self.update(move |tokens| {
            tokens.retain(|t| t.token != token.token);
            tokens.push(token);
        })
        .await
    }

    async fn find(&self, token: &str) -> Result<Option<AccessToken>> {
        let file = self.file.clone();
        let data = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| NotaryError::internal(format!("token storage task failed: {e}")))??;
        Ok(data.and_then(|d| d.tokens.into_iter().find(|t| t.token == token)))
    }

    async fn mark_consumed(&self, token: &str) -> Result<bool> {
        let token = token.to_string();
        self.update(move |tokens| match tokens.iter_mut().find(|t| t.token == token) {
            Some(t) if !t.consumed => {
                t.consumed = true;
                true
            }
            _ => false,
        })
        .await
    }

    async fn release(&self, token: &str) -> Result<()> {
        let token = token.to_string();
        self.update(move |tokens| {
            if let Some(t) = tokens.iter_mut().find(|t| t.token == token) {
                t.consumed = false;
            }
        })
        .await
    }

    async fn revoke_for_document(&self, document_id: &str) -> Result<usize> {
        let document_id = document_id.to_string();
        self.update(move |tokens| {
            let before = tokens.len();
            tokens.retain(|t| t.document_id != document_id);
            before - tokens.len()
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.update(move |tokens| {
            let before = tokens.len();
            tokens.retain(|t| !t.is_expired(now));
            before - tokens.len()
        })
        .await
    }
}
