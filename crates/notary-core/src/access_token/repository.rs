//! Access token repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::AccessToken;
use crate::error::Result;

/// Persistence for access tokens.
///
/// `mark_consumed` is the authoritative single-use gate: it must flip the
/// flag as one compare-and-set so that two concurrent consumers cannot both
/// succeed.
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    async fn insert(&self, token: AccessToken) -> Result<()>;

    async fn find(&self, token: &str) -> Result<Option<AccessToken>>;

    /// Sets `consumed = true`. Returns `false` when it already was, or when
    /// the token does not exist.
    async fn mark_consumed(&self, token: &str) -> Result<bool>;

    /// Reverts a consumption whose surrounding commit failed.
    async fn release(&self, token: &str) -> Result<()>;

    /// Removes every token scoped to the document. Returns how many.
    async fn revoke_for_document(&self, document_id: &str) -> Result<usize>;

    /// Removes every token with `expires_at <= now`. Returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
