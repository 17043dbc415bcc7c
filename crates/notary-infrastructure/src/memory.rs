//! In-memory storage adapters.
//!
//! Used when no `storage.data_dir` is configured, and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notary_core::access_token::{AccessToken, AccessTokenRepository};
use notary_core::collaborators::{BlobMetadata, BlobRef, BlobStore};
use notary_core::error::{NotaryError, Result};
use notary_core::session::{SessionRecord, SessionRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn find_session_id_by_document(&self, document_id: &str) -> Result<Option<String>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .find(|r| r.documents.contains_key(document_id))
            .map(|r| r.id().to_string()))
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(record.id().to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccessTokenRepository {
    tokens: RwLock<HashMap<String, AccessToken>>,
}

impl InMemoryAccessTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessTokenRepository for InMemoryAccessTokenRepository {
    async fn insert(&self, token: AccessToken) -> Result<()> {
        self.tokens
            .write()
            .await
            .insert(token.token.clone(), token);
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<AccessToken>> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn mark_consumed(&self, token: &str) -> Result<bool> {
        let mut tokens = self.tokens.write().await;
        Ok(match tokens.get_mut(token) {
            Some(t) if !t.consumed => {
                t.consumed = true;
                true
            }
            _ => false,
        })
    }

    async fn release(&self, token: &str) -> Result<()> {
        if let Some(t) = self.tokens.write().await.get_mut(token) {
            t.consumed = false;
        }
        Ok(())
    }

    async fn revoke_for_document(&self, document_id: &str) -> Result<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.document_id != document_id);
        Ok(before - tokens.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired(now));
        Ok(before - tokens.len())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobRef, (BlobMetadata, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn metadata(&self, reference: &BlobRef) -> Option<BlobMetadata> {
        self.blobs
            .read()
            .await
            .get(reference)
            .map(|(metadata, _)| metadata.clone())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(&self, bytes: Vec<u8>, metadata: BlobMetadata) -> Result<BlobRef> {
        let reference = BlobRef::new(format!("mem://{}", uuid::Uuid::new_v4()));
        tracing::trace!(%reference, size = bytes.len(), content_type = %metadata.content_type, "Blob stored");
        self.blobs
            .write()
            .await
            .insert(reference.clone(), (metadata, bytes));
        Ok(reference)
    }

    async fn retrieve(&self, reference: &BlobRef) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(reference)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| NotaryError::not_found("blob", reference.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use notary_core::SignerRole;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_consume_has_single_winner() {
        let repo = Arc::new(InMemoryAccessTokenRepository::new());
        let now = Utc::now();
        repo.insert(AccessToken {
            token: "t1".into(),
            document_id: "d-1".into(),
            granted_role: SignerRole::Client,
            issued_at: now,
            expires_at: now + Duration::seconds(600),
            consumed: false,
        })
        .await
        .unwrap();

        let attempts = (0..16).map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.mark_consumed("t1").await.unwrap() })
        });
        let mut winners = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            if attempt.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_blob_round_trip_keeps_metadata() {
        let store = InMemoryBlobStore::new();
        let reference = store
            .store(b"sig".to_vec(), BlobMetadata::new("image/png"))
            .await
            .unwrap();

        assert_eq!(store.retrieve(&reference).await.unwrap(), b"sig".to_vec());
        assert_eq!(
            store.metadata(&reference).await.unwrap().content_type,
            "image/png"
        );
        assert!(store
            .retrieve(&BlobRef::new("mem://missing"))
            .await
            .unwrap_err()
            .is_not_found());
    }
}
