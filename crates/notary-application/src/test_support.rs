//! Mock repositories and collaborators for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notary_core::access_token::{AccessToken, AccessTokenRepository};
use notary_core::collaborators::{
    BlobMetadata, BlobRef, BlobStore, IdentityCheck, IdentityClaim, IdentityVerifier,
    NotificationChannel, NotificationRelay, NotificationTemplate,
};
use notary_core::error::{NotaryError, Result};
use notary_core::session::{SessionRecord, SessionRepository};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    fail_writes: AtomicBool,
}

impl InMemorySessions {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(session_id).cloned())
    }

    async fn find_session_id_by_document(&self, document_id: &str) -> Result<Option<String>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .values()
            .find(|r| r.documents.contains_key(document_id))
            .map(|r| r.id().to_string()))
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NotaryError::data_access("disk full"));
        }
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(record.id().to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SessionRecord>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryTokens {
    tokens: Mutex<HashMap<String, AccessToken>>,
}

#[async_trait]
impl AccessTokenRepository for InMemoryTokens {
    async fn insert(&self, token: AccessToken) -> Result<()> {
        self.tokens.lock().unwrap().insert(token.token.clone(), token);
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<AccessToken>> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn mark_consumed(&self, token: &str) -> Result<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(token) {
            Some(t) if !t.consumed => {
                t.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, token: &str) -> Result<()> {
        if let Some(t) = self.tokens.lock().unwrap().get_mut(token) {
            t.consumed = false;
        }
        Ok(())
    }

    async fn revoke_for_document(&self, document_id: &str) -> Result<usize> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| t.document_id != document_id);
        Ok(before - tokens.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired(now));
        Ok(before - tokens.len())
    }
}

#[derive(Default)]
pub struct InMemoryBlobs {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for InMemoryBlobs {
    async fn store(&self, bytes: Vec<u8>, _metadata: BlobMetadata) -> Result<BlobRef> {
        let mut blobs = self.blobs.lock().unwrap();
        let reference = format!("blob-{}", blobs.len() + 1);
        blobs.insert(reference.clone(), bytes);
        Ok(BlobRef::new(reference))
    }

    async fn retrieve(&self, reference: &BlobRef) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| NotaryError::not_found("blob", reference.as_str()))
    }
}

/// Forwards every delivery to a channel; optionally fails after forwarding.
pub struct ChannelRelay {
    sender: mpsc::UnboundedSender<(NotificationChannel, String, NotificationTemplate)>,
    fail: bool,
}

impl ChannelRelay {
    pub fn new(
        fail: bool,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<(NotificationChannel, String, NotificationTemplate)>,
    ) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, fail }, receiver)
    }
}

#[async_trait]
impl NotificationRelay for ChannelRelay {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        template: NotificationTemplate,
    ) -> Result<()> {
        let _ = self.sender.send((channel, recipient.to_string(), template));
        if self.fail {
            return Err(NotaryError::NotificationRelay("smtp unreachable".into()));
        }
        Ok(())
    }
}

/// Verifies exactly the names it was built with.
pub struct NamesVerifier(pub Vec<String>);

#[async_trait]
impl IdentityVerifier for NamesVerifier {
    async fn verify_identity(&self, claim: &IdentityClaim) -> Result<IdentityCheck> {
        let verified = self.0.iter().any(|n| n == &claim.name);
        Ok(IdentityCheck {
            verified,
            score: if verified { 0.97 } else { 0.12 },
        })
    }
}
