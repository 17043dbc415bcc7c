//! Minting and validation of out-of-band access tokens.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use notary_core::access_token::{AccessToken, AccessTokenRepository, TokenGrant, TokenRejection};
use notary_core::clock::Clock;
use notary_core::collaborators::{BlobStore, NotificationTemplate};
use notary_core::config::{NotificationConfig, TokenConfig};
use notary_core::document::{Document, DocumentStatus};
use notary_core::error::{NotaryError, Result};
use notary_core::event::NotaryEvent;
use notary_core::SignerRole;
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;

use crate::events::EventBus;
use crate::notifier::NotificationDispatcher;
use crate::session::SessionStore;

const TOKEN_BYTES: usize = 32;

/// A document opened through an access link.
#[derive(Debug, Clone)]
pub struct OpenedDocument {
    pub grant: TokenGrant,
    pub document: Document,
    pub content: Vec<u8>,
}

pub struct AccessTokenIssuer {
    store: Arc<SessionStore>,
    tokens: Arc<dyn AccessTokenRepository>,
    blobs: Arc<dyn BlobStore>,
    events: EventBus,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    config: TokenConfig,
    notifications: NotificationConfig,
}

impl AccessTokenIssuer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<SessionStore>,
        tokens: Arc<dyn AccessTokenRepository>,
        blobs: Arc<dyn BlobStore>,
        events: EventBus,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        config: TokenConfig,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            blobs,
            events,
            notifier,
            clock,
            config,
            notifications,
        }
    }

    /// Mints a token granting `granted_role` on one document.
    ///
    /// The token is stored while the session lock is held, so it cannot slip
    /// past a concurrent cancellation's revocation.
    ///
    /// # Arguments
    ///
    /// * `ttl_seconds` - Lifetime; `None` uses the configured default
    ///
    /// # Errors
    ///
    /// - `InvalidDocument` if the owning session is terminal, the document was
    ///   cancelled, or `granted_role` is not a required signer
    /// - `Config` for a zero TTL
    pub async fn issue_token(
        &self,
        document_id: &str,
        granted_role: SignerRole,
        ttl_seconds: Option<u64>,
    ) -> Result<AccessToken> {
        let ttl_seconds = ttl_seconds.unwrap_or(self.config.default_ttl_seconds);
        if ttl_seconds == 0 {
            return Err(NotaryError::config("token ttl must be positive"));
        }
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| NotaryError::config(format!("token ttl {ttl_seconds}s is out of range")))?;

        let (session_id, handle) = self.store.handle_for_document(document_id).await?;
        let record = handle.lock().await;

        let phase = record.session.phase;
        if phase.is_terminal() {
            return Err(NotaryError::InvalidDocument(format!(
                "session {session_id} is {phase}"
            )));
        }
        let document = record
            .document(document_id)
            .ok_or_else(|| NotaryError::not_found("document", document_id))?;
        if document.status == DocumentStatus::Cancelled {
            return Err(NotaryError::InvalidDocument(format!(
                "document {document_id} is cancelled"
            )));
        }
        if !document.requires(granted_role) {
            return Err(NotaryError::InvalidDocument(format!(
                "{granted_role} is not a required signer of {document_id}"
            )));
        }

        let now = self.clock.now();
        let token = AccessToken {
            token: generate_token(),
            document_id: document_id.to_string(),
            granted_role,
            issued_at: now,
            expires_at: now + ttl,
            consumed: false,
        };
        self.tokens.insert(token.clone()).await?;
        drop(record);

        tracing::info!(
            session_id = %session_id,
            document_id,
            role = %granted_role,
            expires_at = %token.expires_at,
            "Access token issued"
        );
        self.events.publish(NotaryEvent::TokenIssued {
            document_id: document_id.to_string(),
            role: granted_role,
            expires_at: token.expires_at,
        });
        Ok(token)
    }

    /// Checks expiry and consumption. Never mutates the token; consumption
    /// only happens when a signature is accepted.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for any invalid token; the reason is only logged.
    pub async fn validate_token(&self, token: &str) -> Result<TokenGrant> {
        let checked = match self.tokens.find(token).await? {
            None => Err(TokenRejection::Unknown),
            Some(found) => found.check(self.clock.now(), self.config.single_use),
        };
        checked.map_err(|reason| {
            tracing::warn!(%reason, "Access token rejected");
            NotaryError::Unauthorized
        })
    }

    /// Issues a token and relays the access link to the participant holding
    /// `granted_role`. Delivery is fire-and-forget.
    pub async fn issue_and_deliver(
        &self,
        document_id: &str,
        granted_role: SignerRole,
        ttl_seconds: Option<u64>,
    ) -> Result<AccessToken> {
        let token = self
            .issue_token(document_id, granted_role, ttl_seconds)
            .await?;

        let (session_id, _) = self.store.handle_for_document(document_id).await?;
        let record = self.store.snapshot(&session_id).await?;
        let title = record
            .document(document_id)
            .map(|d| d.title.clone())
            .unwrap_or_default();

        match record.session.participant(granted_role) {
            Some(participant) => {
                let template = NotificationTemplate::new("document_access_link")
                    .with("participant", &participant.name)
                    .with("document_id", document_id)
                    .with("document_title", title)
                    .with("link", self.notifications.access_link(&token.token))
                    .with("expires_at", token.expires_at.to_rfc3339());
                self.notifier.notify_participant(participant, template);
            }
            None => {
                tracing::debug!(
                    session_id = %session_id,
                    role = %granted_role,
                    "No participant to deliver access link to"
                );
            }
        }

        Ok(token)
    }

    /// Validates a token and loads the document it grants together with its body.
    pub async fn open_with_token(&self, token: &str) -> Result<OpenedDocument> {
        let grant = self.validate_token(token).await?;
        let (_, handle) = self.store.handle_for_document(&grant.document_id).await?;
        let document = {
            let record = handle.lock().await;
            record
                .document(&grant.document_id)
                .cloned()
                .ok_or_else(|| NotaryError::not_found("document", grant.document_id.as_str()))?
        };
        let content = self.blobs.retrieve(&document.content_ref).await?;
        Ok(OpenedDocument {
            grant,
            document,
            content,
        })
    }

    pub async fn revoke_for_document(&self, document_id: &str) -> Result<usize> {
        let count = self.tokens.revoke_for_document(document_id).await?;
        tracing::info!(document_id, count, "Access tokens revoked");
        Ok(count)
    }

    /// Drops every token whose expiry has passed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let count = self.tokens.purge_expired(self.clock.now()).await?;
        if count > 0 {
            tracing::debug!(count, "Purged expired access tokens");
        }
        Ok(count)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ChannelRelay, InMemoryBlobs, InMemorySessions, InMemoryTokens};
    use chrono::Utc;
    use notary_core::clock::ManualClock;
    use notary_core::collaborators::{BlobMetadata, NotificationChannel};
    use notary_core::session::{
        ContactInfo, Participant, ParticipantIdentity, Session, SessionPhase, SessionRecord,
    };
    use std::collections::BTreeSet;

    struct Fixture {
        issuer: AccessTokenIssuer,
        store: Arc<SessionStore>,
        clock: Arc<ManualClock>,
    }

    async fn fixture(phase: SessionPhase, notifier: NotificationDispatcher) -> Fixture {
        let store = Arc::new(SessionStore::new(Arc::new(InMemorySessions::default())));
        let blobs = Arc::new(InMemoryBlobs::default());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let now = clock.now();

        let content_ref = blobs
            .store(b"%PDF-1.7".to_vec(), BlobMetadata::new("application/pdf"))
            .await
            .unwrap();

        let mut session = Session::new("s-1".into(), ParticipantIdentity::new("Notary Public"), now);
        session.phase = phase;
        session.participants.push(Participant::new(
            SignerRole::Client,
            ParticipantIdentity::new("Ana Pérez")
                .with_contact(ContactInfo::email("ana@example.com")),
        ));
        let mut record = SessionRecord::new(session);
        let mut document = Document::new(
            "d-1".into(),
            "s-1".into(),
            "Deed".into(),
            BTreeSet::from([SignerRole::Client]),
            content_ref,
            now,
        );
        document.status = DocumentStatus::Preview;
        record.attach_document(document, now);
        store.insert(record).await.unwrap();

        let issuer = AccessTokenIssuer::new(
            store.clone(),
            Arc::new(InMemoryTokens::default()),
            blobs,
            EventBus::default(),
            notifier,
            clock.clone(),
            TokenConfig::default(),
            NotificationConfig::default(),
        );
        Fixture {
            issuer,
            store,
            clock,
        }
    }

    #[tokio::test]
    async fn test_tokens_are_unguessable_and_url_safe() {
        let fx = fixture(SessionPhase::Signing, NotificationDispatcher::disabled()).await;
        let a = fx.issuer.issue_token("d-1", SignerRole::Client, None).await.unwrap();
        let b = fx.issuer.issue_token("d-1", SignerRole::Client, None).await.unwrap();

        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 43);
        assert!(a.token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(a.expires_at - a.issued_at, Duration::seconds(600));
    }

    #[tokio::test]
    async fn test_validate_does_not_consume_and_honours_expiry() {
        let fx = fixture(SessionPhase::Signing, NotificationDispatcher::disabled()).await;
        let token = fx.issuer.issue_token("d-1", SignerRole::Client, Some(60)).await.unwrap();

        for _ in 0..2 {
            let grant = fx.issuer.validate_token(&token.token).await.unwrap();
            assert_eq!(grant.document_id, "d-1");
            assert_eq!(grant.granted_role, SignerRole::Client);
        }

        fx.clock.advance(Duration::seconds(60));
        assert_eq!(
            fx.issuer.validate_token(&token.token).await.unwrap_err(),
            NotaryError::Unauthorized
        );
        assert_eq!(fx.issuer.purge_expired().await.unwrap(), 1);
        assert_eq!(
            fx.issuer.validate_token(&token.token).await.unwrap_err(),
            NotaryError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_issue_rejected_for_terminal_session() {
        for phase in [SessionPhase::Completed, SessionPhase::Cancelled] {
            let fx = fixture(phase, NotificationDispatcher::disabled()).await;
            let err = fx
                .issuer
                .issue_token("d-1", SignerRole::Client, None)
                .await
                .unwrap_err();
            assert!(matches!(err, NotaryError::InvalidDocument(_)), "{phase}");
        }
    }

    #[tokio::test]
    async fn test_issue_rejects_zero_ttl_and_unrequired_role() {
        let fx = fixture(SessionPhase::Signing, NotificationDispatcher::disabled()).await;
        assert!(matches!(
            fx.issuer.issue_token("d-1", SignerRole::Client, Some(0)).await,
            Err(NotaryError::Config(_))
        ));
        assert!(matches!(
            fx.issuer.issue_token("d-1", SignerRole::Certifier, None).await,
            Err(NotaryError::InvalidDocument(_))
        ));
        assert!(fx
            .issuer
            .issue_token("missing", SignerRole::Client, None)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_issue_and_deliver_sends_access_link() {
        let (relay, mut deliveries) = ChannelRelay::new(false);
        let notifier = NotificationDispatcher::new(Some(Arc::new(relay)), true);
        let fx = fixture(SessionPhase::Signing, notifier).await;

        let token = fx
            .issuer
            .issue_and_deliver("d-1", SignerRole::Client, None)
            .await
            .unwrap();

        let (channel, recipient, template) = deliveries.recv().await.unwrap();
        assert_eq!(channel, NotificationChannel::Email);
        assert_eq!(recipient, "ana@example.com");
        assert_eq!(template.name, "document_access_link");
        assert_eq!(
            template.data.get("link").map(String::as_str),
            Some(format!("https://notary.local/sign?token={}", token.token).as_str())
        );
    }

    #[tokio::test]
    async fn test_open_with_token_returns_body() {
        let fx = fixture(SessionPhase::Signing, NotificationDispatcher::disabled()).await;
        let token = fx.issuer.issue_token("d-1", SignerRole::Client, None).await.unwrap();

        let opened = fx.issuer.open_with_token(&token.token).await.unwrap();
        assert_eq!(opened.document.id, "d-1");
        assert_eq!(opened.content, b"%PDF-1.7".to_vec());
        assert_eq!(fx.store.snapshot("s-1").await.unwrap().documents.len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_for_document() {
        let fx = fixture(SessionPhase::Signing, NotificationDispatcher::disabled()).await;
        let token = fx.issuer.issue_token("d-1", SignerRole::Client, None).await.unwrap();

        assert_eq!(fx.issuer.revoke_for_document("d-1").await.unwrap(), 1);
        assert!(fx.issuer.validate_token(&token.token).await.is_err());
    }
}
