#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use notary_application::{DocumentContent, NotaryDependencies, NotaryServices};
use notary_core::clock::ManualClock;
use notary_core::collaborators::{NotificationChannel, NotificationRelay, NotificationTemplate};
use notary_core::config::RootConfig;
use notary_core::document::Document;
use notary_core::error::{NotaryError, Result};
use notary_core::session::{ContactInfo, ParticipantIdentity, Session, SessionPhase};
use notary_core::SignerRole;
use notary_infrastructure::{
    InMemoryAccessTokenRepository, InMemoryBlobStore, InMemorySessionRepository,
    LoggingNotificationRelay, StaticIdentityVerifier,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Harness {
    pub notary: Arc<NotaryServices>,
    pub clock: Arc<ManualClock>,
    pub relay: Arc<LoggingNotificationRelay>,
}

pub fn harness(config: RootConfig) -> Harness {
    let relay = Arc::new(LoggingNotificationRelay::new());
    harness_with_relay(config, relay.clone(), relay)
}

pub fn harness_with_relay(
    config: RootConfig,
    relay: Arc<dyn NotificationRelay>,
    log: Arc<LoggingNotificationRelay>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let deps = NotaryDependencies::new(
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(InMemoryAccessTokenRepository::new()),
        Arc::new(InMemoryBlobStore::new()),
    )
    .with_relay(relay)
    .with_identity_verifier(Arc::new(
        StaticIdentityVerifier::default().with_score("Ana Pérez", 0.95),
    ))
    .with_clock(clock.clone());

    Harness {
        notary: Arc::new(NotaryServices::new(&config, deps)),
        clock,
        relay: log,
    }
}

pub fn ana() -> ParticipantIdentity {
    ParticipantIdentity::new("Ana Pérez").with_contact(ContactInfo::email("ana@example.com"))
}

/// A session with a client, already in `document_review`.
pub async fn session_in_review(notary: &NotaryServices) -> Session {
    let session = notary
        .sessions
        .create_session(
            ParticipantIdentity::new("Notary Public")
                .with_contact(ContactInfo::email("notary@example.com")),
        )
        .await
        .unwrap();
    notary
        .sessions
        .add_participant(&session.id, SignerRole::Client, ana())
        .await
        .unwrap();
    for phase in [SessionPhase::IdentityVerification, SessionPhase::DocumentReview] {
        notary
            .sessions
            .transition_phase(&session.id, phase)
            .await
            .unwrap();
    }
    notary.sessions.get_status(&session.id).await.unwrap()
}

/// A document in `preview` requiring `signers`.
pub async fn previewed_document(
    notary: &NotaryServices,
    session_id: &str,
    signers: &[SignerRole],
) -> Document {
    let document = notary
        .documents
        .create_document(
            session_id,
            signers.iter().copied().collect::<BTreeSet<_>>(),
            DocumentContent::pdf("Power of attorney", b"%PDF-1.7".to_vec()),
        )
        .await
        .unwrap();
    notary.documents.advance_to_preview(&document.id).await.unwrap()
}

/// Records every delivery attempt and then fails it.
#[derive(Default)]
pub struct FailingRelay {
    pub log: Arc<LoggingNotificationRelay>,
}

#[async_trait]
impl NotificationRelay for FailingRelay {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        template: NotificationTemplate,
    ) -> Result<()> {
        self.log.send(channel, recipient, template).await?;
        Err(NotaryError::NotificationRelay("gateway timeout".into()))
    }
}
