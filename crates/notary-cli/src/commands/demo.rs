//! End-to-end run of one notarization: a certifier and a client, one deed
//! signed by the client through an access link.

use anyhow::{Context, Result, bail};
use notary_application::{DocumentContent, SignerAuth};
use notary_core::SignerRole;
use notary_core::collaborators::{BlobMetadata, BlobStore, IdentityClaim};
use notary_core::error::NotaryError;
use notary_core::session::{ContactInfo, ParticipantIdentity, SessionPhase};
use notary_core::signature::SignerInfo;
use notary_infrastructure::{InMemoryBlobStore, LoggingNotificationRelay, StaticIdentityVerifier};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::runtime;

pub async fn run(config_path: Option<PathBuf>, data_dir: Option<PathBuf>, audit: bool) -> Result<()> {
    let mut config = runtime::config_service(config_path).get_config()?;
    if data_dir.is_some() {
        config.storage.data_dir = data_dir;
    }
    let (audit_sender, mut audit_records) = tokio::sync::mpsc::unbounded_channel();
    notary_telemetry::init_tracing(&config.logging, audit.then_some(audit_sender))?;

    let blobs = Arc::new(InMemoryBlobStore::new());
    let relay = Arc::new(LoggingNotificationRelay::new());
    let verifier = Arc::new(StaticIdentityVerifier::default().with_score("Ana Pérez", 0.95));
    let notary = runtime::services(&config, blobs.clone(), relay.clone(), verifier)?;
    let mut events = notary.events.subscribe();

    let session = notary
        .sessions
        .create_session(
            ParticipantIdentity::new("Notary Public")
                .with_contact(ContactInfo::email("notary@notary.local")),
        )
        .await?;
    notary
        .sessions
        .add_participant(
            &session.id,
            SignerRole::Client,
            ParticipantIdentity::new("Ana Pérez")
                .with_contact(ContactInfo::email("ana.perez@example.com")),
        )
        .await?;
    notary
        .sessions
        .set_connected(&session.id, SignerRole::Client, true)
        .await?;

    notary
        .sessions
        .transition_phase(&session.id, SessionPhase::IdentityVerification)
        .await?;
    notary
        .sessions
        .verify_participant(&session.id, SignerRole::Client, IdentityClaim::named("Ana Pérez"))
        .await?;
    notary
        .sessions
        .transition_phase(&session.id, SessionPhase::DocumentReview)
        .await?;

    let document = notary
        .documents
        .create_document(
            &session.id,
            BTreeSet::from([SignerRole::Client]),
            DocumentContent::pdf("Power of attorney", b"%PDF-1.7 demo".to_vec()),
        )
        .await?;
    notary.documents.advance_to_preview(&document.id).await?;
    notary
        .sessions
        .transition_phase(&session.id, SessionPhase::Signing)
        .await?;

    let token = notary
        .tokens
        .issue_and_deliver(&document.id, SignerRole::Client, Some(600))
        .await?;
    let opened = notary.tokens.open_with_token(&token.token).await?;

    let image_ref = blobs
        .store(b"signature-image".to_vec(), BlobMetadata::new("image/png"))
        .await?;
    let auth = SignerAuth::Token(token.token.clone());
    let signature = notary
        .signatures
        .submit_signature(
            &opened.document.id,
            &auth,
            SignerRole::Client,
            SignerInfo::named("Ana Pérez"),
            image_ref.clone(),
        )
        .await?;

    let replay = notary
        .signatures
        .submit_signature(
            &document.id,
            &auth,
            SignerRole::Client,
            SignerInfo::named("Ana Pérez"),
            image_ref,
        )
        .await;
    match &replay {
        Err(NotaryError::Unauthorized) => {}
        other => bail!("reused access token was not rejected: {other:?}"),
    }

    let session = notary.sessions.get_status(&session.id).await?;
    let document = notary.documents.get_document(&document.id).await?;

    let mut published = Vec::new();
    while let Ok(event) = events.try_recv() {
        published.push(event);
    }
    // Relay calls are spawned; give them a moment before reading the outbox.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut audit_log = Vec::new();
    while let Ok(record) = audit_records.try_recv() {
        audit_log.push(record);
    }

    let mut output = serde_json::json!({
        "session": session,
        "document": document,
        "signature": signature,
        "token_reuse": replay.err().map(|e| e.kind()),
        "events": published,
        "notifications": relay.deliveries(),
    });
    if audit {
        output["audit"] = serde_json::to_value(&audit_log).context("Failed to render audit log")?;
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to render demo output")?
    );

    Ok(())
}
