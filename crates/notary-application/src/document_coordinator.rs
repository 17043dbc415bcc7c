//! Documents inside a session and their status.

use notary_core::clock::Clock;
use notary_core::collaborators::{BlobMetadata, BlobStore};
use notary_core::document::{Document, DocumentStatus};
use notary_core::error::{NotaryError, Result};
use notary_core::event::NotaryEvent;
use notary_core::SignerRole;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::events::EventBus;
use crate::session::SessionStore;

/// Body of a new document.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub title: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentContent {
    pub fn pdf(title: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

pub struct DocumentCoordinator {
    store: Arc<SessionStore>,
    blobs: Arc<dyn BlobStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl DocumentCoordinator {
    pub fn new(
        store: Arc<SessionStore>,
        blobs: Arc<dyn BlobStore>,
        events: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            blobs,
            events,
            clock,
        }
    }

    /// Creates a `draft` document owned by the session.
    ///
    /// The body goes to the blob store first (outside the session lock); the
    /// phase is checked again under the lock before the document is attached.
    ///
    /// # Errors
    ///
    /// - `InvalidPhase` unless the session is in `document_review` or `signing`
    /// - `InvalidDocument` when `required_signers` is empty
    pub async fn create_document(
        &self,
        session_id: &str,
        required_signers: BTreeSet<SignerRole>,
        content: DocumentContent,
    ) -> Result<Document> {
        if required_signers.is_empty() {
            return Err(NotaryError::InvalidDocument(
                "at least one required signer is needed".to_string(),
            ));
        }

        let phase = self.store.snapshot(session_id).await?.session.phase;
        if !phase.allows_document_creation() {
            return Err(NotaryError::invalid_phase("create_document", phase));
        }

        let metadata = BlobMetadata {
            content_type: content.content_type,
            file_name: Some(content.title.clone()),
        };
        let content_ref = self.blobs.store(content.bytes, metadata).await?;

        let handle = self.store.handle(session_id).await?;
        let mut record = handle.lock().await;

        let phase = record.session.phase;
        if !phase.allows_document_creation() {
            tracing::debug!(session_id, %content_ref, "Phase changed while storing content, blob left unreferenced");
            return Err(NotaryError::invalid_phase("create_document", phase));
        }

        let now = self.clock.now();
        let document = Document::new(
            uuid::Uuid::new_v4().to_string(),
            session_id.to_string(),
            content.title,
            required_signers,
            content_ref,
            now,
        );
        let mut next = record.clone();
        next.attach_document(document.clone(), now);
        self.store.commit(&mut record, next).await?;
        drop(record);

        tracing::info!(session_id, document_id = %document.id, "Document created");
        Ok(document)
    }

    /// `draft -> preview`.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` from any other status.
    pub async fn advance_to_preview(&self, document_id: &str) -> Result<Document> {
        let (session_id, handle) = self.store.handle_for_document(document_id).await?;
        let mut record = handle.lock().await;

        let mut next = record.clone();
        let document = next
            .document_mut(document_id)
            .ok_or_else(|| NotaryError::not_found("document", document_id))?;
        document.advance_to_preview(self.clock.now())?;
        let document = document.clone();
        next.session.touch(document.updated_at);
        self.store.commit(&mut record, next).await?;
        drop(record);

        tracing::info!(session_id = %session_id, document_id, "Document in preview");
        self.events.publish(NotaryEvent::DocumentStatusChanged {
            session_id,
            document_id: document_id.to_string(),
            from: DocumentStatus::Draft,
            to: DocumentStatus::Preview,
        });
        Ok(document)
    }

    /// Re-derives the status from the recorded signatures. Idempotent:
    /// without new signatures a second call changes nothing.
    pub async fn recompute_status(&self, document_id: &str) -> Result<DocumentStatus> {
        let (session_id, handle) = self.store.handle_for_document(document_id).await?;
        let mut record = handle.lock().await;

        let document = record
            .document(document_id)
            .ok_or_else(|| NotaryError::not_found("document", document_id))?;
        let derived = document.derived_status();
        if derived == document.status {
            return Ok(derived);
        }

        let now = self.clock.now();
        let mut next = record.clone();
        let mut previous = None;
        if let Some(document) = next.document_mut(document_id) {
            previous = document.recompute_status(now);
        }
        next.session.touch(now);
        self.store.commit(&mut record, next).await?;
        drop(record);

        if let Some(from) = previous {
            self.events.publish(NotaryEvent::DocumentStatusChanged {
                session_id,
                document_id: document_id.to_string(),
                from,
                to: derived,
            });
        }
        Ok(derived)
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Document> {
        let (_, handle) = self.store.handle_for_document(document_id).await?;
        let record = handle.lock().await;
        record
            .document(document_id)
            .cloned()
            .ok_or_else(|| NotaryError::not_found("document", document_id))
    }

    /// Documents of a session in creation order.
    pub async fn list_documents(&self, session_id: &str) -> Result<Vec<Document>> {
        let record = self.store.snapshot(session_id).await?;
        Ok(record.documents_in_order().into_iter().cloned().collect())
    }

    /// The document body from the blob store.
    pub async fn content(&self, document_id: &str) -> Result<Vec<u8>> {
        let document = self.get_document(document_id).await?;
        self.blobs.retrieve(&document.content_ref).await
    }
}
