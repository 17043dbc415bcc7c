//! Session domain model.
//!
//! This module contains the core Session entity and the `SessionRecord`
//! aggregate (a session together with the documents it owns), which is the
//! unit of locking and persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::participant::{Participant, ParticipantIdentity};
use super::phase::SessionPhase;
use crate::document::{Document, DocumentStatus};
use crate::role::SignerRole;

/// Represents a notarization session.
///
/// A session contains:
/// - Its current phase in the transition table
/// - The participant roster, at most one participant per role
/// - The IDs of the documents it exclusively owns, in creation order
/// - Timestamps for creation and last update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Current phase
    pub phase: SessionPhase,
    /// Ordered participant roster
    pub participants: Vec<Participant>,
    /// Owned document IDs in creation order
    #[serde(default)]
    pub document_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session in `waiting` with the certifier already connected.
    pub fn new(id: String, certifier: ParticipantIdentity, now: DateTime<Utc>) -> Self {
        let mut certifier = Participant::new(SignerRole::Certifier, certifier);
        certifier.connected = true;

        Self {
            id,
            phase: SessionPhase::Waiting,
            participants: vec![certifier],
            document_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn participant(&self, role: SignerRole) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role == role)
    }

    pub fn participant_mut(&mut self, role: SignerRole) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.role == role)
    }

    pub fn has_role(&self, role: SignerRole) -> bool {
        self.participant(role).is_some()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// A session and the documents it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: Session,
    #[serde(default)]
    pub documents: BTreeMap<String, Document>,
}

impl SessionRecord {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            documents: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }

    pub fn document(&self, document_id: &str) -> Option<&Document> {
        self.documents.get(document_id)
    }

    pub fn document_mut(&mut self, document_id: &str) -> Option<&mut Document> {
        self.documents.get_mut(document_id)
    }

    /// Adds a document and records its ownership on the session.
    pub fn attach_document(&mut self, document: Document, now: DateTime<Utc>) {
        self.session.document_ids.push(document.id.clone());
        self.documents.insert(document.id.clone(), document);
        self.session.touch(now);
    }

    /// Documents in creation order.
    pub fn documents_in_order(&self) -> Vec<&Document> {
        self.session
            .document_ids
            .iter()
            .filter_map(|id| self.documents.get(id))
            .collect()
    }

    /// True when the session has at least one live document and every live
    /// (non-cancelled) document is completed.
    pub fn all_documents_completed(&self) -> bool {
        let mut live = self
            .documents
            .values()
            .filter(|d| d.status != DocumentStatus::Cancelled)
            .peekable();
        live.peek().is_some() && live.all(|d| d.status == DocumentStatus::Completed)
    }

    /// Cancels every document that has not completed. Returns the IDs that
    /// changed with their previous status.
    pub fn cancel_documents(&mut self, now: DateTime<Utc>) -> Vec<(String, DocumentStatus)> {
        self.documents
            .values_mut()
            .filter_map(|d| {
                let previous = d.status;
                d.cancel(now).then(|| (d.id.clone(), previous))
            })
            .collect()
    }
}
