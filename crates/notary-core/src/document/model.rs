//! Document domain model.
//!
//! A document belongs to exactly one session and carries its own signature
//! status, independent of the other documents of that session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::collaborators::BlobRef;
use crate::error::{NotaryError, Result};
use crate::role::SignerRole;
use crate::signature::Signature;

/// Signature status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Being prepared; not yet visible to signers.
    Draft,
    /// Visible to signers, no signature yet.
    Preview,
    /// At least one signature recorded, some required signers missing.
    PendingSignature,
    /// Kept for persisted representations; status recompute never produces it.
    Signed,
    /// Every required signer has signed. Never regresses.
    Completed,
    /// The owning session was cancelled before completion.
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Preview => "preview",
            DocumentStatus::PendingSignature => "pending_signature",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    /// Signatures are accepted only in `preview` and `pending_signature`.
    pub fn is_signable(self) -> bool {
        matches!(self, DocumentStatus::Preview | DocumentStatus::PendingSignature)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document attached to a notarization session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier (UUID format)
    pub id: String,
    /// The owning session
    pub session_id: String,
    pub title: String,
    pub status: DocumentStatus,
    /// Roles that must sign before the document completes
    pub required_signers: BTreeSet<SignerRole>,
    /// Append-only, in submission order
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Blob store reference of the document body
    pub content_ref: BlobRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: String,
        session_id: String,
        title: String,
        required_signers: BTreeSet<SignerRole>,
        content_ref: BlobRef,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            session_id,
            title,
            status: DocumentStatus::Draft,
            required_signers,
            signatures: Vec::new(),
            content_ref,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn signature_for(&self, role: SignerRole) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.signer_role == role)
    }

    pub fn requires(&self, role: SignerRole) -> bool {
        self.required_signers.contains(&role)
    }

    /// Required roles that have not signed yet.
    pub fn missing_signers(&self) -> Vec<SignerRole> {
        self.required_signers
            .iter()
            .copied()
            .filter(|role| self.signature_for(*role).is_none())
            .collect()
    }

    /// `draft -> preview`; any other starting status is an illegal transition.
    pub fn advance_to_preview(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != DocumentStatus::Draft {
            return Err(NotaryError::illegal_transition(
                self.status,
                DocumentStatus::Preview,
            ));
        }
        self.status = DocumentStatus::Preview;
        self.updated_at = now;
        Ok(())
    }

    /// The status implied by the current signatures.
    ///
    /// `completed` is sticky, and `draft` / `cancelled` are left alone since
    /// they are not driven by signatures.
    pub fn derived_status(&self) -> DocumentStatus {
        match self.status {
            DocumentStatus::Completed | DocumentStatus::Draft | DocumentStatus::Cancelled => {
                self.status
            }
            _ if self.missing_signers().is_empty() => DocumentStatus::Completed,
            _ if !self.signatures.is_empty() => DocumentStatus::PendingSignature,
            _ => DocumentStatus::Preview,
        }
    }

    /// Applies [`Document::derived_status`]. Returns the previous status when
    /// it changed. Idempotent.
    pub fn recompute_status(&mut self, now: DateTime<Utc>) -> Option<DocumentStatus> {
        let next = self.derived_status();
        if next == self.status {
            return None;
        }
        let previous = std::mem::replace(&mut self.status, next);
        self.updated_at = now;
        Some(previous)
    }

    /// Cascade from a cancelled session. Completed documents are kept.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        if matches!(
            self.status,
            DocumentStatus::Completed | DocumentStatus::Cancelled
        ) {
            return false;
        }
        self.status = DocumentStatus::Cancelled;
        self.updated_at = now;
        true
    }
}
