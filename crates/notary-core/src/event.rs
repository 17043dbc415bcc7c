use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentStatus;
use crate::role::SignerRole;
use crate::session::SessionPhase;

/// State changes published to read-only observers (UIs, certificate generation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotaryEvent {
    SessionCreated {
        session_id: String,
    },
    PhaseChanged {
        session_id: String,
        from: SessionPhase,
        to: SessionPhase,
    },
    ParticipantAdded {
        session_id: String,
        role: SignerRole,
    },
    ParticipantPresence {
        session_id: String,
        role: SignerRole,
        connected: bool,
    },
    DocumentStatusChanged {
        session_id: String,
        document_id: String,
        from: DocumentStatus,
        to: DocumentStatus,
    },
    SignatureRecorded {
        session_id: String,
        document_id: String,
        role: SignerRole,
    },
    TokenIssued {
        document_id: String,
        role: SignerRole,
        expires_at: DateTime<Utc>,
    },
}

impl NotaryEvent {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            NotaryEvent::SessionCreated { session_id }
            | NotaryEvent::PhaseChanged { session_id, .. }
            | NotaryEvent::ParticipantAdded { session_id, .. }
            | NotaryEvent::ParticipantPresence { session_id, .. }
            | NotaryEvent::DocumentStatusChanged { session_id, .. }
            | NotaryEvent::SignatureRecorded { session_id, .. } => Some(session_id.as_str()),
            NotaryEvent::TokenIssued { .. } => None,
        }
    }
}
