//! Session phases and the fixed transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NotaryError;

/// The discrete state of a notarization session.
///
/// Phases only move along the table returned by [`SessionPhase::allowed_targets`]:
///
/// ```text
/// waiting               -> identity_verification, cancelled
/// identity_verification -> document_review, cancelled
/// document_review       -> signing, cancelled
/// signing               -> completed, document_review, cancelled
/// completed, cancelled  -> (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Created, participants are joining.
    Waiting,
    /// Participants are proving who they are.
    IdentityVerification,
    /// Documents are being prepared and previewed.
    DocumentReview,
    /// Documents are being signed.
    Signing,
    /// Every document is completed.
    Completed,
    /// Aborted from any non-terminal phase.
    Cancelled,
}

impl SessionPhase {
    /// Phases reachable from `self` in a single transition.
    pub fn allowed_targets(self) -> &'static [SessionPhase] {
        use SessionPhase::*;
        match self {
            Waiting => &[IdentityVerification, Cancelled],
            IdentityVerification => &[DocumentReview, Cancelled],
            DocumentReview => &[Signing, Cancelled],
            // document_review here is the "request changes" revert
            Signing => &[Completed, DocumentReview, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: SessionPhase) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Cancelled)
    }

    /// Documents may be created in `document_review` or `signing`.
    pub fn allows_document_creation(self) -> bool {
        matches!(self, SessionPhase::DocumentReview | SessionPhase::Signing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Waiting => "waiting",
            SessionPhase::IdentityVerification => "identity_verification",
            SessionPhase::DocumentReview => "document_review",
            SessionPhase::Signing => "signing",
            SessionPhase::Completed => "completed",
            SessionPhase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionPhase {
    type Err = NotaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(SessionPhase::Waiting),
            "identity_verification" => Ok(SessionPhase::IdentityVerification),
            "document_review" => Ok(SessionPhase::DocumentReview),
            "signing" => Ok(SessionPhase::Signing),
            "completed" => Ok(SessionPhase::Completed),
            "cancelled" => Ok(SessionPhase::Cancelled),
            other => Err(NotaryError::config(format!("unknown session phase '{}'", other))),
        }
    }
}
