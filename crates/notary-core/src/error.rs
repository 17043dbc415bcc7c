//! Error types for the notarization core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire notarization core.
///
/// Every variant is a caller-facing rejection kind; none of them leak
/// storage or collaborator internals. `Unauthorized` deliberately carries no
/// reason: the reason is only written to the log.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotaryError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The operation is not allowed in the session's current phase
    #[error("Invalid phase: {operation} is not allowed while session is {phase}")]
    InvalidPhase { operation: String, phase: String },

    /// A phase or status transition outside the transition table
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    /// A participant with this role is already part of the session
    #[error("Duplicate participant: role '{role}' is already present")]
    DuplicateParticipant { role: String },

    /// A signature for this role was already recorded on the document
    #[error("Duplicate signature: role '{role}' has already signed")]
    DuplicateSignature { role: String },

    /// Token or session authorization failed
    #[error("Unauthorized")]
    Unauthorized,

    /// The owning session was cancelled
    #[error("Session cancelled")]
    SessionCancelled,

    /// The document is not in a signable status
    #[error("Document not signable: status is {status}")]
    DocumentNotSignable { status: String },

    /// The document cannot be used for the requested operation
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A client participant has no positive identity verification
    #[error("Identity not verified: {name}")]
    IdentityNotVerified { name: String },

    /// Notification relay failure (logged, never surfaced by phase transitions)
    #[error("Notification relay error: {0}")]
    NotificationRelay(String),

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotaryError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidPhase error
    pub fn invalid_phase(operation: impl Into<String>, phase: impl ToString) -> Self {
        Self::InvalidPhase {
            operation: operation.into(),
            phase: phase.to_string(),
        }
    }

    /// Creates an IllegalTransition error
    pub fn illegal_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a state-machine rejection (phase or transition)
    pub fn is_state_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidPhase { .. } | Self::IllegalTransition { .. }
        )
    }

    /// Stable, machine-readable code for the calling UI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidPhase { .. } => "invalid_phase",
            Self::IllegalTransition { .. } => "illegal_transition",
            Self::DuplicateParticipant { .. } => "duplicate_participant",
            Self::DuplicateSignature { .. } => "duplicate_signature",
            Self::Unauthorized => "unauthorized",
            Self::SessionCancelled => "session_cancelled",
            Self::DocumentNotSignable { .. } => "document_not_signable",
            Self::InvalidDocument(_) => "invalid_document",
            Self::IdentityNotVerified { .. } => "identity_not_verified",
            Self::NotificationRelay(_) => "notification_relay_failure",
            Self::DataAccess(_) => "data_access",
            Self::Serialization { .. } => "serialization",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NotaryError {
    fn from(err: std::io::Error) -> Self {
        Self::DataAccess(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for NotaryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NotaryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NotaryError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error for collaborator adapters
impl From<anyhow::Error> for NotaryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, NotaryError>`.
pub type Result<T> = std::result::Result<T, NotaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_message_carries_no_reason() {
        assert_eq!(NotaryError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn kind_codes_are_distinct_per_rejection() {
        let errors = [
            NotaryError::invalid_phase("add_participant", "completed"),
            NotaryError::illegal_transition("waiting", "signing"),
            NotaryError::DuplicateParticipant {
                role: "client".into(),
            },
            NotaryError::DuplicateSignature {
                role: "client".into(),
            },
            NotaryError::Unauthorized,
            NotaryError::SessionCancelled,
            NotaryError::DocumentNotSignable {
                status: "draft".into(),
            },
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn io_errors_map_to_data_access() {
        let err: NotaryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, NotaryError::DataAccess(_)));
    }
}
