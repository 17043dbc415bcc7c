//! Signature records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::BlobRef;
use crate::role::SignerRole;

/// Free-form identity claim attached to a signature.
///
/// Not verified here; verification belongs to the identity-verification
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignerInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub identifier_code: Option<String>,
}

impl SignerInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A recorded signature. Immutable once appended to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signer_role: SignerRole,
    pub signer_info: SignerInfo,
    /// Blob store reference of the signature image
    pub image_ref: BlobRef,
    pub signed_at: DateTime<Utc>,
}
