//! Identity verification boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a participant presents for verification.
///
/// Only the fields the core forwards; vendor-specific evidence (document
/// scans, selfies) is referenced, not embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub name: String,
    #[serde(default)]
    pub identifier_code: Option<String>,
    #[serde(default)]
    pub evidence_ref: Option<String>,
}

impl IdentityClaim {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier_code: None,
            evidence_ref: None,
        }
    }
}

/// Narrow result of a verification call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentityCheck {
    pub verified: bool,
    pub score: f64,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_identity(&self, claim: &IdentityClaim) -> Result<IdentityCheck>;
}
