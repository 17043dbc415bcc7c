//! Table-driven identity verifier.

use async_trait::async_trait;
use notary_core::collaborators::{IdentityCheck, IdentityClaim, IdentityVerifier};
use notary_core::error::Result;
use std::collections::HashMap;

/// Scores claims from a fixed table of known identifier codes (or names when
/// no code is given). A claim is verified when its score reaches the
/// threshold; unknown claims score zero.
#[derive(Debug, Clone)]
pub struct StaticIdentityVerifier {
    scores: HashMap<String, f64>,
    threshold: f64,
}

impl StaticIdentityVerifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            scores: HashMap::new(),
            threshold,
        }
    }

    pub fn with_score(mut self, key: impl Into<String>, score: f64) -> Self {
        self.scores.insert(key.into(), score);
        self
    }
}

impl Default for StaticIdentityVerifier {
    fn default() -> Self {
        Self::new(0.8)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify_identity(&self, claim: &IdentityClaim) -> Result<IdentityCheck> {
        let key = claim.identifier_code.as_deref().unwrap_or(&claim.name);
        let score = self.scores.get(key).copied().unwrap_or(0.0);
        let verified = score >= self.threshold;

        tracing::debug!(name = %claim.name, score, verified, "Identity checked");
        Ok(IdentityCheck { verified, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_threshold_and_identifier_precedence() {
        let verifier = StaticIdentityVerifier::new(0.8)
            .with_score("X1234567Z", 0.91)
            .with_score("Luis Gómez", 0.42);

        let mut claim = IdentityClaim::named("Ana Pérez");
        claim.identifier_code = Some("X1234567Z".into());
        let check = verifier.verify_identity(&claim).await.unwrap();
        assert!(check.verified);
        assert_eq!(check.score, 0.91);

        let check = verifier
            .verify_identity(&IdentityClaim::named("Luis Gómez"))
            .await
            .unwrap();
        assert!(!check.verified);

        let check = verifier
            .verify_identity(&IdentityClaim::named("Nobody"))
            .await
            .unwrap();
        assert_eq!(check.score, 0.0);
    }
}
