//! Access token domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::SignerRole;

/// An out-of-band grant to view and sign one document in one role.
///
/// Lifecycle: `issued -> consumed` on the first accepted signature (when
/// single-use), or `issued -> expired` once `now >= expires_at`. Expiry is
/// computed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// URL-safe random string
    pub token: String,
    pub document_id: String,
    pub granted_role: SignerRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

/// What a valid token grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub document_id: String,
    pub granted_role: SignerRole,
}

/// Why a token was refused. Logged only; callers see `Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Unknown,
    Expired,
    Consumed,
    WrongScope,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenRejection::Unknown => "unknown token",
            TokenRejection::Expired => "token expired",
            TokenRejection::Consumed => "token already consumed",
            TokenRejection::WrongScope => "token scoped to another document or role",
        })
    }
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks expiry and, under the single-use policy, consumption.
    pub fn check(&self, now: DateTime<Utc>, single_use: bool) -> Result<TokenGrant, TokenRejection> {
        if self.is_expired(now) {
            return Err(TokenRejection::Expired);
        }
        if single_use && self.consumed {
            return Err(TokenRejection::Consumed);
        }
        Ok(self.grant())
    }

    /// Like [`AccessToken::check`], additionally requiring the exact scope.
    pub fn check_scope(
        &self,
        document_id: &str,
        role: SignerRole,
        now: DateTime<Utc>,
        single_use: bool,
    ) -> Result<TokenGrant, TokenRejection> {
        let grant = self.check(now, single_use)?;
        if grant.document_id != document_id || grant.granted_role != role {
            return Err(TokenRejection::WrongScope);
        }
        Ok(grant)
    }

    pub fn grant(&self) -> TokenGrant {
        TokenGrant {
            document_id: self.document_id.clone(),
            granted_role: self.granted_role,
        }
    }
}
