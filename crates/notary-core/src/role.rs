//! Signer roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NotaryError;

/// The capacity in which a participant takes part in a session and signs.
///
/// A role is independent of the individual's identity: a session holds at
/// most one participant per role, and a document holds at most one signature
/// per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    /// The notary conducting the session.
    Certifier,
    /// The person whose documents are being notarized.
    Client,
}

impl SignerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SignerRole::Certifier => "certifier",
            SignerRole::Client => "client",
        }
    }
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerRole {
    type Err = NotaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "certifier" => Ok(SignerRole::Certifier),
            "client" => Ok(SignerRole::Client),
            other => Err(NotaryError::config(format!("unknown signer role '{}'", other))),
        }
    }
}
