//! Session participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::NotificationChannel;
use crate::role::SignerRole;

/// How a participant can be reached out of band.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub preferred_channel: NotificationChannel,
}

impl ContactInfo {
    pub fn email(address: impl Into<String>) -> Self {
        Self {
            email: Some(address.into()),
            phone: None,
            preferred_channel: NotificationChannel::Email,
        }
    }

    /// The address to use for `channel`, if the participant has one.
    pub fn address_for(&self, channel: NotificationChannel) -> Option<&str> {
        match channel {
            NotificationChannel::Email => self.email.as_deref(),
            NotificationChannel::Sms | NotificationChannel::Whatsapp => self.phone.as_deref(),
        }
    }

    /// The preferred channel and its address, falling back to whichever
    /// address is known.
    pub fn preferred_address(&self) -> Option<(NotificationChannel, &str)> {
        if let Some(address) = self.address_for(self.preferred_channel) {
            return Some((self.preferred_channel, address));
        }
        self.email
            .as_deref()
            .map(|e| (NotificationChannel::Email, e))
            .or_else(|| self.phone.as_deref().map(|p| (NotificationChannel::Sms, p)))
    }
}

/// Who a participant claims to be when joining a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl ParticipantIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: ContactInfo::default(),
        }
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = contact;
        self
    }
}

/// Recorded outcome of the identity-verification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityVerification {
    pub verified: bool,
    pub score: f64,
    pub checked_at: DateTime<Utc>,
}

/// A member of a session's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub role: SignerRole,
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
    /// Whether the participant is currently present in the session room
    pub connected: bool,
    #[serde(default)]
    pub identity_verification: Option<IdentityVerification>,
}

impl Participant {
    pub fn new(role: SignerRole, identity: ParticipantIdentity) -> Self {
        Self {
            role,
            name: identity.name,
            contact: identity.contact,
            connected: false,
            identity_verification: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.identity_verification
            .as_ref()
            .is_some_and(|v| v.verified)
    }
}
