//! Notification relay boundary (email / SMS / WhatsApp).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    Email,
    Sms,
    Whatsapp,
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Whatsapp => "whatsapp",
        })
    }
}

/// A named message template and the values to render it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    /// Template identifier, e.g. `session_phase_changed`
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl NotificationTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }
}

/// Best-effort outbound messaging.
///
/// Callers never wait on this for correctness: errors are logged, never
/// propagated into the operation that triggered the notification.
#[async_trait]
pub trait NotificationRelay: Send + Sync {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        template: NotificationTemplate,
    ) -> Result<()>;
}
