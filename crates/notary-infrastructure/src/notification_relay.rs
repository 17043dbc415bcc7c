//! Notification relay that writes deliveries to the log.

use async_trait::async_trait;
use notary_core::collaborators::{NotificationChannel, NotificationRelay, NotificationTemplate};
use notary_core::error::Result;
use serde::Serialize;
use std::sync::Mutex;

/// One relayed message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub channel: NotificationChannel,
    pub recipient: String,
    pub template: NotificationTemplate,
}

/// Stand-in for an email/SMS gateway: logs every delivery and keeps a copy
/// for inspection.
#[derive(Debug, Default)]
pub struct LoggingNotificationRelay {
    deliveries: Mutex<Vec<Delivery>>,
}

impl LoggingNotificationRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl NotificationRelay for LoggingNotificationRelay {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        template: NotificationTemplate,
    ) -> Result<()> {
        tracing::info!(
            %channel,
            recipient,
            template = %template.name,
            data = ?template.data,
            "Notification sent"
        );
        self.deliveries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Delivery {
                channel,
                recipient: recipient.to_string(),
                template,
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries() {
        let relay = LoggingNotificationRelay::new();
        relay
            .send(
                NotificationChannel::Sms,
                "+34600000000",
                NotificationTemplate::new("document_access_link").with("link", "https://x"),
            )
            .await
            .unwrap();

        let deliveries = relay.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].channel, NotificationChannel::Sms);
        assert_eq!(deliveries[0].template.data["link"], "https://x");
    }
}
