//! Fire-and-forget delivery through the notification relay.

use notary_core::collaborators::{NotificationChannel, NotificationRelay, NotificationTemplate};
use notary_core::session::{Participant, Session, SessionPhase};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawns relay calls onto the runtime so that no caller waits on them and no
/// session lock is held while they run.
#[derive(Clone)]
pub struct NotificationDispatcher {
    relay: Option<Arc<dyn NotificationRelay>>,
    enabled: bool,
}

impl NotificationDispatcher {
    pub fn new(relay: Option<Arc<dyn NotificationRelay>>, enabled: bool) -> Self {
        Self { relay, enabled }
    }

    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    /// Queues one delivery. Failures are logged, never returned.
    pub fn dispatch(
        &self,
        channel: NotificationChannel,
        recipient: String,
        template: NotificationTemplate,
    ) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }
        let relay = self.relay.clone()?;

        Some(tokio::spawn(async move {
            let name = template.name.clone();
            match relay.send(channel, &recipient, template).await {
                Ok(()) => {
                    tracing::debug!(%channel, %recipient, template = %name, "Notification relayed");
                }
                Err(e) => {
                    tracing::warn!(
                        %channel,
                        %recipient,
                        template = %name,
                        error = %e,
                        "Notification relay failure"
                    );
                }
            }
        }))
    }

    /// Sends `template` to a participant over their preferred channel.
    pub fn notify_participant(
        &self,
        participant: &Participant,
        template: NotificationTemplate,
    ) -> Option<JoinHandle<()>> {
        match participant.contact.preferred_address() {
            Some((channel, address)) => self.dispatch(channel, address.to_string(), template),
            None => {
                tracing::debug!(
                    role = %participant.role,
                    "Participant has no contact address, skipping notification"
                );
                None
            }
        }
    }

    /// Tells every reachable participant that the session changed phase.
    pub fn phase_changed(&self, session: &Session, from: SessionPhase, to: SessionPhase) {
        for participant in &session.participants {
            let template = NotificationTemplate::new("session_phase_changed")
                .with("session_id", &session.id)
                .with("participant", &participant.name)
                .with("from", from)
                .with("to", to);
            self.notify_participant(participant, template);
        }
    }
}
