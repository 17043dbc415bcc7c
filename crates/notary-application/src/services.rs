//! Wiring of the four notarization services around one shared session store.

use notary_core::access_token::AccessTokenRepository;
use notary_core::clock::{Clock, SystemClock};
use notary_core::collaborators::{BlobStore, IdentityVerifier, NotificationRelay};
use notary_core::config::RootConfig;
use notary_core::session::SessionRepository;
use std::sync::Arc;

use crate::access_token_issuer::AccessTokenIssuer;
use crate::document_coordinator::DocumentCoordinator;
use crate::events::EventBus;
use crate::notifier::NotificationDispatcher;
use crate::session::{SessionRegistry, SessionStore};
use crate::signature_collector::SignatureCollector;

/// Storage and collaborator adapters the services run against.
pub struct NotaryDependencies {
    pub sessions: Arc<dyn SessionRepository>,
    pub tokens: Arc<dyn AccessTokenRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub relay: Option<Arc<dyn NotificationRelay>>,
    pub identity_verifier: Option<Arc<dyn IdentityVerifier>>,
    pub clock: Arc<dyn Clock>,
}

impl NotaryDependencies {
    /// Dependencies with the system clock and no optional collaborators.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        tokens: Arc<dyn AccessTokenRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            blobs,
            relay: None,
            identity_verifier: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_relay(mut self, relay: Arc<dyn NotificationRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_identity_verifier(mut self, verifier: Arc<dyn IdentityVerifier>) -> Self {
        self.identity_verifier = Some(verifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// The notarization core, ready to serve requests.
///
/// All four services share one [`SessionStore`], and therefore one lock per
/// session.
pub struct NotaryServices {
    pub sessions: SessionRegistry,
    pub documents: DocumentCoordinator,
    pub signatures: SignatureCollector,
    pub tokens: AccessTokenIssuer,
    pub events: EventBus,
}

impl NotaryServices {
    pub fn new(config: &RootConfig, deps: NotaryDependencies) -> Self {
        let store = Arc::new(SessionStore::new(deps.sessions));
        let events = EventBus::default();
        let notifier = NotificationDispatcher::new(deps.relay, config.notifications.enabled);

        let sessions = SessionRegistry::new(
            store.clone(),
            deps.tokens.clone(),
            deps.identity_verifier,
            events.clone(),
            notifier.clone(),
            deps.clock.clone(),
            config.sessions.clone(),
        );
        let documents = DocumentCoordinator::new(
            store.clone(),
            deps.blobs.clone(),
            events.clone(),
            deps.clock.clone(),
        );
        let signatures = SignatureCollector::new(
            store.clone(),
            deps.tokens.clone(),
            events.clone(),
            notifier.clone(),
            deps.clock.clone(),
            config.tokens.clone(),
            config.sessions.clone(),
        );
        let tokens = AccessTokenIssuer::new(
            store,
            deps.tokens,
            deps.blobs,
            events.clone(),
            notifier,
            deps.clock,
            config.tokens.clone(),
            config.notifications.clone(),
        );

        tracing::debug!(
            single_use_tokens = config.tokens.single_use,
            auto_complete = config.sessions.auto_complete,
            notifications = config.notifications.enabled,
            "Notary services initialized"
        );

        Self {
            sessions,
            documents,
            signatures,
            tokens,
            events,
        }
    }
}
