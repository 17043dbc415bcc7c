use chrono::{DateTime, Utc};
use notary_core::access_token::AccessTokenRepository;
use notary_core::clock::Clock;
use notary_core::collaborators::{IdentityClaim, IdentityVerifier};
use notary_core::config::SessionConfig;
use notary_core::document::DocumentStatus;
use notary_core::error::{NotaryError, Result};
use notary_core::event::NotaryEvent;
use notary_core::session::{
    IdentityVerification, Participant, ParticipantIdentity, Session, SessionPhase, SessionRecord,
};
use notary_core::SignerRole;
use std::sync::Arc;

use super::store::SessionStore;
use crate::events::EventBus;
use crate::notifier::NotificationDispatcher;

/// Owns the canonical phase and participant roster of every session.
///
/// `SessionRegistry` is responsible for:
/// - Creating sessions with their certifier
/// - Admitting participants and tracking their presence
/// - Recording identity verification outcomes
/// - Moving sessions through the phase transition table
pub struct SessionRegistry {
    store: Arc<SessionStore>,
    tokens: Arc<dyn AccessTokenRepository>,
    identity_verifier: Option<Arc<dyn IdentityVerifier>>,
    events: EventBus,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<SessionStore>,
        tokens: Arc<dyn AccessTokenRepository>,
        identity_verifier: Option<Arc<dyn IdentityVerifier>>,
        events: EventBus,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            identity_verifier,
            events,
            notifier,
            clock,
            config,
        }
    }

    /// Creates a session in `waiting` whose only participant is the
    /// (connected) certifier.
    pub async fn create_session(&self, certifier: ParticipantIdentity) -> Result<Session> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone(), certifier, self.clock.now());

        self.store.insert(SessionRecord::new(session.clone())).await?;

        tracing::info!(session_id = %session_id, "Session created");
        self.events.publish(NotaryEvent::SessionCreated { session_id });
        Ok(session)
    }

    /// Adds a participant in `role`.
    ///
    /// # Errors
    ///
    /// - `InvalidPhase` if the session is completed or cancelled
    /// - `DuplicateParticipant` if the role is already taken
    pub async fn add_participant(
        &self,
        session_id: &str,
        role: SignerRole,
        identity: ParticipantIdentity,
    ) -> Result<Participant> {
        let handle = self.store.handle(session_id).await?;
        let mut record = handle.lock().await;

        let phase = record.session.phase;
        if phase.is_terminal() {
            return Err(NotaryError::invalid_phase("add_participant", phase));
        }
        if record.session.has_role(role) {
            return Err(NotaryError::DuplicateParticipant {
                role: role.to_string(),
            });
        }

        let participant = Participant::new(role, identity);
        let mut next = record.clone();
        next.session.participants.push(participant.clone());
        next.session.touch(self.clock.now());
        self.store.commit(&mut record, next).await?;
        drop(record);

        tracing::info!(session_id, %role, name = %participant.name, "Participant added");
        self.events.publish(NotaryEvent::ParticipantAdded {
            session_id: session_id.to_string(),
            role,
        });
        Ok(participant)
    }

    /// Marks a participant as present in (or gone from) the session room.
    pub async fn set_connected(
        &self,
        session_id: &str,
        role: SignerRole,
        connected: bool,
    ) -> Result<Session> {
        let handle = self.store.handle(session_id).await?;
        let mut record = handle.lock().await;

        let phase = record.session.phase;
        if phase.is_terminal() {
            return Err(NotaryError::invalid_phase("set_connected", phase));
        }

        let current = record
            .session
            .participant(role)
            .ok_or_else(|| NotaryError::not_found("participant", role.as_str()))?
            .connected;
        if current == connected {
            return Ok(record.session.clone());
        }

        let mut next = record.clone();
        if let Some(participant) = next.session.participant_mut(role) {
            participant.connected = connected;
        }
        next.session.touch(self.clock.now());
        self.store.commit(&mut record, next).await?;
        let session = record.session.clone();
        drop(record);

        tracing::debug!(session_id, %role, connected, "Participant presence changed");
        self.events.publish(NotaryEvent::ParticipantPresence {
            session_id: session_id.to_string(),
            role,
            connected,
        });
        Ok(session)
    }

    /// Runs the identity-verification collaborator for a participant and
    /// records the outcome on the roster.
    ///
    /// The collaborator is called without holding the session lock; the
    /// result is written afterwards if the session is still live.
    pub async fn verify_participant(
        &self,
        session_id: &str,
        role: SignerRole,
        claim: IdentityClaim,
    ) -> Result<IdentityVerification> {
        let verifier = self
            .identity_verifier
            .clone()
            .ok_or_else(|| NotaryError::config("no identity verifier configured"))?;

        {
            let snapshot = self.store.snapshot(session_id).await?;
            if !snapshot.session.has_role(role) {
                return Err(NotaryError::not_found("participant", role.as_str()));
            }
        }

        let check = verifier.verify_identity(&claim).await?;
        let outcome = IdentityVerification {
            verified: check.verified,
            score: check.score,
            checked_at: self.clock.now(),
        };

        let handle = self.store.handle(session_id).await?;
        let mut record = handle.lock().await;
        let phase = record.session.phase;
        if phase.is_terminal() {
            return Err(NotaryError::invalid_phase("verify_participant", phase));
        }

        let mut next = record.clone();
        let participant = next
            .session
            .participant_mut(role)
            .ok_or_else(|| NotaryError::not_found("participant", role.as_str()))?;
        participant.identity_verification = Some(outcome.clone());
        next.session.touch(outcome.checked_at);
        self.store.commit(&mut record, next).await?;

        tracing::info!(
            session_id,
            %role,
            verified = outcome.verified,
            score = outcome.score,
            "Identity verification recorded"
        );
        Ok(outcome)
    }

    /// Moves a session to `target` if the transition table allows it.
    ///
    /// Cancelling cascades to every document that has not completed and
    /// revokes their access tokens. Participants are notified after the
    /// transition is persisted; a relay failure never undoes it.
    ///
    /// # Errors
    ///
    /// - `IllegalTransition` if `target` is not reachable from the current phase
    /// - `IdentityNotVerified` when verified clients are required for `document_review`
    /// - `InvalidPhase` when completing a session with unfinished documents
    pub async fn transition_phase(&self, session_id: &str, target: SessionPhase) -> Result<Session> {
        let handle = self.store.handle(session_id).await?;
        let mut record = handle.lock().await;

        let from = record.session.phase;
        if !from.can_transition_to(target) {
            tracing::warn!(session_id, %from, to = %target, "Rejected illegal phase transition");
            return Err(NotaryError::illegal_transition(from, target));
        }

        if from == SessionPhase::IdentityVerification
            && target == SessionPhase::DocumentReview
            && self.config.require_verified_clients
        {
            if let Some(unverified) = record
                .session
                .participants
                .iter()
                .find(|p| p.role == SignerRole::Client && !p.is_verified())
            {
                return Err(NotaryError::IdentityNotVerified {
                    name: unverified.name.clone(),
                });
            }
        }

        if target == SessionPhase::Completed && !record.all_documents_completed() {
            return Err(NotaryError::invalid_phase("complete_session", from));
        }

        let now = self.clock.now();
        let mut next = record.clone();
        let cancelled_documents = if target == SessionPhase::Cancelled {
            next.cancel_documents(now)
        } else {
            Vec::new()
        };
        apply_phase(&mut next, target, now);
        self.store.commit(&mut record, next).await?;

        let session = record.session.clone();
        let owned_documents = session.document_ids.clone();
        drop(record);

        tracing::info!(session_id, %from, to = %target, "Session phase changed");

        if target == SessionPhase::Cancelled {
            for (document_id, previous) in cancelled_documents {
                self.events.publish(NotaryEvent::DocumentStatusChanged {
                    session_id: session_id.to_string(),
                    document_id,
                    from: previous,
                    to: DocumentStatus::Cancelled,
                });
            }
            self.revoke_tokens(&owned_documents).await;
        }

        self.events.publish(NotaryEvent::PhaseChanged {
            session_id: session_id.to_string(),
            from,
            to: target,
        });
        self.notifier.phase_changed(&session, from, target);

        Ok(session)
    }

    /// Read-only snapshot of a session.
    pub async fn get_status(&self, session_id: &str) -> Result<Session> {
        Ok(self.store.snapshot(session_id).await?.session)
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|r| r.session)
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn revoke_tokens(&self, document_ids: &[String]) {
        for document_id in document_ids {
            match self.tokens.revoke_for_document(document_id).await {
                Ok(0) => {}
                Ok(count) => tracing::debug!(document_id, count, "Revoked access tokens"),
                Err(e) => tracing::warn!(document_id, error = %e, "Failed to revoke access tokens"),
            }
        }
    }
}

/// Sets the phase and bumps `updated_at`. The caller has already checked
/// the transition table.
pub(crate) fn apply_phase(record: &mut SessionRecord, target: SessionPhase, now: DateTime<Utc>) {
    record.session.phase = target;
    record.session.touch(now);
}
