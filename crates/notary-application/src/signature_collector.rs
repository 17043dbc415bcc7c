//! The single entry point for recording signatures.

use chrono::{DateTime, Utc};
use notary_core::access_token::{AccessToken, AccessTokenRepository, TokenRejection};
use notary_core::clock::Clock;
use notary_core::collaborators::BlobRef;
use notary_core::config::{SessionConfig, TokenConfig};
use notary_core::document::{Document, DocumentStatus};
use notary_core::error::{NotaryError, Result};
use notary_core::event::NotaryEvent;
use notary_core::session::{SessionPhase, SessionRecord};
use notary_core::signature::{Signature, SignerInfo};
use notary_core::SignerRole;
use std::sync::Arc;

use crate::events::EventBus;
use crate::notifier::NotificationDispatcher;
use crate::session::{SessionStore, apply_phase};

/// How a signer proves they may sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerAuth {
    /// An out-of-band access token scoped to one document and role
    Token(String),
    /// A participant already authenticated into the session room
    Participant {
        session_id: String,
        role: SignerRole,
    },
}

/// Records signatures against documents.
///
/// Every precondition check, the append, token consumption, status recompute
/// and the write happen under the owning session's lock, so a concurrent
/// reader sees either none of it or all of it, and a concurrent cancel is
/// observed before commit.
pub struct SignatureCollector {
    store: Arc<SessionStore>,
    tokens: Arc<dyn AccessTokenRepository>,
    events: EventBus,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    token_config: TokenConfig,
    session_config: SessionConfig,
}

impl SignatureCollector {
    pub fn new(
        store: Arc<SessionStore>,
        tokens: Arc<dyn AccessTokenRepository>,
        events: EventBus,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        token_config: TokenConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            events,
            notifier,
            clock,
            token_config,
            session_config,
        }
    }

    /// Records the signature of `signer_role` on a document.
    ///
    /// # Arguments
    ///
    /// * `document_id` - The document to sign
    /// * `auth` - Access token or session participant credentials
    /// * `signer_role` - The capacity in which the signature is given
    /// * `signer_info` - Free-form identity claim of the signer
    /// * `image_ref` - Blob reference of the signature image
    ///
    /// # Errors
    ///
    /// Preconditions are checked in order and the first failure is returned:
    /// - `NotFound` for an unknown document
    /// - `SessionCancelled` if the owning session (or the document) was cancelled
    /// - `Unauthorized` for a presented access token that is no longer valid
    /// - `DocumentNotSignable` unless the document is in `preview` or
    ///   `pending_signature`, or `signer_role` already signed it
    /// - `Unauthorized` if the credentials do not grant `signer_role` on this document
    /// - `DuplicateSignature` if the role has already signed
    pub async fn submit_signature(
        &self,
        document_id: &str,
        auth: &SignerAuth,
        signer_role: SignerRole,
        signer_info: SignerInfo,
        image_ref: BlobRef,
    ) -> Result<Signature> {
        let (session_id, handle) = self.store.handle_for_document(document_id).await?;
        let mut record = handle.lock().await;
        let now = self.clock.now();

        let document = record
            .document(document_id)
            .ok_or_else(|| NotaryError::not_found("document", document_id))?;

        if record.session.phase == SessionPhase::Cancelled
            || document.status == DocumentStatus::Cancelled
        {
            return Err(NotaryError::SessionCancelled);
        }

        // A dead token learns nothing about the document's signing state.
        let presented = match auth {
            SignerAuth::Token(token) => Some(self.live_token(token, document_id).await?),
            SignerAuth::Participant { .. } => None,
        };

        // A role that already signed is a duplicate even once the document completed.
        let already_signed = document.signature_for(signer_role).is_some();
        if !document.status.is_signable() && !already_signed {
            return Err(NotaryError::DocumentNotSignable {
                status: document.status.to_string(),
            });
        }
        self.authorize(&record, document, auth, presented.as_ref(), signer_role, now)?;
        if already_signed {
            return Err(NotaryError::DuplicateSignature {
                role: signer_role.to_string(),
            });
        }

        let signature = Signature {
            signer_role,
            signer_info,
            image_ref,
            signed_at: now,
        };

        let mut next = record.clone();
        let mut status_change = None;
        if let Some(document) = next.document_mut(document_id) {
            document.signatures.push(signature.clone());
            document.updated_at = now;
            status_change = document
                .recompute_status(now)
                .map(|from| (from, document.status));
        }
        next.session.touch(now);

        let phase_before = next.session.phase;
        let auto_completed = self.session_config.auto_complete
            && phase_before == SessionPhase::Signing
            && next.all_documents_completed();
        if auto_completed {
            apply_phase(&mut next, SessionPhase::Completed, now);
        }

        let consumed = match &presented {
            Some(token) if self.token_config.single_use => {
                if !self.tokens.mark_consumed(&token.token).await? {
                    tracing::warn!(document_id, role = %signer_role, "Signature rejected: token consumed concurrently");
                    return Err(NotaryError::Unauthorized);
                }
                Some(token.token.as_str())
            }
            _ => None,
        };

        if let Err(e) = self.store.commit(&mut record, next).await {
            if let Some(token) = consumed {
                if let Err(release_err) = self.tokens.release(token).await {
                    tracing::error!(document_id, error = %release_err, "Failed to release access token after aborted signature");
                }
            }
            return Err(e);
        }
        let session = record.session.clone();
        drop(record);

        tracing::info!(
            session_id = %session_id,
            document_id,
            role = %signer_role,
            "Signature recorded"
        );
        self.events.publish(NotaryEvent::SignatureRecorded {
            session_id: session_id.clone(),
            document_id: document_id.to_string(),
            role: signer_role,
        });
        if let Some((from, to)) = status_change {
            tracing::info!(session_id = %session_id, document_id, %from, %to, "Document status changed");
            self.events.publish(NotaryEvent::DocumentStatusChanged {
                session_id: session_id.clone(),
                document_id: document_id.to_string(),
                from,
                to,
            });
        }
        if auto_completed {
            tracing::info!(session_id = %session_id, "All documents completed, session completed");
            self.events.publish(NotaryEvent::PhaseChanged {
                session_id,
                from: phase_before,
                to: SessionPhase::Completed,
            });
            self.notifier
                .phase_changed(&session, phase_before, SessionPhase::Completed);
        }

        Ok(signature)
    }

    /// Looks up a presented token and checks that it is still usable.
    async fn live_token(&self, token: &str, document_id: &str) -> Result<AccessToken> {
        let checked = match self.tokens.find(token).await? {
            None => Err(TokenRejection::Unknown),
            Some(found) => found
                .check(self.clock.now(), self.token_config.single_use)
                .map(|_| found),
        };
        checked.map_err(|reason| {
            tracing::warn!(document_id, %reason, "Signature rejected: unauthorized");
            NotaryError::Unauthorized
        })
    }

    /// Checks that the credentials grant `signer_role` on `document`.
    fn authorize(
        &self,
        record: &SessionRecord,
        document: &Document,
        auth: &SignerAuth,
        presented: Option<&AccessToken>,
        signer_role: SignerRole,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let rejection = match (auth, presented) {
            (SignerAuth::Token(_), Some(token)) => token
                .check_scope(&document.id, signer_role, now, self.token_config.single_use)
                .err()
                .map(|reason| reason.to_string()),
            (SignerAuth::Token(_), None) => Some(TokenRejection::Unknown.to_string()),
            (SignerAuth::Participant { session_id, role }, _) => {
                if session_id != record.id() {
                    Some("participant belongs to another session".to_string())
                } else if *role != signer_role {
                    Some(format!("participant is {role}, not {signer_role}"))
                } else if !record.session.has_role(*role) {
                    Some(format!("no {role} in session roster"))
                } else {
                    None
                }
            }
        };

        let rejection = rejection.or_else(|| {
            (!document.requires(signer_role))
                .then(|| format!("{signer_role} is not a required signer"))
        });

        match rejection {
            Some(reason) => {
                tracing::warn!(
                    document_id = %document.id,
                    role = %signer_role,
                    reason = %reason,
                    "Signature rejected: unauthorized"
                );
                Err(NotaryError::Unauthorized)
            }
            None => Ok(()),
        }
    }
}
