use notary_core::error::{NotaryError, Result};
use notary_core::session::{SessionRecord, SessionRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Handle to one session aggregate; holding its lock serializes every
/// mutation of that session and of the documents it owns.
pub type SessionHandle = Arc<Mutex<SessionRecord>>;

/// In-memory cache of session aggregates in front of a [`SessionRepository`].
///
/// Each session gets exactly one [`SessionHandle`] for the lifetime of the
/// store, so the per-session mutex is the single point of mutual exclusion
/// for phase transitions, document changes and signature commits.
///
/// Writes go to the repository first and only then replace the cached
/// aggregate, so a failed write leaves the previous state observable.
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    /// Loaded aggregates by session ID
    sessions: RwLock<HashMap<String, SessionHandle>>,
    /// Owning session ID by document ID
    document_index: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            sessions: RwLock::new(HashMap::new()),
            document_index: RwLock::new(HashMap::new()),
        }
    }

    /// Persists a brand-new aggregate and caches it.
    pub async fn insert(&self, record: SessionRecord) -> Result<SessionHandle> {
        self.repository.save(&record).await?;

        let session_id = record.id().to_string();
        self.index_documents(&record).await;

        let handle = Arc::new(Mutex::new(record));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, handle.clone());
        Ok(handle)
    }

    /// Gets the handle for a session, loading it from the repository on a miss.
    ///
    /// # Errors
    ///
    /// `NotFound` when the repository has no such session.
    pub async fn handle(&self, session_id: &str) -> Result<SessionHandle> {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(session_id) {
                return Ok(handle.clone());
            }
        }

        // Load under the write lock so concurrent misses share one handle.
        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(session_id) {
            return Ok(handle.clone());
        }

        let record = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| NotaryError::not_found("session", session_id))?;
        self.index_documents(&record).await;

        let handle = Arc::new(Mutex::new(record));
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Resolves the session owning a document and returns its handle.
    pub async fn handle_for_document(&self, document_id: &str) -> Result<(String, SessionHandle)> {
        let session_id = self.session_id_for_document(document_id).await?;
        let handle = self.handle(&session_id).await?;
        Ok((session_id, handle))
    }

    async fn session_id_for_document(&self, document_id: &str) -> Result<String> {
        {
            let index = self.document_index.read().await;
            if let Some(session_id) = index.get(document_id) {
                return Ok(session_id.clone());
            }
        }

        let session_id = self
            .repository
            .find_session_id_by_document(document_id)
            .await?
            .ok_or_else(|| NotaryError::not_found("document", document_id))?;

        let mut index = self.document_index.write().await;
        index.insert(document_id.to_string(), session_id.clone());
        Ok(session_id)
    }

    /// Persists `next` and makes it the current aggregate behind `current`.
    ///
    /// Must be called with the session's lock held (`current` is the guarded value).
    pub async fn commit(&self, current: &mut SessionRecord, next: SessionRecord) -> Result<()> {
        self.repository.save(&next).await?;
        self.index_documents(&next).await;
        *current = next;
        Ok(())
    }

    /// A consistent copy of one aggregate.
    pub async fn snapshot(&self, session_id: &str) -> Result<SessionRecord> {
        let handle = self.handle(session_id).await?;
        let record = handle.lock().await;
        Ok(record.clone())
    }

    /// Every stored aggregate. Cached aggregates are authoritative for the
    /// sessions they cover.
    pub async fn list(&self) -> Result<Vec<SessionRecord>> {
        let mut records = self.repository.list_all().await?;
        let cached: Vec<(usize, SessionHandle)> = {
            let sessions = self.sessions.read().await;
            records
                .iter()
                .enumerate()
                .filter_map(|(i, r)| sessions.get(r.id()).map(|h| (i, h.clone())))
                .collect()
        };
        for (i, handle) in cached {
            records[i] = handle.lock().await.clone();
        }
        Ok(records)
    }

    async fn index_documents(&self, record: &SessionRecord) {
        if record.documents.is_empty() {
            return;
        }
        let mut index = self.document_index.write().await;
        for document_id in record.documents.keys() {
            index
                .entry(document_id.clone())
                .or_insert_with(|| record.id().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemorySessions;
    use chrono::Utc;
    use notary_core::session::{ParticipantIdentity, Session, SessionPhase};

    fn record(id: &str) -> SessionRecord {
        SessionRecord::new(Session::new(
            id.to_string(),
            ParticipantIdentity::new("Notary Public"),
            Utc::now(),
        ))
    }

    #[tokio::test]
    async fn test_handle_loads_from_repository_once() {
        let repo = Arc::new(InMemorySessions::default());
        repo.save(&record("s-1")).await.unwrap();
        let store = SessionStore::new(repo);

        let a = store.handle("s-1").await.unwrap();
        let b = store.handle("s-1").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let store = SessionStore::new(Arc::new(InMemorySessions::default()));
        let err = store.handle("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_state() {
        let repo = Arc::new(InMemorySessions::default());
        let store = SessionStore::new(repo.clone());
        let handle = store.insert(record("s-1")).await.unwrap();

        repo.fail_writes(true);
        let mut guard = handle.lock().await;
        let mut next = guard.clone();
        next.session.phase = SessionPhase::IdentityVerification;

        assert!(store.commit(&mut guard, next).await.is_err());
        assert_eq!(guard.session.phase, SessionPhase::Waiting);
    }
}
