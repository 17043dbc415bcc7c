//! Session repository trait.
//!
//! Defines the interface for session aggregate persistence operations.

use super::model::SessionRecord;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// The persisted unit is the [`SessionRecord`] aggregate: a session together
/// with every document it owns. Implementations do not need to provide their
/// own mutual exclusion for writers of the same session; the application
/// layer serializes them per session.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session aggregate by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SessionRecord))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Finds the ID of the session that owns a document.
    async fn find_session_id_by_document(&self, document_id: &str) -> Result<Option<String>>;

    /// Saves a session aggregate, replacing any previous version.
    async fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Deletes a session aggregate (no-op when it does not exist).
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored session aggregates.
    async fn list_all(&self) -> Result<Vec<SessionRecord>>;
}
