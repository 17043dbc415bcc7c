//! TOML-based SessionRepository implementation

use crate::paths::NotaryPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use notary_core::error::{NotaryError, Result};
use notary_core::session::{SessionRecord, SessionRepository};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u32 = 1;

/// On-disk envelope of one session aggregate.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    schema_version: u32,
    record: SessionRecord,
}

/// Stores each session aggregate (session plus its documents) as one TOML
/// file:
///
/// ```text
/// base_dir/
/// └── sessions/
///     ├── <session-id-1>.toml
///     └── <session-id-2>.toml
/// ```
///
/// File I/O runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct TomlSessionRepository {
    sessions_dir: PathBuf,
}

impl TomlSessionRepository {
    /// Creates the repository, creating `base_dir/sessions` if needed.
    ///
    /// # Errors
    ///
    /// Returns `DataAccess` if the directory cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let sessions_dir = NotaryPaths::sessions_dir(base_dir.as_ref());
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    /// Creates the repository under the platform data directory.
    pub fn default_location() -> Result<Self> {
        Self::new(NotaryPaths::data_dir()?)
    }

    fn session_file(&self, session_id: &str) -> Result<AtomicTomlFile<SessionFile>> {
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(NotaryError::data_access(format!(
                "invalid session id for file storage: '{session_id}'"
            )));
        }
        Ok(AtomicTomlFile::new(
            self.sessions_dir.join(format!("{session_id}.toml")),
        ))
    }

    fn load_all(sessions_dir: &Path) -> Result<Vec<SessionRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(sessions_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match AtomicTomlFile::<SessionFile>::new(path.clone()).load() {
                Ok(Some(file)) => records.push(file.record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }
        Ok(records)
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| NotaryError::internal(format!("storage task failed: {e}")))?
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let file = self.session_file(session_id)?;
        let loaded = blocking(move || file.load()).await?;
        Ok(loaded.map(|f| f.record))
    }

    async fn find_session_id_by_document(&self, document_id: &str) -> Result<Option<String>> {
        let sessions_dir = self.sessions_dir.clone();
        let records = blocking(move || Self::load_all(&sessions_dir)).await?;
        Ok(records
            .into_iter()
            .find(|r| r.documents.contains_key(document_id))
            .map(|r| r.id().to_string()))
    }

    async fn save(&self, record: &SessionRecord) -> Result<()> {
        let file = self.session_file(record.id())?;
        let envelope = SessionFile {
            schema_version: SCHEMA_VERSION,
            record: record.clone(),
        };
        blocking(move || file.save(&envelope)).await?;
        tracing::trace!(session_id = %record.id(), "Session saved");
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let file = self.session_file(session_id)?;
        blocking(move || file.remove()).await
    }

    async fn list_all(&self) -> Result<Vec<SessionRecord>> {
        let sessions_dir = self.sessions_dir.clone();
        blocking(move || Self::load_all(&sessions_dir)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use notary_core::SignerRole;
    use notary_core::collaborators::BlobRef;
    use notary_core::document::{Document, DocumentStatus};
    use notary_core::session::{
        ContactInfo, IdentityVerification, Participant, ParticipantIdentity, Session, SessionPhase,
    };
    use notary_core::signature::{Signature, SignerInfo};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn sample_record() -> SessionRecord {
        let now = Utc::now();
        let mut session = Session::new(
            "3f2a9c4e-0000-4000-8000-000000000001".into(),
            ParticipantIdentity::new("Notary Public"),
            now,
        );
        session.phase = SessionPhase::Signing;
        let mut client = Participant::new(
            SignerRole::Client,
            ParticipantIdentity::new("Ana Pérez").with_contact(ContactInfo::email("ana@example.com")),
        );
        client.identity_verification = Some(IdentityVerification {
            verified: true,
            score: 0.93,
            checked_at: now,
        });
        session.participants.push(client);

        let mut record = SessionRecord::new(session);
        let mut document = Document::new(
            "doc-1".into(),
            record.id().to_string(),
            "Power of attorney".into(),
            BTreeSet::from([SignerRole::Client, SignerRole::Certifier]),
            BlobRef::new("blob-1"),
            now,
        );
        document.status = DocumentStatus::PendingSignature;
        document.signatures.push(Signature {
            signer_role: SignerRole::Client,
            signer_info: SignerInfo::named("Ana Pérez"),
            image_ref: BlobRef::new("img-1"),
            signed_at: now,
        });
        record.attach_document(document, now);
        record
    }

    #[tokio::test]
    async fn test_round_trip_aggregate() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlSessionRepository::new(temp_dir.path()).unwrap();
        let record = sample_record();

        repo.save(&record).await.unwrap();
        let loaded = repo.find_by_id(record.id()).await.unwrap().unwrap();

        assert_eq!(loaded, record);
        assert_eq!(
            repo.find_session_id_by_document("doc-1").await.unwrap().as_deref(),
            Some(record.id())
        );
        assert!(repo.find_session_id_by_document("doc-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlSessionRepository::new(temp_dir.path()).unwrap();
        let record = sample_record();
        repo.save(&record).await.unwrap();
        fs::write(temp_dir.path().join("sessions").join("notes.txt"), "ignored").unwrap();

        assert_eq!(repo.list_all().await.unwrap().len(), 1);

        repo.delete(record.id()).await.unwrap();
        assert!(repo.find_by_id(record.id()).await.unwrap().is_none());
        repo.delete(record.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repo = TomlSessionRepository::new(temp_dir.path()).unwrap();
        let err = repo.find_by_id("../escape").await.unwrap_err();
        assert!(matches!(err, NotaryError::DataAccess(_)));
    }
}
