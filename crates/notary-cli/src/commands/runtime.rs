//! Storage backend selection and service wiring for CLI commands.

use anyhow::{Context, Result};
use notary_application::{NotaryDependencies, NotaryServices};
use notary_core::collaborators::{BlobStore, IdentityVerifier, NotificationRelay};
use notary_core::config::RootConfig;
use notary_core::repository::{AccessTokenRepository, SessionRepository};
use notary_infrastructure::{
    ConfigService, InMemoryAccessTokenRepository, InMemorySessionRepository,
    TomlAccessTokenRepository, TomlSessionRepository,
};
use std::path::PathBuf;
use std::sync::Arc;

pub fn config_service(path: Option<PathBuf>) -> ConfigService {
    match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    }
}

/// Repositories for `storage.data_dir`, or in-memory ones when it is unset.
pub fn repositories(
    config: &RootConfig,
) -> Result<(Arc<dyn SessionRepository>, Arc<dyn AccessTokenRepository>)> {
    match &config.storage.data_dir {
        Some(dir) => {
            let sessions = TomlSessionRepository::new(dir)
                .with_context(|| format!("Failed to open session storage at {}", dir.display()))?;
            tracing::info!(data_dir = %dir.display(), "Using TOML storage");
            Ok((
                Arc::new(sessions),
                Arc::new(TomlAccessTokenRepository::new(dir)),
            ))
        }
        None => {
            tracing::info!("Using in-memory storage");
            Ok((
                Arc::new(InMemorySessionRepository::new()),
                Arc::new(InMemoryAccessTokenRepository::new()),
            ))
        }
    }
}

pub fn services(
    config: &RootConfig,
    blobs: Arc<dyn BlobStore>,
    relay: Arc<dyn NotificationRelay>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<NotaryServices> {
    let (sessions, tokens) = repositories(config)?;
    let deps = NotaryDependencies::new(sessions, tokens, blobs)
        .with_relay(relay)
        .with_identity_verifier(verifier);
    Ok(NotaryServices::new(config, deps))
}
