//! Configuration service.
//!
//! Loads the root configuration from `config.toml` (an explicit path, or
//! `<config_dir>/notary/config.toml`) and caches it.

use crate::paths::NotaryPaths;
use crate::storage::AtomicTomlFile;
use notary_core::config::RootConfig;
use notary_core::error::{NotaryError, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Loads and caches the root configuration.
///
/// A missing file yields the defaults; a file that does not parse is a
/// `Config` error rather than a silent fallback.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Uses the default configuration file location.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => NotaryPaths::config_file(),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load()?;

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    /// Writes `config` to the file and caches it.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        let path = self.config_path()?;
        AtomicTomlFile::<RootConfig>::new(path).save(config)?;

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(config.clone());
        Ok(())
    }

    fn load(&self) -> Result<RootConfig> {
        let path = self.config_path()?;
        let file = AtomicTomlFile::<RootConfig>::new(path.clone());

        match file.load() {
            Ok(Some(config)) => {
                tracing::debug!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(RootConfig::default())
            }
            Err(NotaryError::Serialization { message, .. }) => Err(NotaryError::config(format!(
                "{}: {}",
                path.display(),
                message
            ))),
            Err(e) => Err(e),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(service.get_config().unwrap(), RootConfig::default());
    }

    #[test]
    fn test_overrides_and_cache_invalidation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [tokens]
            default_ttl_seconds = 900

            [sessions]
            require_verified_clients = true
            "#,
        )
        .unwrap();

        let service = ConfigService::with_path(&path);
        let config = service.get_config().unwrap();
        assert_eq!(config.tokens.default_ttl_seconds, 900);
        assert!(config.tokens.single_use);
        assert!(config.sessions.require_verified_clients);

        fs::write(&path, "[tokens]\nsingle_use = false\n").unwrap();
        assert_eq!(service.get_config().unwrap().tokens.default_ttl_seconds, 900);

        service.invalidate_cache();
        let config = service.get_config().unwrap();
        assert!(!config.tokens.single_use);
        assert_eq!(config.tokens.default_ttl_seconds, 600);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[tokens\n").unwrap();

        let err = ConfigService::with_path(&path).get_config().unwrap_err();
        assert!(matches!(err, NotaryError::Config(_)));
    }

    #[test]
    fn test_save_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(&path);

        let mut config = RootConfig::default();
        config.notifications.access_link_base_url = "https://sign.example.com/s".into();
        service.save(&config).unwrap();

        let reloaded = ConfigService::with_path(&path).get_config().unwrap();
        assert_eq!(reloaded, config);
    }
}
