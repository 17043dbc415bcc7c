//! Root configuration model.
//!
//! Loaded from `config.toml` by `notary-infrastructure`'s `ConfigService`.
//! Every section is optional; missing keys take the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RootConfig {
    pub tokens: TokenConfig,
    pub sessions: SessionConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TokenConfig {
    /// TTL used when `issue_token` is called without one
    pub default_ttl_seconds: u64,
    /// Consume a token on its first accepted signature
    pub single_use: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 600,
            single_use: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Advance `signing -> completed` once every document completes
    pub auto_complete: bool,
    /// Require a positive identity check for every client before `document_review`
    pub require_verified_clients: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_complete: true,
            require_verified_clients: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Access links are `<base>?token=<token>`
    pub access_link_base_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            access_link_base_url: "https://notary.local/sign".to_string(),
        }
    }
}

impl NotificationConfig {
    pub fn access_link(&self, token: &str) -> String {
        format!("{}?token={}", self.access_link_base_url, token)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for TOML session files; in-memory storage when absent
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [tokens]
            single_use = false
            "#,
        )
        .unwrap();

        assert!(!config.tokens.single_use);
        assert_eq!(config.tokens.default_ttl_seconds, 600);
        assert!(config.sessions.auto_complete);
        assert_eq!(config.storage.data_dir, None);
    }

    #[test]
    fn test_access_link_appends_token() {
        let config = NotificationConfig::default();
        assert_eq!(config.access_link("abc"), "https://notary.local/sign?token=abc");
    }
}
