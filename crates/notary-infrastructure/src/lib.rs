//! Infrastructure adapters for the notarization core: TOML file and
//! in-memory repositories, configuration loading, and stand-in
//! collaborators.

pub mod config_service;
pub mod identity_verifier;
pub mod memory;
pub mod notification_relay;
pub mod paths;
pub mod storage;
pub mod toml_access_token_repository;
pub mod toml_session_repository;

pub use crate::config_service::ConfigService;
pub use crate::identity_verifier::StaticIdentityVerifier;
pub use crate::memory::{InMemoryAccessTokenRepository, InMemoryBlobStore, InMemorySessionRepository};
pub use crate::notification_relay::{Delivery, LoggingNotificationRelay};
pub use crate::paths::NotaryPaths;
pub use crate::toml_access_token_repository::TomlAccessTokenRepository;
pub use crate::toml_session_repository::TomlSessionRepository;
