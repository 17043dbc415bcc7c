//! Domain layer of the remote online notarization core.
//!
//! Models (sessions, documents, signatures, access tokens), the session phase
//! transition table, repository and collaborator interfaces, and the shared
//! error type. No I/O happens here.

pub mod access_token;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod repository;
pub mod role;
pub mod session;
pub mod signature;

// Re-export common types
pub use error::{NotaryError, Result};
pub use role::SignerRole;
