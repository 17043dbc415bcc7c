//! Application layer for the notarization core.
//!
//! This crate provides the use cases (session registry, document coordination,
//! signature collection and access tokens) on top of the domain layer in
//! `notary-core`. Storage and collaborators are injected as trait objects.

pub mod access_token_issuer;
pub mod document_coordinator;
pub mod events;
pub mod notifier;
pub mod services;
pub mod session;
pub mod signature_collector;

#[cfg(test)]
mod test_support;

pub use access_token_issuer::{AccessTokenIssuer, OpenedDocument};
pub use document_coordinator::{DocumentContent, DocumentCoordinator};
pub use events::EventBus;
pub use notifier::NotificationDispatcher;
pub use services::{NotaryDependencies, NotaryServices};
pub use session::{SessionRegistry, SessionStore};
pub use signature_collector::{SignatureCollector, SignerAuth};
