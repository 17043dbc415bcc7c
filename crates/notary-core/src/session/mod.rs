//! Session domain module.
//!
//! This module contains all session-related domain models, the phase
//! transition table and the repository interface.
//!
//! # Module Structure
//!
//! - `phase`: Session phases and the transition table (`SessionPhase`)
//! - `participant`: Roster entries (`Participant`, `ParticipantIdentity`, `ContactInfo`)
//! - `model`: Core session model (`Session`) and its aggregate (`SessionRecord`)
//! - `repository`: Repository trait for aggregate persistence
//!
//! # Usage
//!
//! ```ignore
//! use notary_core::session::{Session, SessionPhase, SessionRecord, SessionRepository};
//! use notary_core::session::{ContactInfo, Participant, ParticipantIdentity};
//! ```

mod model;
mod participant;
mod phase;
mod repository;

// Re-export public API
pub use model::{Session, SessionRecord};
pub use participant::{ContactInfo, IdentityVerification, Participant, ParticipantIdentity};
pub use phase::SessionPhase;
pub use repository::SessionRepository;
