//! Repository trait re-exports.
//!
//! This module provides centralized access to all repository traits.

pub use crate::access_token::AccessTokenRepository;
pub use crate::session::SessionRepository;
