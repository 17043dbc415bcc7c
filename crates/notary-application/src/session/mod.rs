//! Session application services.
//!
//! This module contains the session aggregate cache (the per-session lock
//! owner) and the `SessionRegistry` use cases built on it.

mod registry;
mod store;

pub(crate) use registry::apply_phase;
pub use registry::SessionRegistry;
pub use store::{SessionHandle, SessionStore};
