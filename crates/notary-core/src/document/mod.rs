//! Document domain module.
//!
//! Documents are owned by a session and persisted inside its
//! `SessionRecord`, so they have no repository of their own.

mod model;

pub use model::{Document, DocumentStatus};
