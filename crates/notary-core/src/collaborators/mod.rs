//! Interfaces of the external collaborators this core consumes.
//!
//! Only the boundary is defined here; adapters live in
//! `notary-infrastructure`. Vendor response shapes never cross it.

mod blob;
mod identity;
mod notification;

pub use blob::{BlobMetadata, BlobRef, BlobStore};
pub use identity::{IdentityCheck, IdentityClaim, IdentityVerifier};
pub use notification::{NotificationChannel, NotificationRelay, NotificationTemplate};
