//! Blob storage boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque reference to bytes held by a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlobRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlobRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Descriptive metadata stored next to a blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub content_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl BlobMetadata {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            file_name: None,
        }
    }
}

/// Where document bodies and signature images live.
///
/// The core only ever keeps the returned [`BlobRef`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, metadata: BlobMetadata) -> Result<BlobRef>;

    async fn retrieve(&self, reference: &BlobRef) -> Result<Vec<u8>>;
}
