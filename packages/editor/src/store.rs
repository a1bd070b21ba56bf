//! # Version Store
//!
//! Append-only persistence for rendered snapshots. The controller talks to
//! a [`VersionStore`]; the server hosts a [`MemoryVersionStore`] and remote
//! clients use an HTTP implementation of the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Immutable snapshot of rendered document content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

/// Request to append a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NewVersion {
    pub fn new(content: impl Into<String>, name: Option<String>) -> Self {
        Self {
            content: content.into(),
            name,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Version store unavailable: {0}")]
    Unavailable(String),

    #[error("Version store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from version store: {0}")]
    InvalidResponse(String),

    #[error("Version content is required")]
    MissingContent,
}

#[async_trait]
pub trait VersionStore: Send + Sync {
    /// All versions in creation order
    async fn list(&self) -> Result<Vec<Version>, StoreError>;

    /// Append a version; the store assigns id and timestamp
    async fn create(&self, version: NewVersion) -> Result<Version, StoreError>;
}

/// Process-scoped in-memory store
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    versions: RwLock<Vec<Version>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn list(&self) -> Result<Vec<Version>, StoreError> {
        Ok(self.versions.read().clone())
    }

    async fn create(&self, version: NewVersion) -> Result<Version, StoreError> {
        if version.content.trim().is_empty() {
            return Err(StoreError::MissingContent);
        }

        let version = Version {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            name: version.name,
            content: version.content,
        };
        debug!(id = %version.id, name = ?version.name, "version stored");

        self.versions.write().push(version.clone());
        Ok(version)
    }
}
