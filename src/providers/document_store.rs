//! Document store trait and local filesystem implementation

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Read-only access to stored source documents
///
/// The store is shared across concurrent requests but never written by the
/// pipeline; each request reads one distinct location.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve a storage location to raw bytes
    async fn fetch(&self, location: &str) -> Result<Vec<u8>>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Filesystem-backed document store rooted at a directory
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a location to a path under the root, rejecting traversal
    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location);
        let escapes = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(Error::DocumentUnavailable(format!(
                "location '{}' escapes the store root",
                location
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.resolve(location)?;
        tokio::fs::read(&path).await.map_err(|e| {
            Error::DocumentUnavailable(format!("'{}': {}", location, e))
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}
