//! Versioned JSON document storage
//!
//! A small fixed set of named JSON documents behind one capability trait.
//! Backends hand out an opaque [`Version`] with every read and reject writes
//! whose expected version is stale, which lets [`Documents::update`] run an
//! optimistic read-mutate-write loop without any other locking.

mod documents;
pub mod github;
pub mod local;
pub mod models;
pub mod retry;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

pub use documents::Documents;
pub use github::GitHubContentsStore;
pub use local::LocalFileStore;
pub use retry::{with_optimistic_update, Conflict, Mutation};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Document {0} is not valid JSON: {1}")]
    Malformed(Document, String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Version conflict on {0}")]
    VersionConflict(Document),
}

impl Conflict for StoreError {
    fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// The named documents the service persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Pins,
    State,
    Urls,
}

impl Document {
    /// Storage key (file name or repository path suffix)
    pub fn key(&self) -> &'static str {
        match self {
            Document::Pins => "pins.json",
            Document::State => "state.json",
            Document::Urls => "urls.json",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Opaque token identifying a document's current content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(token: impl Into<String>) -> Self {
        Version(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability shared by every persistence backend.
#[async_trait]
pub trait KeyedJsonStore: Send + Sync {
    /// Fetch a document, creating it with `initial` if it does not exist.
    async fn get_or_init(
        &self,
        doc: Document,
        initial: &Value,
    ) -> Result<(Value, Version), StoreError>;

    /// Replace a document's content.
    ///
    /// With `expected` set, fails with [`StoreError::VersionConflict`] unless
    /// it matches the current version. Without it the write is unconditional.
    async fn put(
        &self,
        doc: Document,
        value: &Value,
        expected: Option<&Version>,
    ) -> Result<Version, StoreError>;
}

/// Construct the backend selected by configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyedJsonStore>, StoreError> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalFileStore::open(&config.data_dir)?)),
        StorageBackend::GitHub => Ok(Arc::new(GitHubContentsStore::new(
            &config.github,
            std::time::Duration::from_secs(config.timeout_seconds),
        )?)),
    }
}
