//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;

use crate::probe::{MetadataProbe, PageMeta};
use crate::storage::models::LinkRecord;
use crate::storage::{Documents, LocalFileStore};

/// Typed documents over a fresh local store in a temporary directory.
///
/// Returns both the `Documents` and the `TempDir` guard; the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_documents() -> (Documents, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = LocalFileStore::open(temp_dir.path()).unwrap();
    (Documents::new(Arc::new(store), 1), temp_dir)
}

/// Probe that answers immediately with fixed metadata
pub struct StubProbe {
    meta: PageMeta,
}

impl StubProbe {
    pub fn new(title: &str, favicon: &str) -> Self {
        Self {
            meta: PageMeta {
                favicon: favicon.to_string(),
                title: title.to_string(),
            },
        }
    }
}

#[async_trait]
impl MetadataProbe for StubProbe {
    async fn probe(&self, _url: &str) -> PageMeta {
        self.meta.clone()
    }
}

/// Create an active `LinkRecord` with the given id and url.
pub fn make_record(id: &str, url: &str) -> LinkRecord {
    LinkRecord {
        active: true,
        created_at: Utc::now(),
        favicon: String::new(),
        id: id.to_string(),
        title: format!("title-{id}"),
        url: url.to_string(),
    }
}
