//! linkboard - A tiny backend for a curated, rotating list of links
//!
//! This crate provides:
//! - A public listing and resolution API gated by a global on/off switch
//! - PIN login issuing opaque admin bearer tokens
//! - Best-effort page title/favicon scraping for new links
//! - Versioned JSON document storage (local files or the GitHub contents API)
//!   with optimistic read-mutate-write retries

pub mod api;
pub mod catalog;
pub mod config;
pub mod probe;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod tokens;

use std::sync::Arc;

use catalog::LinkCatalog;
use config::Config;
use probe::MetadataProbe;
use storage::{Documents, KeyedJsonStore};
use tokens::{AccessGate, SessionStore};

/// Shared application state
pub struct AppState {
    pub catalog: LinkCatalog,
    pub config: Config,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn KeyedJsonStore>,
        probe: Arc<dyn MetadataProbe>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let documents = Documents::new(store, config.storage.max_retries);
        Self {
            catalog: LinkCatalog::new(documents.clone(), probe),
            config,
            gate: AccessGate::new(documents, sessions),
        }
    }
}
