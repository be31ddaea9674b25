//! The curated link list and the global access switch
//!
//! Every write to the `urls` document goes through [`Documents::update`], so
//! concurrent admin actions are merged by the optimistic retry rather than
//! overwriting each other.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::probe::{MetadataProbe, PageMeta};
use crate::storage::models::{LinkCatalogDocument, LinkRecord, ServiceState};
use crate::storage::{Document, Documents, Mutation, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Access is disabled")]
    AccessDisabled,
    #[error("Link not found")]
    NotFound,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Public projection of a [`LinkRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicLink {
    pub favicon: String,
    pub id: String,
    pub title: String,
    pub url: String,
}

impl From<&LinkRecord> for PublicLink {
    fn from(record: &LinkRecord) -> Self {
        Self {
            favicon: record.favicon.clone(),
            id: record.id.clone(),
            title: record.title.clone(),
            url: record.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub favicon: Option<String>,
    pub title: Option<String>,
    pub url: String,
}

/// Result of [`LinkCatalog::add`]
pub struct AddOutcome {
    /// Metadata backfill, present when title or favicon was not supplied.
    /// Dropping the handle detaches the task.
    pub backfill: Option<JoinHandle<()>>,
    pub id: String,
}

#[derive(Clone)]
pub struct LinkCatalog {
    documents: Documents,
    probe: Arc<dyn MetadataProbe>,
}

impl LinkCatalog {
    pub fn new(documents: Documents, probe: Arc<dyn MetadataProbe>) -> Self {
        Self { documents, probe }
    }

    pub fn probe(&self) -> &Arc<dyn MetadataProbe> {
        &self.probe
    }

    /// Current access switch and (optionally including inactive) links
    pub async fn list(
        &self,
        include_inactive: bool,
    ) -> Result<(bool, Vec<PublicLink>), CatalogError> {
        let (state, catalog) = tokio::try_join!(self.state(), self.catalog())?;

        let links = catalog
            .urls
            .iter()
            .filter(|r| include_inactive || r.active)
            .map(PublicLink::from)
            .collect();

        Ok((state.enabled, links))
    }

    pub async fn resolve(&self, id: &str) -> Result<PublicLink, CatalogError> {
        if !self.state().await?.enabled {
            return Err(CatalogError::AccessDisabled);
        }

        self.catalog()
            .await?
            .urls
            .iter()
            .find(|r| r.active && r.id == id)
            .map(PublicLink::from)
            .ok_or(CatalogError::NotFound)
    }

    /// Append a link; spawns a metadata backfill if title or favicon is missing
    pub async fn add(&self, link: NewLink) -> Result<AddOutcome, CatalogError> {
        let id = uuid::Uuid::new_v4().to_string();
        let title = non_blank(link.title);
        let favicon = non_blank(link.favicon);
        let needs_backfill = title.is_none() || favicon.is_none();

        let record = LinkRecord {
            active: true,
            created_at: Utc::now(),
            favicon: favicon.unwrap_or_default(),
            id: id.clone(),
            title: title.unwrap_or_default(),
            url: link.url,
        };

        self.documents
            .update(Document::Urls, &LinkCatalogDocument::default(), |doc| {
                doc.urls.push(record.clone());
                Mutation::Write(())
            })
            .await?;
        tracing::debug!(id = %id, url = %record.url, "Added link");

        let backfill = needs_backfill.then(|| {
            let catalog = self.clone();
            let id = id.clone();
            let url = record.url.clone();
            tokio::spawn(async move { catalog.backfill(&id, &url).await })
        });

        Ok(AddOutcome { backfill, id })
    }

    /// Probe `url` and fill in whichever of title/favicon is still empty
    async fn backfill(&self, id: &str, url: &str) {
        let meta: PageMeta = self.probe.probe(url).await;

        let result = self
            .documents
            .update(Document::Urls, &LinkCatalogDocument::default(), |doc| {
                let Some(record) = doc.find_mut(id) else {
                    return Mutation::Skip(false);
                };
                let mut changed = false;
                if record.title.is_empty() && !meta.title.is_empty() {
                    record.title = meta.title.clone();
                    changed = true;
                }
                if record.favicon.is_empty() && !meta.favicon.is_empty() {
                    record.favicon = meta.favicon.clone();
                    changed = true;
                }
                if changed {
                    Mutation::Write(true)
                } else {
                    Mutation::Skip(false)
                }
            })
            .await;

        match result {
            Ok(true) => tracing::debug!(id = %id, "Backfilled link metadata"),
            Ok(false) => tracing::debug!(id = %id, "Nothing to backfill"),
            Err(e) => tracing::warn!(id = %id, error = %e, "Metadata backfill failed"),
        }
    }

    /// Remove a link by id; returns how many records were removed (0 or 1)
    pub async fn remove(&self, id: &str) -> Result<usize, CatalogError> {
        let removed = self
            .documents
            .update(Document::Urls, &LinkCatalogDocument::default(), |doc| {
                let before = doc.urls.len();
                doc.urls.retain(|r| r.id != id);
                match before - doc.urls.len() {
                    0 => Mutation::Skip(0),
                    n => Mutation::Write(n),
                }
            })
            .await?;

        if removed > 0 {
            tracing::debug!(id = %id, "Removed link");
        }
        Ok(removed)
    }

    /// Overwrite the access switch
    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, CatalogError> {
        self.documents
            .put(Document::State, &ServiceState { enabled }, None)
            .await?;
        tracing::debug!(enabled, "Access switch updated");
        Ok(enabled)
    }

    async fn state(&self) -> Result<ServiceState, StoreError> {
        self.documents
            .read(Document::State, &ServiceState::default())
            .await
    }

    async fn catalog(&self) -> Result<LinkCatalogDocument, StoreError> {
        self.documents
            .read(Document::Urls, &LinkCatalogDocument::default())
            .await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_record, setup_documents, StubProbe};

    fn catalog(documents: Documents) -> LinkCatalog {
        let probe = StubProbe::new("Stub Title", "https://stub.example/icon.png");
        LinkCatalog::new(documents, Arc::new(probe))
    }

    fn link(url: &str) -> NewLink {
        NewLink {
            url: url.to_string(),
            ..Default::default()
        }
    }

    async fn seed(documents: &Documents, records: Vec<LinkRecord>) {
        documents
            .put(Document::Urls, &LinkCatalogDocument { urls: records }, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let (documents, _temp) = setup_documents();
        let (enabled, links) = catalog(documents).list(false).await.unwrap();
        assert!(enabled);
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_list_hides_inactive_unless_asked() {
        let (documents, _temp) = setup_documents();
        let mut hidden = make_record("b", "https://b.example");
        hidden.active = false;
        seed(&documents, vec![make_record("a", "https://a.example"), hidden]).await;
        let catalog = catalog(documents);

        let (_, visible) = catalog.list(false).await.unwrap();
        assert_eq!(visible.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), ["a"]);

        let (_, all) = catalog.list(true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_disabled_wins_over_missing() {
        let (documents, _temp) = setup_documents();
        seed(&documents, vec![make_record("a", "https://a.example")]).await;
        let catalog = catalog(documents);
        catalog.set_enabled(false).await.unwrap();

        assert!(matches!(catalog.resolve("a").await, Err(CatalogError::AccessDisabled)));
        assert!(matches!(catalog.resolve("zzz").await, Err(CatalogError::AccessDisabled)));

        // Listing is never gated
        let (enabled, links) = catalog.list(false).await.unwrap();
        assert!(!enabled);
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_ignores_inactive_records() {
        let (documents, _temp) = setup_documents();
        let mut hidden = make_record("b", "https://b.example");
        hidden.active = false;
        seed(&documents, vec![hidden]).await;

        assert!(matches!(catalog(documents).resolve("b").await, Err(CatalogError::NotFound)));
    }

    #[tokio::test]
    async fn test_explicit_metadata_is_kept() {
        let (documents, _temp) = setup_documents();
        let catalog = catalog(documents);

        let outcome = catalog
            .add(NewLink {
                favicon: Some("F".to_string()),
                title: Some("T".to_string()),
                url: "https://t.example".to_string(),
            })
            .await
            .unwrap();
        assert!(outcome.backfill.is_none());

        let link = catalog.resolve(&outcome.id).await.unwrap();
        assert_eq!(
            link,
            PublicLink {
                favicon: "F".to_string(),
                id: outcome.id.clone(),
                title: "T".to_string(),
                url: "https://t.example".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_backfill_fills_only_missing_fields() {
        let (documents, _temp) = setup_documents();
        let catalog = catalog(documents);

        let outcome = catalog
            .add(NewLink {
                title: Some("Mine".to_string()),
                ..link("https://m.example")
            })
            .await
            .unwrap();
        outcome.backfill.expect("backfill spawned").await.unwrap();

        let link = catalog.resolve(&outcome.id).await.unwrap();
        assert_eq!(link.title, "Mine");
        assert_eq!(link.favicon, "https://stub.example/icon.png");
    }

    #[tokio::test]
    async fn test_backfill_after_remove_is_dropped() {
        let (documents, _temp) = setup_documents();
        let catalog = catalog(documents);

        let outcome = catalog.add(link("https://gone.example")).await.unwrap();
        assert_eq!(catalog.remove(&outcome.id).await.unwrap(), 1);
        outcome.backfill.unwrap().await.unwrap();

        let (_, all) = catalog.list(true).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (documents, _temp) = setup_documents();
        let catalog = catalog(documents);

        let id = catalog.add(link("https://r.example")).await.unwrap().id;
        assert_eq!(catalog.remove(&id).await.unwrap(), 1);
        assert_eq!(catalog.remove(&id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let (documents, _temp) = setup_documents();
        let catalog = catalog(documents);

        let first = catalog.add(link("https://1.example")).await.unwrap().id;
        let second = catalog.add(link("https://2.example")).await.unwrap().id;

        let (_, all) = catalog.list(true).await.unwrap();
        assert_eq!(all.iter().map(|l| l.id.clone()).collect::<Vec<_>>(), [first, second]);
    }
}
