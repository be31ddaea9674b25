//! Local filesystem backend
//!
//! One pretty-printed JSON file per document. The version token is the
//! SHA-256 of the file bytes, so any out-of-band edit also invalidates
//! outstanding versions. A process-wide mutex makes each compare-and-write
//! atomic with respect to other writers in this process.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{Document, KeyedJsonStore, StoreError, Version};

pub struct LocalFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl LocalFileStore {
    /// Open (creating if needed) a store rooted at `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        Ok(Self {
            dir: data_dir.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    fn path(&self, doc: Document) -> PathBuf {
        self.dir.join(doc.key())
    }

    async fn read_bytes(&self, doc: Document) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path(doc)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_bytes(&self, doc: Document, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path(doc);
        let tmp = target.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

fn version_of(bytes: &[u8]) -> Version {
    Version::new(hex::encode(Sha256::digest(bytes)))
}

fn encode(value: &Value) -> Result<Vec<u8>, StoreError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[async_trait]
impl KeyedJsonStore for LocalFileStore {
    async fn get_or_init(
        &self,
        doc: Document,
        initial: &Value,
    ) -> Result<(Value, Version), StoreError> {
        let _guard = self.lock.lock().await;

        match self.read_bytes(doc).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Malformed(doc, e.to_string()))?;
                Ok((value, version_of(&bytes)))
            }
            None => {
                let bytes = encode(initial)?;
                self.write_bytes(doc, &bytes).await?;
                tracing::debug!(document = %doc, "Initialized missing document");
                Ok((initial.clone(), version_of(&bytes)))
            }
        }
    }

    async fn put(
        &self,
        doc: Document,
        value: &Value,
        expected: Option<&Version>,
    ) -> Result<Version, StoreError> {
        let _guard = self.lock.lock().await;

        if let Some(expected) = expected {
            let current = self.read_bytes(doc).await?.map(|b| version_of(&b));
            if current.as_ref() != Some(expected) {
                return Err(StoreError::VersionConflict(doc));
            }
        }

        let bytes = encode(value)?;
        self.write_bytes(doc, &bytes).await?;
        Ok(version_of(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_store() -> (LocalFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_get_or_init_creates_file() {
        let (store, temp) = setup_store();
        let initial = json!({"enabled": true});

        let (value, version) = store.get_or_init(Document::State, &initial).await.unwrap();
        assert_eq!(value, initial);
        assert!(temp.path().join("state.json").exists());

        // A second read returns the same version
        let (_, again) = store.get_or_init(Document::State, &json!({})).await.unwrap();
        assert_eq!(version, again);
    }

    #[tokio::test]
    async fn test_put_with_stale_version_conflicts() {
        let (store, _temp) = setup_store();
        let (_, v1) = store
            .get_or_init(Document::Urls, &json!({"urls": []}))
            .await
            .unwrap();

        let v2 = store
            .put(Document::Urls, &json!({"urls": [1]}), Some(&v1))
            .await
            .unwrap();
        assert_ne!(v1, v2);

        let err = store
            .put(Document::Urls, &json!({"urls": [2]}), Some(&v1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(Document::Urls)));
    }

    #[tokio::test]
    async fn test_expected_version_on_missing_document_conflicts() {
        let (store, _temp) = setup_store();
        let err = store
            .put(Document::Pins, &json!({"pins": []}), Some(&Version::new("abc")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));
    }

    #[tokio::test]
    async fn test_unconditional_put_overwrites() {
        let (store, _temp) = setup_store();
        store
            .get_or_init(Document::State, &json!({"enabled": true}))
            .await
            .unwrap();
        store
            .put(Document::State, &json!({"enabled": false}), None)
            .await
            .unwrap();

        let (value, _) = store.get_or_init(Document::State, &json!({})).await.unwrap();
        assert_eq!(value, json!({"enabled": false}));
    }

    #[tokio::test]
    async fn test_malformed_file_is_reported() {
        let (store, temp) = setup_store();
        std::fs::write(temp.path().join("pins.json"), b"{not json").unwrap();

        let err = store
            .get_or_init(Document::Pins, &json!({"pins": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed(Document::Pins, _)));
    }
}
