use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::retry::{with_optimistic_update, Mutation};
use super::{Document, KeyedJsonStore, StoreError, Version};

/// Typed access to the JSON documents of a [`KeyedJsonStore`].
#[derive(Clone)]
pub struct Documents {
    max_retries: u32,
    store: Arc<dyn KeyedJsonStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn KeyedJsonStore>, max_retries: u32) -> Self {
        Self { max_retries, store }
    }

    pub async fn get_or_init<T>(
        &self,
        doc: Document,
        initial: &T,
    ) -> Result<(T, Version), StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let initial = serde_json::to_value(initial)?;
        let (value, version) = self.store.get_or_init(doc, &initial).await?;
        let typed = serde_json::from_value(value)
            .map_err(|e| StoreError::Malformed(doc, e.to_string()))?;
        Ok((typed, version))
    }

    pub async fn read<T>(&self, doc: Document, initial: &T) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.get_or_init(doc, initial).await.map(|(value, _)| value)
    }

    pub async fn put<T>(
        &self,
        doc: Document,
        value: &T,
        expected: Option<&Version>,
    ) -> Result<Version, StoreError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)?;
        self.store.put(doc, &value, expected).await
    }

    /// Read-mutate-write `doc`, retrying on version conflicts.
    ///
    /// `mutate` may run more than once, each time on a freshly read value.
    pub async fn update<T, R, F>(
        &self,
        doc: Document,
        initial: &T,
        mutate: F,
    ) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(&mut T) -> Mutation<R>,
    {
        with_optimistic_update(
            move || self.get_or_init(doc, initial),
            mutate,
            move |value: T, version: Version| async move {
                self.put(doc, &value, Some(&version)).await
            },
            self.max_retries,
        )
        .await
    }
}
