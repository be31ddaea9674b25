use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Where issued admin tokens are remembered.
///
/// The in-memory implementation forgets everything on restart; a persistent
/// or expiring store can be swapped in without touching the gate.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn issue(&self, token: &str, issued_at: DateTime<Utc>);

    async fn issued_at(&self, token: &str) -> Option<DateTime<Utc>>;

    /// Returns true if the token existed
    async fn revoke(&self, token: &str) -> bool;
}

/// Process-lifetime token map with no expiry
#[derive(Default)]
pub struct MemorySessionStore {
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue(&self, token: &str, issued_at: DateTime<Utc>) {
        self.tokens.write().await.insert(token.to_string(), issued_at);
    }

    async fn issued_at(&self, token: &str) -> Option<DateTime<Utc>> {
        self.tokens.read().await.get(token).copied()
    }

    async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_revoke() {
        let store = MemorySessionStore::new();
        let now = Utc::now();

        store.issue("tok", now).await;
        assert_eq!(store.issued_at("tok").await, Some(now));

        assert!(store.revoke("tok").await);
        assert!(store.issued_at("tok").await.is_none());
        assert!(!store.revoke("tok").await);
    }
}
