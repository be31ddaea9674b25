//! PIN login and admin bearer tokens

pub mod generator;
pub mod session;

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::models::{PinSet, DEFAULT_PIN};
use crate::storage::{Document, Documents, StoreError};

pub use generator::generate_token;
pub use session::{MemorySessionStore, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Unauthorized")]
    Unauthorized,
}

/// Validates PINs against the `pins` document and tracks issued tokens
#[derive(Clone)]
pub struct AccessGate {
    documents: Documents,
    sessions: Arc<dyn SessionStore>,
}

impl AccessGate {
    pub fn new(documents: Documents, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            documents,
            sessions,
        }
    }

    /// Exchange a PIN for a fresh admin token
    pub async fn login(&self, pin: Option<&str>) -> Result<String, AuthError> {
        let pin = pin
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        let pins = self
            .documents
            .read(Document::Pins, &PinSet::default())
            .await?;
        if !pins.contains(pin) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.sessions.issue(&token, Utc::now()).await;
        tracing::debug!("Issued admin token");
        Ok(token)
    }

    pub async fn authenticate(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized)?;
        match self.sessions.issued_at(token).await {
            Some(_) => Ok(()),
            None => Err(AuthError::Unauthorized),
        }
    }

    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.revoke(token).await
    }

    /// Whether the pins document still accepts the shipped default PIN
    pub async fn uses_default_pin(&self) -> Result<bool, AuthError> {
        let pins = self
            .documents
            .read(Document::Pins, &PinSet::default())
            .await?;
        Ok(pins.contains(DEFAULT_PIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_documents;
    use serde_json::json;

    fn gate(documents: Documents) -> AccessGate {
        AccessGate::new(documents, Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_default_pin_logs_in() {
        let (documents, _temp) = setup_documents();
        let gate = gate(documents);

        let token = gate.login(Some("1234")).await.unwrap();
        assert!(gate.authenticate(Some(&token)).await.is_ok());
        assert!(gate.uses_default_pin().await.unwrap());
    }

    #[tokio::test]
    async fn test_configured_pins_replace_default() {
        let (documents, _temp) = setup_documents();
        documents
            .put(Document::Pins, &json!({"pins": ["9876", 5555]}), None)
            .await
            .unwrap();
        let gate = gate(documents);

        assert!(gate.login(Some("9876")).await.is_ok());
        assert!(gate.login(Some("5555")).await.is_ok());
        assert!(matches!(
            gate.login(Some("1234")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(!gate.uses_default_pin().await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_or_missing_pin_is_rejected() {
        let (documents, _temp) = setup_documents();
        let gate = gate(documents);

        for pin in [None, Some(""), Some("   "), Some("0000"), Some("12345")] {
            assert!(matches!(
                gate.login(pin).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let (documents, _temp) = setup_documents();
        let gate = gate(documents);

        assert!(matches!(
            gate.authenticate(None).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            gate.authenticate(Some("deadbeef")).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let (documents, _temp) = setup_documents();
        let gate = gate(documents);

        let token = gate.login(Some("1234")).await.unwrap();
        assert!(gate.logout(&token).await);
        assert!(gate.authenticate(Some(&token)).await.is_err());
    }
}
