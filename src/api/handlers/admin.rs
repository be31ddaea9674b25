use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::catalog_error;
use crate::api::middleware::AdminToken;
use crate::api::response::{ApiError, AppJson, Success};
use crate::catalog::NewLink;
use crate::storage::models::pin_as_string;
use crate::tokens::AuthError;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// String or number
    #[serde(default)]
    pub pin: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddLinkResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveLinkResponse {
    pub removed: usize,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub enabled: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<Success<LoginResponse>>, ApiError> {
    let pin = req.pin.as_ref().and_then(pin_as_string);

    match state.gate.login(pin.as_deref()).await {
        Ok(token) => Ok(Success::json(LoginResponse { token })),
        Err(AuthError::Store(e)) => {
            tracing::error!(error = %e, "login failed");
            Err(ApiError::internal("login failed"))
        }
        Err(_) => Err(ApiError::unauthorized("invalid pin")),
    }
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(AdminToken(token)): Extension<AdminToken>,
) -> Json<Success<LogoutResponse>> {
    let revoked = state.gate.logout(&token).await;
    Success::json(LogoutResponse { revoked })
}

pub async fn add_link(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<AddLinkRequest>,
) -> Result<Json<Success<AddLinkResponse>>, ApiError> {
    let url = req
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing url"))?;

    let outcome = state
        .catalog
        .add(NewLink {
            favicon: req.favicon,
            title: req.title,
            url,
        })
        .await
        .map_err(|e| catalog_error(e, "add failed"))?;

    // The backfill handle is dropped; the task keeps running detached
    Ok(Success::json(AddLinkResponse { id: outcome.id }))
}

pub async fn remove_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Success<RemoveLinkResponse>>, ApiError> {
    let removed = state
        .catalog
        .remove(&id)
        .await
        .map_err(|e| catalog_error(e, "remove failed"))?;

    Ok(Success::json(RemoveLinkResponse { removed }))
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ToggleRequest>,
) -> Result<Json<Success<ToggleResponse>>, ApiError> {
    let enabled = req
        .enabled
        .as_ref()
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("enabled must be a boolean"))?;

    let enabled = state
        .catalog
        .set_enabled(enabled)
        .await
        .map_err(|e| catalog_error(e, "toggle failed"))?;

    Ok(Success::json(ToggleResponse { enabled }))
}
