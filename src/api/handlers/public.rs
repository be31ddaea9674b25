use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::catalog_error;
use crate::api::response::{ApiError, AppJson, AppQuery, Success};
use crate::catalog::PublicLink;
use crate::probe::PageMeta;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub all: Option<String>,
}

impl ListParams {
    fn include_inactive(&self) -> bool {
        matches!(
            self.all.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("1" | "true" | "yes")
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub enabled: bool,
    pub urls: Vec<PublicLink>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub meta: PageMeta,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<Success<ServiceInfo>> {
    Success::json(ServiceInfo {
        service: state.config.server.service_name.clone(),
    })
}

pub async fn list_urls(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Success<ListResponse>>, ApiError> {
    let (enabled, urls) = state
        .catalog
        .list(params.include_inactive())
        .await
        .map_err(|e| catalog_error(e, "read failed"))?;

    Ok(Success::json(ListResponse { enabled, urls }))
}

pub async fn resolve_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Success<PublicLink>>, ApiError> {
    let link = state
        .catalog
        .resolve(&id)
        .await
        .map_err(|e| catalog_error(e, "resolve failed"))?;

    Ok(Success::json(link))
}

pub async fn probe_url(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ProbeRequest>,
) -> Result<Json<Success<ProbeResponse>>, ApiError> {
    let url = req
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing url"))?;

    let meta = state.catalog.probe().probe(&url).await;
    Ok(Success::json(ProbeResponse { meta }))
}
