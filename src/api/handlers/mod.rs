mod admin;
mod public;

use crate::api::response::ApiError;
use crate::catalog::CatalogError;

pub use admin::{add_link, login, logout, remove_link, toggle};
pub use public::{list_urls, probe_url, resolve_link, service_info};

/// Unknown paths still answer with the failure envelope
pub async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("method not allowed")
}

/// Map a CatalogError to an ApiError, hiding storage detail behind `message`
fn catalog_error(e: CatalogError, message: &str) -> ApiError {
    match e {
        CatalogError::AccessDisabled => ApiError::forbidden("access disabled"),
        CatalogError::NotFound => ApiError::not_found("not found"),
        CatalogError::Store(e) => {
            tracing::error!(error = %e, "{message}");
            ApiError::internal(message)
        }
    }
}
