use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::require_admin;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Admin routes -- bearer token required
    let admin_routes = Router::new()
        .route("/api/admin/add", post(handlers::add_link))
        .route("/api/admin/logout", post(handlers::logout))
        .route("/api/admin/remove/:id", delete(handlers::remove_link))
        .route("/api/admin/toggle", post(handlers::toggle))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_admin,
        ));

    // Public routes
    let public_routes = Router::new()
        .route("/", get(handlers::service_info))
        .route("/api/admin/login", post(handlers::login))
        .route("/api/probe", post(handlers::probe_url))
        .route("/api/resolve/:id", get(handlers::resolve_link))
        .route("/api/urls", get(handlers::list_urls));

    let mut router = Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));

    if let Some(cors) = cors_layer(&state.config.server.frontend_origins) {
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// CORS restricted to the configured frontend origins; `None` when empty
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    )
}
