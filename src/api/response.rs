use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

// ============================================================================
// Success envelope
// ============================================================================

/// `{"ok": true, ...data}` with the payload's fields flattened in
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    #[serde(flatten)]
    pub data: T,
    pub ok: bool,
}

impl<T: Serialize> Success<T> {
    pub fn json(data: T) -> Json<Success<T>> {
        Json(Success { data, ok: true })
    }
}

// ============================================================================
// Failure envelope
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Failure {
    pub error: String,
    pub ok: bool,
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Either a client failure (4xx) or a server error (5xx).
/// Used as the error type in handler Result returns.
#[derive(Debug)]
pub enum ApiError {
    Error(StatusCode, String),
    Fail(StatusCode, String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Fail(code, msg) | ApiError::Error(code, msg) => (code, msg),
        };
        (
            status,
            Json(Failure {
                error: message,
                ok: false,
            }),
        )
            .into_response()
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::UNAUTHORIZED, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::FORBIDDEN, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::NOT_FOUND, message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::METHOD_NOT_ALLOWED, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Error(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Fail(code, _) | ApiError::Error(code, _) => *code,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(detail = %rejection.body_text(), "Rejected request body");
        ApiError::bad_request("invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(detail = %rejection.body_text(), "Rejected query string");
        ApiError::bad_request("invalid query string")
    }
}

// ============================================================================
// Extractors that reject with the failure envelope
// ============================================================================

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
