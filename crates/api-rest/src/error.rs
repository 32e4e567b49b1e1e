//! Mapping from store errors to HTTP responses.

use api_shared::ErrorRes;
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};
use guidebook_core::GuideError;

/// Error half of every fallible handler: a status code and a JSON `{message, errors?}` body.
pub(crate) type ApiError = (StatusCode, Json<ErrorRes>);

/// Maps a store error to its response.
///
/// Client errors carry the store's message. Everything else is logged and reported as a generic
/// 500 so file paths and I/O details never reach the client.
pub(crate) fn guide_error(err: GuideError) -> ApiError {
    match err {
        GuideError::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new(err.to_string())),
        ),
        GuideError::NotFound(_) => (StatusCode::NOT_FOUND, Json(ErrorRes::new(err.to_string()))),
        GuideError::Conflict(_) => (StatusCode::CONFLICT, Json(ErrorRes::new(err.to_string()))),
        other => internal("store", other),
    }
}

/// A 400 listing every field problem found in a request body.
pub(crate) fn validation(errors: Vec<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorRes::with_errors("Validation error", errors)),
    )
}

/// Unwraps a JSON request body. Malformed or mistyped bodies become a 400 validation error
/// rather than axum's plain-text rejection.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(validation(vec![rejection.body_text()])),
    }
}

pub(crate) fn internal(context: &str, err: impl std::fmt::Debug) -> ApiError {
    tracing::error!("{} error: {:?}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::new("Internal error")),
    )
}
