use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::error;

/// When set, 500 responses carry the underlying error text instead of a
/// fixed message. Off by default so internal detail never reaches clients
/// in normal operation.
static DEBUG_ERRORS: OnceCell<bool> = OnceCell::new();

pub fn enable_debug_errors() {
    let _ = DEBUG_ERRORS.set(true);
}

fn debug_errors_enabled() -> bool {
    DEBUG_ERRORS.get().copied().unwrap_or(false)
}

/// The failure classes a handler can produce.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or unacceptable client input. The message is safe to echo.
    #[error("{0}")]
    BadRequest(String),
    /// Direct lookup of an entity that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Any storage failure. Logged in full; reported to the client as a
    /// fixed message unless debug errors are enabled.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(entity) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found")).into_response()
            }
            ApiError::Database(err) => {
                error!("database error: {err}");
                let body = if debug_errors_enabled() {
                    err.to_string()
                } else {
                    "internal server error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400_with_message() {
        let resp = ApiError::bad_request("Account not found").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::NotFound("Account").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_errors_map_to_500() {
        let resp = ApiError::from(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
