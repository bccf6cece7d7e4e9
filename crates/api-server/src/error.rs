use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure leaves the server as `{"error": "<message>"}`.
///
/// `Internal` carries a static client message; the cause is only logged.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{message}: {cause}")]
    Internal {
        message: &'static str,
        cause: String,
    },
}

impl ApiError {
    pub fn internal(message: &'static str, cause: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            message,
            cause: cause.to_string(),
        }
    }

    /// Closure for `map_err` that attaches the client-facing message.
    pub fn context<E: std::fmt::Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
        move |e| ApiError::internal(message, e)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        ApiError::BadRequest("Invalid query parameters")
    }
}

// Only ticker symbols travel in the path.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path: {}", rejection.body_text());
        ApiError::BadRequest("Invalid symbol")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => *message,
            ApiError::Internal { message, cause } => {
                tracing::error!("{}: {}", message, cause);
                *message
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("Invalid symbol").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Stock not found").status(),
            StatusCode::NOT_FOUND
        );
        let internal = ApiError::internal("Failed to fetch stocks", "upstream down");
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.to_string(), "Failed to fetch stocks: upstream down");
    }
}
