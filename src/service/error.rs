//! Service-level errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors a handler can answer a request with.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Error parsing request body: {0}")]
    MalformedBody(String),

    #[error("Error parsing field: {0}")]
    MissingField(&'static str),

    #[error("Multiple ({count}) {field} values provided")]
    DuplicateField { field: &'static str, count: usize },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key not found: {0}")]
    KeyNotFound(u64),

    /// A route that exists by construction could not be found.
    #[error("route `{0}` is not registered")]
    RouteMissing(&'static str),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::RouteMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Internal invariant violated");
            return status.into_response();
        }
        tracing::warn!(error = %self, "Rejected request");
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::MissingField("password").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::KeyNotFound(1).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::InvalidKey("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::RouteMissing("POST:hash").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ServiceError::KeyNotFound(42).to_string(), "Key not found: 42");
        assert_eq!(
            ServiceError::DuplicateField { field: "password", count: 2 }.to_string(),
            "Multiple (2) password values provided"
        );
    }
}
