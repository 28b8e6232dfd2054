//! HTTP error mapping.
//!
//! Every failed request answers with a JSON body `{"detail": <message>}`,
//! the shape the web UI reads. Internal failures are logged with their full
//! chain and answered with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors a request handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is missing a valid session token.
    #[error("Invalid authentication credentials")]
    Unauthenticated,

    /// Login credentials did not match a configured user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request is well-formed HTTP but semantically unusable.
    #[error("{message}")]
    BadRequest {
        /// Message returned in the response body.
        message: String,
    },

    /// Too many login attempts from one address.
    #[error("Too many login attempts; try again later")]
    RateLimited,

    /// Anything the client cannot fix.
    #[error("Internal server error")]
    Internal {
        /// Underlying failure; logged, never sent to the client.
        cause: anyhow::Error,
    },
}

impl ApiError {
    /// Builds a 400 response with `message` as the detail.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { cause } = &self {
            tracing::error!(error = ?cause, "request failed");
        }
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<homefin_db::Error> for ApiError {
    fn from(source: homefin_db::Error) -> Self {
        Self::Internal {
            cause: source.into(),
        }
    }
}

impl From<homefin_invoice::RenderError> for ApiError {
    fn from(source: homefin_invoice::RenderError) -> Self {
        Self::Internal {
            cause: source.into(),
        }
    }
}

/// Result alias for request handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_403() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bad_request_carries_its_message() {
        let err = ApiError::bad_request("No time entries provided");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No time entries provided");
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = ApiError::Internal {
            cause: anyhow::anyhow!("secret database path"),
        };
        assert_eq!(err.to_string(), "Internal server error");
    }
}
