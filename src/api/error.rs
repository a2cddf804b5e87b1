// LogRetrieval - api/error.rs
//
// Gateway error type and its mapping onto HTTP status codes.
// Every error leaves the server as `{"error": "<message>"}`.

use super::auth::AuthFailure;
use crate::core::model::ErrorBody;
use crate::util::error::RetrievalError;
use crate::util::logging::preview;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Everything that can turn a request into a non-200 response.
#[derive(Debug)]
pub enum ApiError {
    /// `filename` missing or empty.
    MissingFilename,

    /// `lines` present but not a positive integer.
    InvalidLines { raw: String },

    /// The query string itself could not be decoded.
    InvalidQuery(String),

    /// Authentication failed.
    Unauthorized(AuthFailure),

    /// The engine rejected or failed the read.
    Retrieval(RetrievalError),

    /// No route for this method and path.
    RouteNotFound,

    /// Unexpected server-side failure outside the engine.
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFilename | Self::InvalidLines { .. } | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Retrieval(e) => match e {
                RetrievalError::PathViolation { .. } => StatusCode::FORBIDDEN,
                RetrievalError::NotFound { .. } => StatusCode::NOT_FOUND,
                RetrievalError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
                RetrievalError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFilename => f.write_str("Filename is required"),
            Self::InvalidLines { raw } => write!(
                f,
                "Parameter 'lines' must be a positive integer, got '{}'",
                preview(raw)
            ),
            Self::InvalidQuery(reason) => write!(f, "Invalid query string: {reason}"),
            Self::Unauthorized(e) => write!(f, "{e}"),
            Self::Retrieval(e @ RetrievalError::Io { .. }) => {
                write!(f, "Internal Server Error: {e}")
            }
            Self::Retrieval(e) => write!(f, "{e}"),
            Self::RouteNotFound => f.write_str("Not Found"),
            Self::Internal(reason) => write!(f, "Internal Server Error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unauthorized(e) => Some(e),
            Self::Retrieval(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RetrievalError> for ApiError {
    fn from(e: RetrievalError) -> Self {
        Self::Retrieval(e)
    }
}

impl From<AuthFailure> for ApiError {
    fn from(e: AuthFailure) -> Self {
        Self::Unauthorized(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
