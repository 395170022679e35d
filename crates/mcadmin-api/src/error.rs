//! Error types for the Data API.
//!
//! [`ApiError`] covers every way a request can be refused or fail. Its
//! [`IntoResponse`] implementation maps each variant to a status code
//! and a fixed client-facing message. Internal causes are logged here
//! and never reach the response body.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use mcadmin_core::BridgeError;
use mcadmin_types::ErrorBody;
use tracing::{error, warn};

/// Content type sent with every JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Errors that can occur while serving a Data API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The `X-API-Key` header was missing or wrong.
    #[error("Unauthorized: Invalid or missing API key")]
    Unauthorized,

    /// The endpoint only answers `GET`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// No route matched the request path.
    #[error("Not found")]
    NotFound,

    /// The snapshot could not be collected from the simulation.
    #[error("snapshot collection failed: {0}")]
    Collection(#[from] BridgeError),

    /// The response body could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Collection(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    fn public_message(&self) -> String {
        match self {
            Self::Collection(_) | Self::Serialization(_) => String::from("Internal server error"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Collection(cause) if cause.is_timeout() => {
                warn!(error = %cause, "Snapshot collection timed out");
            }
            Self::Collection(cause) => error!(error = %cause, "Snapshot collection failed"),
            Self::Serialization(cause) => error!(error = %cause, "Response serialization failed"),
            Self::Unauthorized | Self::MethodNotAllowed | Self::NotFound => {}
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        // Serializing a single string field cannot fail.
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        json_response(self.status(), bytes)
    }
}

/// Build a response carrying an already-serialized JSON body.
pub fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}
