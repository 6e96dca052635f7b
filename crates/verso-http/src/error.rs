//! Error responses for the HTTP layer

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use std::fmt;
use verso_core::VersioningError;

/// Response type produced by every verso service
pub type Response = http::Response<Full<Bytes>>;

/// Result type alias for HTTP-facing operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Structured API error
///
/// Rendered as `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Internal details, logged but never sent
    pub(crate) internal: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            internal: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 405 Method Not Allowed error
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// The 404 returned for unknown routes and for gated operations alike
    pub fn no_route(method: &http::Method, path: &str) -> Self {
        Self::not_found(format!("No route found for {} {}", method, path))
    }

    /// Add internal details (logged, never sent)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Render into a JSON response
    pub fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                error_type = %self.error_type,
                message = %self.message,
                internal = ?self.internal,
                "request failed"
            );
        }

        let status = self.status;
        let body = serde_json::to_vec(&ErrorResponse::from(self)).unwrap_or_else(|_| {
            br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
        });
        with_json_body(status, body)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message: err.message,
            },
        }
    }
}

impl From<VersioningError> for ApiError {
    fn from(err: VersioningError) -> Self {
        match err {
            VersioningError::InvalidVersionFormat(raw) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "invalid_version",
                format!("Invalid version in request: {:?}", raw),
            ),
            VersioningError::VersionNotFound(raw) => ApiError::new(
                StatusCode::NOT_ACCEPTABLE,
                "unsupported_version",
                format!("Unsupported version: {}", raw),
            ),
            VersioningError::Json(e) => ApiError::bad_request(format!("Invalid JSON: {}", e)),
            other => ApiError::internal("Versioning error").with_internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

/// Build a JSON response from a value
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Response> {
    let body = serde_json::to_vec(value)
        .map_err(|e| ApiError::internal("Failed to serialize response").with_internal(e.to_string()))?;
    Ok(with_json_body(status, body))
}

fn with_json_body(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
