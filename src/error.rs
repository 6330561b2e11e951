use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Body of a non-2xx response, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// Parsed JSON payload
    Json(Value),
    /// Raw response text when the body is not valid JSON
    Text(String),
}

/// Typed failure for a non-2xx HTTP response.
///
/// This is the single failure shape calling code inspects to branch on
/// failure categories, e.g. `status == 403` for a forbidden response.
#[derive(Debug, Clone)]
pub struct NetworkError {
    /// HTTP status code
    pub status: u16,
    /// Parsed error payload, or raw text if unparseable
    pub body: ErrorBody,
    /// Human-readable message derived from the error body
    pub message: String,
}

impl NetworkError {
    /// Classify a non-2xx response into a `NetworkError`.
    ///
    /// Attempts to parse the body as JSON and derives the message from the
    /// well-known `{ error, error_description }` shape, preferring
    /// `error_description`, then `error`, then the status line.
    pub fn classify(status: StatusCode, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);

        let (body, message) = match serde_json::from_slice::<Value>(body) {
            Ok(json) => {
                let message = json
                    .get("error_description")
                    .and_then(Value::as_str)
                    .or_else(|| json.get("error").and_then(Value::as_str))
                    .map(str::to_string);
                (ErrorBody::Json(json), message)
            }
            Err(_) => (ErrorBody::Text(text.to_string()), None),
        };

        let message = message.unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        });

        NetworkError {
            status: status.as_u16(),
            body,
            message,
        }
    }

    /// Check if this error is a forbidden response (403)
    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    /// Check if this error means the resource is absent (404)
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

/// Main error type for admin API operations
#[derive(Debug, Error)]
pub enum AdminError {
    /// A path template placeholder had no matching call parameter
    #[error("missing path parameter: {name}")]
    MissingPathParameter { name: String },

    /// A path template failed registry validation
    #[error("malformed path template {template:?}: {detail}")]
    MalformedTemplate { template: String, detail: String },

    /// The configured base URL cannot serve as a base for API paths
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Non-2xx HTTP response
    #[error("{0}")]
    Http(NetworkError),

    /// Authentication flow failure reported by a token source
    #[error("authentication error: {0}")]
    Auth(String),

    /// The call was cancelled before completion; not a failure
    #[error("request cancelled")]
    Cancelled,

    /// HTTP transport error
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AdminError {
    /// Check if this error is a permission denied error (403)
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AdminError::Http(err) if err.is_forbidden())
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminError::Http(err) if err.is_not_found())
    }

    /// Check if this error is a cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AdminError::Cancelled)
    }

    /// Get the HTTP status code if this is an HTTP error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdminError::Http(err) => Some(err.status),
            AdminError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the underlying network error, if any
    pub fn network(&self) -> Option<&NetworkError> {
        match self {
            AdminError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for admin API operations
pub type Result<T> = std::result::Result<T, AdminError>;
