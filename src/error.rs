// API client error types
use reqwest::StatusCode;
use serde_json::Value;

/// Error returned by every client call. Cloneable so one refresh failure can
/// be handed to every request that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 409 Conflict
    #[error("{0}")]
    Conflict(String),

    // 422 Unprocessable Entity
    #[error("{0}")]
    Unprocessable(String),

    // 429 Too Many Requests
    #[error("{0}")]
    TooManyRequests(String),

    // 5xx
    #[error("{message}")]
    Server { status: u16, message: String },

    // Anything else non-OK
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unable to decode response: {0}")]
    Decode(String),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Build an error from a non-OK response status and its raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            422 => ApiError::Unprocessable(message),
            429 => ApiError::TooManyRequests(message),
            code if code >= 500 => ApiError::Server { status: code, message },
            code => ApiError::Http { status: code, message },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ApiError::InvalidState(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    /// HTTP status code, if the error came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Unprocessable(_) => Some(422),
            ApiError::TooManyRequests(_) => Some(429),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code for machine-readable CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unprocessable(_) => "UNPROCESSABLE_ENTITY",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::Server { .. } => "SERVER_ERROR",
            ApiError::Http { .. } => "HTTP_ERROR",
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
            ApiError::NotAuthenticated => "NOT_AUTHENTICATED",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Message suitable for showing to a user
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Config(format!("invalid URL: {}", err))
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// Backends disagree on the key: `message`, `error_description`, `error`
/// and `msg` are all seen in the wild, and `error` is sometimes an object
/// with its own `message`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    for key in ["message", "error_description", "error", "msg"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }

    None
}
