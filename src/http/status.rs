//! Classification of unsuccessful HTTP responses.

use reqwest::StatusCode;

/// An HTTP request the server answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// HTTP 401
    AuthenticationFailed,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 429
    RateLimited,
    /// Any other 4xx status
    ClientError(u16),
    /// 5xx statuses
    ServerError(u16),
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusError::AuthenticationFailed => {
                write!(f, "Authentication failed. Check your username and token.")
            }
            StatusError::Forbidden => write!(f, "Access forbidden"),
            StatusError::NotFound => write!(f, "Not found"),
            StatusError::RateLimited => write!(f, "Too many requests. Try again later."),
            StatusError::ClientError(code) => write!(f, "Request error: HTTP {}", code),
            StatusError::ServerError(code) => write!(f, "Server error: HTTP {}", code),
        }
    }
}

impl std::error::Error for StatusError {}

/// Maps an unsuccessful status code to a [`StatusError`].
/// Returns `None` for statuses that are not errors.
pub fn classify_status(status: StatusCode) -> Option<StatusError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(StatusError::AuthenticationFailed),
        StatusCode::FORBIDDEN => Some(StatusError::Forbidden),
        StatusCode::NOT_FOUND => Some(StatusError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Some(StatusError::RateLimited),
        s if s.is_client_error() => Some(StatusError::ClientError(s.as_u16())),
        s if s.is_server_error() => Some(StatusError::ServerError(s.as_u16())),
        _ => None,
    }
}

/// Converts an error from `error_for_status()` into an `anyhow::Error`,
/// replacing it with a [`StatusError`] when the status is known.
pub fn check_status(error: reqwest::Error) -> anyhow::Error {
    match error.status().and_then(classify_status) {
        Some(status_error) => anyhow::Error::from(status_error),
        None => anyhow::Error::from(error),
    }
}
