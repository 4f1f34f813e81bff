//! Upstream error types.

use thiserror::Error;

/// Failure to obtain a bearer credential.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("Token endpoint returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl AuthenticationError {
    /// Status reported by the token endpoint, if it answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
        }
    }
}

/// Result type alias for upstream calls.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Errors that can occur while calling the upstream API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// HTTP status to report to our own caller: the upstream status when one
    /// is known, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Authentication(err) => err.status().unwrap_or(500),
            Self::Status { status, .. } => *status,
            Self::Request(err) => err.status().map(|s| s.as_u16()).unwrap_or(500),
            Self::InvalidResponse(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_reports_upstream_status() {
        let err = UpstreamError::Status {
            status: 404,
            message: "Event does not exist".to_string(),
        };
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Event does not exist");
    }

    #[test]
    fn test_authentication_error_status() {
        let err = UpstreamError::from(AuthenticationError::Rejected {
            status: 401,
            message: "Invalid client_id or client_secret".to_string(),
        });
        assert_eq!(err.status_code(), 401);
        assert_eq!(
            err.to_string(),
            "Authentication failed: Token endpoint returned 401: Invalid client_id or client_secret"
        );
    }

    #[test]
    fn test_invalid_response_is_internal() {
        assert_eq!(
            UpstreamError::InvalidResponse("expected value".to_string()).status_code(),
            500
        );
    }
}
