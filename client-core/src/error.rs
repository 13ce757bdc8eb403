use http::StatusCode;
use thiserror::Error;

/// Failure of a remote call made on behalf of the document manager.
///
/// Messages are captured as strings so the error can be cloned into
/// published state and handed to several observers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Transfer ended without a response")]
    Incomplete,
}

impl TransportError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => TransportError::Unauthorized(message),
            StatusCode::FORBIDDEN => TransportError::Forbidden(message),
            StatusCode::NOT_FOUND => TransportError::NotFound(message),
            StatusCode::CONFLICT => TransportError::Conflict(message),
            s if s.is_server_error() => TransportError::Server {
                status: s.as_u16(),
                message,
            },
            s => TransportError::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// HTTP status carried by the error, when one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Unauthorized(_) => Some(401),
            TransportError::Forbidden(_) => Some(403),
            TransportError::NotFound(_) => Some(404),
            TransportError::Conflict(_) => Some(409),
            TransportError::Rejected { status, .. } | TransportError::Server { status, .. } => {
                Some(*status)
            }
            TransportError::Http(_) | TransportError::Decode(_) | TransportError::Incomplete => {
                None
            }
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return TransportError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => TransportError::from_status(status, err.to_string()),
            None => TransportError::Http(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            TransportError::from_status(StatusCode::NOT_FOUND, "missing"),
            TransportError::NotFound("missing".to_string())
        );
        assert_eq!(
            TransportError::from_status(StatusCode::FORBIDDEN, "nope"),
            TransportError::Forbidden("nope".to_string())
        );
        assert_eq!(
            TransportError::from_status(StatusCode::PAYLOAD_TOO_LARGE, "big"),
            TransportError::Rejected {
                status: 413,
                message: "big".to_string()
            }
        );
        assert_eq!(
            TransportError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            TransportError::Server {
                status: 502,
                message: "upstream".to_string()
            }
        );
    }

    #[test]
    fn test_status_round_trip() {
        for code in [401u16, 403, 404, 409, 422, 500, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(TransportError::from_status(status, "x").status(), Some(code));
        }
        assert_eq!(TransportError::Incomplete.status(), None);
    }

    #[test]
    fn test_json_error_is_decode() {
        let err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        assert!(matches!(TransportError::from(err), TransportError::Decode(_)));
    }
}
