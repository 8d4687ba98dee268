use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Vertex AI predict endpoint
#[derive(Debug, Error)]
pub enum ImagenApiError {
    #[error("Invalid argument (400): {message}")]
    InvalidArgument { message: String },

    #[error("Unauthenticated (401): {message}")]
    Unauthenticated { message: String },

    #[error("Permission denied (403): {message}")]
    PermissionDenied { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Quota exhausted (429): {message}")]
    ResourceExhausted { message: String },

    #[error("Internal API error (500): {message}")]
    Internal { message: String },

    #[error("Service unavailable (503): {message}")]
    Unavailable { message: String },

    #[error("Deadline exceeded (504): {message}")]
    DeadlineExceeded { message: String },

    /// Catch-all for statuses we don't name
    #[error("Unexpected API error ({code} {status}): {message}")]
    Unexpected {
        code: u16,
        status: String,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl ImagenApiError {
    pub fn from_status(code: u16, status: &str, message: impl Into<String>) -> Self {
        let message = message.into();

        match status {
            "INVALID_ARGUMENT" => Self::InvalidArgument { message },
            "UNAUTHENTICATED" => Self::Unauthenticated { message },
            "PERMISSION_DENIED" => Self::PermissionDenied { message },
            "NOT_FOUND" => Self::NotFound { message },
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted { message },
            "INTERNAL" => Self::Internal { message },
            "UNAVAILABLE" => Self::Unavailable { message },
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded { message },
            other => Self::Unexpected {
                code,
                status: other.to_string(),
                message,
            },
        }
    }
}

impl From<ErrorEnvelope> for ImagenApiError {
    fn from(envelope: ErrorEnvelope) -> Self {
        let ErrorBody {
            code,
            message,
            status,
        } = envelope.error;
        Self::from_status(code, &status, message)
    }
}
