//! Errores del borde remoto.
//! Mapea errores de reqwest / estados HTTP a variantes semánticas.

use thiserror::Error;
use wizard_core::CoreEngineError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("configuration error: {0}")] Config(String),
    #[error("transient transport error: {0}")] Transport(String),
    #[error("request timed out")] Timeout,
    #[error("access denied: {0}")] AccessDenied(String),
    #[error("not found: {0}")] NotFound(String),
    #[error("unexpected status {status}: {body}")] Status { status: u16, body: String },
    #[error("request rejected by server: {0}")] Rejected(String),
    #[error("decode error: {0}")] Decode(String),
    #[error("attachment uploaded to {url} but registration failed: {reason}")]
    AttachmentNotRegistered { url: String, reason: String },
    #[error(transparent)] Core(CoreEngineError),
}

impl RemoteError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::AccessDenied(body),
            404 => Self::NotFound(body),
            _ => Self::Status { status, body },
        }
    }

    /// Fallos transitorios: red, timeout, 5xx y 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<CoreEngineError> for RemoteError {
    fn from(err: CoreEngineError) -> Self {
        match err {
            CoreEngineError::AccessDenied(permission) => Self::AccessDenied(permission),
            other => Self::Core(other),
        }
    }
}
