use folio_types::{AuthErrorDescriptor, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Bad email/password. The only failure surfaced to the user.
    #[error("authentication failed: {0}")]
    Credentials(AuthErrorDescriptor),

    #[error("role lookup failed: {0}")]
    Lookup(String),

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("invalid {field}: {error}")]
    Validation { field: String, error: ValidationError },
}

impl SessionError {
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn backend(status: u16, msg: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: msg.into(),
        }
    }

    /// HTTP status for backend rejections, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            Self::Credentials(desc) => desc.status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Collapse into the user-facing sign-in error.
    pub fn into_descriptor(self) -> AuthErrorDescriptor {
        match self {
            Self::Credentials(desc) => desc,
            other => {
                let status = other.status();
                let desc = AuthErrorDescriptor::new(other.to_string());
                match status {
                    Some(s) => desc.with_status(s),
                    None => desc,
                }
            }
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
