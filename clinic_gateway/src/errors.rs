use std::{fmt, sync::Arc};

use serde_json::Value;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("network failure: {reason}")]
    Network { reason: String },
    #[error("authentication expired; sign in again")]
    AuthExpired { body: ErrorBody },
    #[error("request rejected ({status}): {body}")]
    Validation { status: u16, body: ErrorBody },
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: ErrorBody },
    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: ErrorBody },
    #[error("response decoding failed")]
    Decode(#[from] serde_json::Error),
    #[error("keyring operation failed")]
    Keyring(#[from] keyring::Error),
    #[error("session file operation failed")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Shared(Arc<GatewayError>),
    #[error("{0}")]
    Message(String),
}

impl GatewayError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Unwraps cached errors handed out to several subscribers.
    pub fn root(&self) -> &GatewayError {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self.root(), Self::AuthExpired { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::AuthExpired { .. } => Some(401),
            Self::Validation { status, .. }
            | Self::Server { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn display_chain(&self) -> DisplayChainedError<'_> {
        DisplayChainedError { inner: self }
    }
}

/// JSON error payload returned by the backend for non-2xx responses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorBody(pub Value);

impl ErrorBody {
    pub fn from_bytes(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self(Value::Null);
        }
        match serde_json::from_slice(raw) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(String::from_utf8_lossy(raw).into_owned())),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            Value::String(text) => Some(text.as_str()),
            Value::Object(fields) => ["message", "error", "detail"]
                .iter()
                .find_map(|name| fields.get(*name).and_then(Value::as_str)),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None if self.0.is_null() => f.write_str("<empty body>"),
            None => write!(f, "{}", self.0),
        }
    }
}

pub struct DisplayChainedError<'a> {
    inner: &'a (dyn std::error::Error + 'static),
}

impl fmt::Debug for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self.inner);

        while let Some(err) = current {
            if first {
                first = false;
            } else {
                write!(f, " -> ")?;
            }

            write!(f, "{err}")?;
            current = err.source();
        }

        Ok(())
    }
}

impl fmt::Display for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
