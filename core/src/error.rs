//! Error types for the PlantUML client.
//!
//! # Design
//! The taxonomy is a closed three-level hierarchy expressed as nested enums:
//!
//! ```text
//! PlantUmlError                 generic: configuration, tokens, file I/O
//! └── Connection(ConnectionError)    talking to the server went wrong
//!     ├── Transport(TransportError)  no HTTP response at all
//!     └── Http(HttpError)            the server answered with status != 200
//! ```
//!
//! Callers can match broadly on `PlantUmlError`, at the connection tier via
//! [`PlantUmlError::as_connection`], or narrowly via [`PlantUmlError::as_http`].
//! `HttpError` is the only error that carries a response body.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum PlantUmlError {
    /// The client configuration is unusable. Raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The server could not be reached, or answered with a non-200 status.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A token contains foreign characters or does not inflate to text.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Reading a diagram source or writing a result file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlantUmlError {
    pub fn as_connection(&self) -> Option<&ConnectionError> {
        match self {
            PlantUmlError::Connection(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpError> {
        self.as_connection().and_then(ConnectionError::as_http)
    }

    pub fn is_connection(&self) -> bool {
        self.as_connection().is_some()
    }
}

impl From<HttpError> for PlantUmlError {
    fn from(err: HttpError) -> Self {
        PlantUmlError::Connection(ConnectionError::Http(err))
    }
}

impl From<TransportError> for PlantUmlError {
    fn from(err: TransportError) -> Self {
        PlantUmlError::Connection(ConnectionError::Transport(err))
    }
}

/// Failure while talking to the server.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// DNS, connect, TLS, timeout, or a broken body read.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The transport worked but the status was not the expected one.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl ConnectionError {
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            ConnectionError::Http(err) => Some(err),
            ConnectionError::Transport(_) => None,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ConnectionError::Transport(err) => Some(err),
            ConnectionError::Http(_) => None,
        }
    }
}

/// The server answered, but not with success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {reason}")]
pub struct HttpError {
    pub status: u16,
    /// Canonical reason phrase for `status` (`"Not Found"` for 404). The
    /// phrase on the server's status line is not preserved; empty for
    /// codes without a standard phrase.
    pub reason: String,
    /// Raw response body, usually the server's HTML diagnostic page.
    pub body: Vec<u8>,
}

impl HttpError {
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A request that never produced an HTTP response.
#[derive(Debug, Error)]
#[error("request to {url} failed")]
pub struct TransportError {
    pub url: String,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl TransportError {
    pub fn new(url: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }

    /// The underlying transport failure.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }
}
