//! Error types shared by every mount kind.

use crate::path::{PathError, VfsPath};

/// Errors surfaced by mount operations.
///
/// `NotFound` is routine and most queries fold it into `false`/`None`;
/// `Transport` and `Protocol` are terminal for the operation that raised
/// them; `InvalidPath` is raised before any I/O is attempted.
#[derive(Debug)]
pub enum Error {
    /// The resource is absent or inaccessible.
    NotFound { path: VfsPath },

    /// A connection could not be made or broke mid-operation.
    Transport { message: String },

    /// The remote response was malformed or had an unexpected status.
    Protocol { message: String },

    /// Path validation error.
    InvalidPath(PathError),

    /// A mount could not be constructed from its configuration.
    Config { message: String },
}

impl Error {
    /// True for the routine "no such file" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotFound { path } => write!(f, "not found: {}", path),
            Error::Transport { message } => write!(f, "transport failure: {}", message),
            Error::Protocol { message } => write!(f, "protocol error: {}", message),
            Error::InvalidPath(e) => write!(f, "invalid path: {}", e),
            Error::Config { message } => write!(f, "invalid mount configuration: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidPath(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Error::InvalidPath(e)
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match &e {
            Error::NotFound { .. } => std::io::ErrorKind::NotFound,
            Error::InvalidPath(_) | Error::Config { .. } => std::io::ErrorKind::InvalidInput,
            Error::Transport { .. } | Error::Protocol { .. } => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}
