use remotefs_core::Error as MountError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid root URL '{url}': {message}")]
    InvalidRoot { url: String, message: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(#[from] remotefs_core::PathError),
}

impl From<Error> for MountError {
    fn from(error: Error) -> Self {
        match error {
            Error::Http(_) | Error::Io(_) => MountError::Transport {
                message: error.to_string(),
            },
            Error::Status { .. } => MountError::Protocol {
                message: error.to_string(),
            },
            Error::Path(e) => MountError::InvalidPath(e),
            Error::UrlParse(_)
            | Error::InvalidRoot { .. }
            | Error::InvalidHeaderName(_)
            | Error::InvalidHeaderValue(_) => MountError::Config {
                message: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_protocol_error() {
        let err: MountError = Error::Status {
            status: 416,
            url: "http://example.test/assets/model.bin".to_string(),
        }
        .into();
        assert!(matches!(err, MountError::Protocol { .. }));
        assert!(err.to_string().contains("416"));
    }

    #[test]
    fn io_maps_to_transport_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: MountError = Error::Io(io).into();
        assert!(matches!(err, MountError::Transport { .. }));
    }

    #[test]
    fn bad_root_maps_to_config_error() {
        let err: MountError = Error::InvalidRoot {
            url: "ftp://x".to_string(),
            message: "unsupported scheme".to_string(),
        }
        .into();
        assert!(matches!(err, MountError::Config { .. }));
    }
}
