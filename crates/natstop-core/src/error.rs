use reqwest::StatusCode;

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server could not be reached (refused, timeout, DNS).
    Network,
    /// The server answered with a non-success status.
    Status,
    /// The body was not the expected JSON document.
    Decode,
    /// The target could not be turned into a request.
    InvalidTarget,
}

/// Error returned by a single monitoring endpoint request.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to decode /{path} response (HTTP {status}): {source}")]
    Decode {
        path: &'static str,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid target: {message}")]
    InvalidTarget { message: String },
}

impl ClientError {
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Status { .. } => ErrorKind::Status,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
        }
    }

    /// `true` when the request gave up waiting on the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { source, .. } if source.is_timeout())
    }
}

/// Error that ends a sampling loop.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Fetch failed: {source}")]
    Fetch {
        #[from]
        source: ClientError,
    },

    #[error("Sampler task failed: {message}")]
    Task { message: String },
}

impl MonitorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Kind of the underlying fetch failure, if the loop died fetching.
    pub fn fetch_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Fetch { source } => Some(source.kind()),
            Self::Config { .. } | Self::Task { .. } => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
