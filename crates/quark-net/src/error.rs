use thiserror::Error;

/// Errors produced while fetching bundle and manifest blobs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("HTTP {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Timeout")]
    Timeout,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Fetch cancelled")]
    Cancelled,
}

impl NetError {
    /// Creates an HTTP status error
    pub fn http_status(status: u16, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Creates an HTTP error from a generic string
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Checks if this error is considered retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::Http(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("timeout") || msg.contains("connection") || msg.contains("network")
            }
            NetError::Timeout => true,
            // Retry on 5xx server errors, 429 Too Many Requests and 408 Request Timeout
            NetError::HttpStatus { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            NetError::Io(_) | NetError::InvalidUrl(_) | NetError::Cancelled => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout)
    }

    /// Gets the HTTP status code if this is an HTTP status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = error.status() {
            let url = error.url().map(ToString::to_string).unwrap_or_default();
            return Self::http_status(status.as_u16(), url);
        }
        Self::Http(error.to_string())
    }
}

impl From<std::io::Error> for NetError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

pub type NetResult<T> = Result<T, NetError>;
