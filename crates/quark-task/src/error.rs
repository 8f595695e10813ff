use quark_events::ErrorKind;
use quark_net::NetError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("network error: {0}")]
    Network(#[from] NetError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("missing asset: {0}")]
    MissingAsset(String),
    #[error("instantiation failed: {0}")]
    Instantiation(String),
    #[error("task cancelled")]
    Cancelled,
}

impl TaskError {
    /// Framework error category; `None` for cancellation, which is not a failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Network(_) => Some(ErrorKind::Network),
            Self::Parse(_) => Some(ErrorKind::Parse),
            Self::MissingAsset(_) => Some(ErrorKind::MissingAsset),
            Self::Instantiation(_) => Some(ErrorKind::Instantiation),
            Self::Cancelled => None,
        }
    }
}

pub type TaskResult<T> = Result<T, TaskError>;
