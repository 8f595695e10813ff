use quark_bundle::ManifestError;
use quark_events::ErrorKind;
use quark_net::NetError;
use quark_task::TaskError;
use thiserror::Error;

/// Asset provider errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetsError {
    #[error("network error: {0}")]
    Network(#[from] NetError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing asset: {0}")]
    MissingAsset(String),

    #[error("instantiation failed: {0}")]
    Instantiation(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("asset provider is shut down")]
    ShutDown,

    #[error("load cancelled")]
    Cancelled,
}

impl AssetsError {
    /// Framework error category. `None` for lifecycle outcomes that are not failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Network(_) => Some(ErrorKind::Network),
            Self::Parse(_) => Some(ErrorKind::Parse),
            Self::MissingAsset(_) | Self::Io(_) => Some(ErrorKind::MissingAsset),
            Self::Instantiation(_) => Some(ErrorKind::Instantiation),
            Self::ShutDown | Self::Cancelled => None,
        }
    }

    /// Whether the failure is raised on the event bus in addition to the callback.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Parse(_))
    }
}

impl From<TaskError> for AssetsError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Network(e) => Self::Network(e),
            TaskError::Parse(msg) => Self::Parse(msg),
            TaskError::MissingAsset(path) => Self::MissingAsset(path),
            TaskError::Instantiation(msg) => Self::Instantiation(msg),
            TaskError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ManifestError> for AssetsError {
    fn from(e: ManifestError) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<std::io::Error> for AssetsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type AssetsResult<T> = Result<T, AssetsError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::network(AssetsError::Network(NetError::Timeout), Some(ErrorKind::Network), true)]
    #[case::parse(AssetsError::Parse("bad".into()), Some(ErrorKind::Parse), true)]
    #[case::missing(AssetsError::MissingAsset("a".into()), Some(ErrorKind::MissingAsset), false)]
    #[case::io(AssetsError::Io("denied".into()), Some(ErrorKind::MissingAsset), false)]
    #[case::shut_down(AssetsError::ShutDown, None, false)]
    #[case::cancelled(AssetsError::Cancelled, None, false)]
    fn classification(
        #[case] error: AssetsError,
        #[case] kind: Option<ErrorKind>,
        #[case] reported: bool,
    ) {
        assert_eq!(error.kind(), kind);
        assert_eq!(error.is_reported(), reported);
    }

    #[test]
    fn task_errors_keep_their_category() {
        let error = AssetsError::from(TaskError::Network(NetError::Timeout));
        assert_eq!(error, AssetsError::Network(NetError::Timeout));
        assert_eq!(AssetsError::from(TaskError::Cancelled), AssetsError::Cancelled);
    }

    #[test]
    fn manifest_errors_are_parse_errors() {
        let error = AssetsError::from(ManifestError::UnknownBundle("ui.bundle".into()));
        assert_eq!(error.kind(), Some(ErrorKind::Parse));
    }
}
