use quark_net::NetError;
use thiserror::Error;

/// Runtime setup errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("network setup failed: {0}")]
    Net(#[from] NetError),

    #[error("unknown logic module: {0}")]
    UnknownModule(String),

    #[error("logic module registered twice: {0}")]
    DuplicateModule(String),

    #[error("logic module already running: {0}")]
    ModuleRunning(String),

    #[error("runtime is shut down")]
    ShutDown,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
