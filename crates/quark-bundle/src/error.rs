use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest JSON error: {0}")]
    Json(String),
    #[error("manifest decryption failed: {0}")]
    Decrypt(String),
    #[error("manifest has no version")]
    MissingVersion,
    #[error("asset {asset} is listed by both {first} and {second}")]
    DuplicateAsset {
        asset: String,
        first: String,
        second: String,
    },
    #[error("bundle id {0} is used more than once")]
    DuplicateBundleId(i32),
    #[error("bundle {bundle} depends on unknown bundle {dependency}")]
    UnknownDependency { bundle: String, dependency: String },
    #[error("unknown bundle: {0}")]
    UnknownBundle(String),
    #[error("unknown bundle id: {0}")]
    UnknownBundleId(i32),
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    #[error("bundle archive error: {0}")]
    Archive(String),
}

impl From<serde_json::Error> for ManifestError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<bincode::error::DecodeError> for ManifestError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::Archive(error.to_string())
    }
}

impl From<bincode::error::EncodeError> for ManifestError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::Archive(error.to_string())
    }
}

pub type ManifestResult<T> = Result<T, ManifestError>;
