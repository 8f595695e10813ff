use std::fmt;

/// Failure taxonomy shared by every framework error surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Download failed after retries.
    Network,
    /// Manifest or bundle payload malformed, or decryption failed.
    Parse,
    /// Path not found in the manifest, the bundle, or on disk.
    MissingAsset,
    /// Object construction from a loaded asset failed.
    Instantiation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Parse => "parse",
            Self::MissingAsset => "missing-asset",
            Self::Instantiation => "instantiation",
        };
        f.write_str(s)
    }
}

/// Raised for failures application code should surface (retry/reload UI).
#[derive(Clone, Debug, PartialEq)]
pub struct FrameworkError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FrameworkError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Asset cache lifecycle notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetEvent {
    /// Version manifest decoded and indexed.
    ManifestLoaded { version: String, bundles: usize },
    /// Bundle bytes fetched and decoded.
    BundleLoaded { bundle: String },
    /// Bundle dropped from the cache.
    BundleUnloaded { bundle: String },
}
