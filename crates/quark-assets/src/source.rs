use std::{
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use quark_bundle::normalize_path;
use tracing::trace;

use crate::error::{AssetsError, AssetsResult};

/// Backing store for the synchronous load path, addressed by manifest asset path.
pub trait AssetSource {
    fn load(&self, asset_path: &str) -> AssetsResult<Bytes>;
}

impl<S: AssetSource + ?Sized> AssetSource for Box<S> {
    fn load(&self, asset_path: &str) -> AssetsResult<Bytes> {
        (**self).load(asset_path)
    }
}

/// Reads assets from a directory tree that mirrors the manifest layout.
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsAssetSource {
    fn load(&self, asset_path: &str) -> AssetsResult<Bytes> {
        let normalized = normalize_path(asset_path);
        if normalized.is_empty() || normalized.split('/').any(|segment| segment == "..") {
            return Err(AssetsError::MissingAsset(asset_path.to_owned()));
        }

        let path = self.root.join(&normalized);
        match std::fs::read(&path) {
            Ok(data) => {
                trace!(path = %path.display(), len = data.len(), "asset read from disk");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(AssetsError::MissingAsset(normalized))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Source that has nothing. Used when no sync source is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAssetSource;

impl AssetSource for NoAssetSource {
    fn load(&self, asset_path: &str) -> AssetsResult<Bytes> {
        Err(AssetsError::MissingAsset(normalize_path(asset_path)))
    }
}
