use std::{
    collections::HashMap,
    fmt,
    ops::{Deref, DerefMut},
};

use bytes::Bytes;

/// A loaded asset: its manifest path and raw payload.
///
/// Cloning is cheap; the payload is shared with the bundle it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct AssetRef {
    path: String,
    data: Bytes,
}

impl AssetRef {
    pub fn new<S: Into<String>>(path: S, data: Bytes) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRef")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Typed view over a loaded asset. `None` means the payload does not convert.
pub trait FromAsset: Sized + 'static {
    fn from_asset(asset: &AssetRef) -> Option<Self>;
}

impl FromAsset for AssetRef {
    fn from_asset(asset: &AssetRef) -> Option<Self> {
        Some(asset.clone())
    }
}

impl FromAsset for Bytes {
    fn from_asset(asset: &AssetRef) -> Option<Self> {
        Some(asset.data.clone())
    }
}

impl FromAsset for String {
    fn from_asset(asset: &AssetRef) -> Option<Self> {
        std::str::from_utf8(&asset.data).ok().map(str::to_owned)
    }
}

/// Decoded contents of one bundle, keyed by asset path.
pub struct LoadedBundle {
    path: String,
    assets: HashMap<String, Bytes>,
}

impl LoadedBundle {
    pub fn new<S: Into<String>>(path: S, assets: HashMap<String, Bytes>) -> Self {
        Self {
            path: path.into(),
            assets,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, asset_path: &str) -> Option<Bytes> {
        self.assets.get(asset_path).cloned()
    }

    pub fn contains(&self, asset_path: &str) -> bool {
        self.assets.contains_key(asset_path)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }
}

impl fmt::Debug for LoadedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedBundle")
            .field("path", &self.path)
            .field("assets", &self.assets.len())
            .finish()
    }
}

/// Object built from a loaded asset by `AssetProvider::instantiate_async`.
///
/// Holds one reference on its source asset until handed back through
/// `AssetProvider::release_instance`.
#[derive(Debug)]
pub struct Instance<T> {
    asset_path: String,
    value: T,
}

impl<T> Instance<T> {
    pub(crate) fn new(asset_path: String, value: T) -> Self {
        Self { asset_path, value }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub(crate) fn into_parts(self) -> (String, T) {
        (self.asset_path, self.value)
    }
}

impl<T> Deref for Instance<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Instance<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
