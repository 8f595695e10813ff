use std::collections::BTreeMap;

use quark_pool::byte_pool;
use serde::{Deserialize, Serialize};

use crate::{error::ManifestResult, path::normalize_path};

/// Largest bundle blob accepted by [`BundleArchive::decode`]. Length prefixes are checked
/// against it before anything is allocated.
pub const MAX_ARCHIVE_BYTES: usize = 512 * 1024 * 1024;

/// Packed bundle blob: asset paths mapped to their bytes, bincode encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl BundleArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset_path: &str, data: impl Into<Vec<u8>>) {
        self.entries.insert(normalize_path(asset_path), data.into());
    }

    #[must_use]
    pub fn with_entry(mut self, asset_path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(asset_path, data);
        self
    }

    pub fn get(&self, asset_path: &str) -> Option<&[u8]> {
        self.entries.get(asset_path).map(Vec::as_slice)
    }

    pub fn contains(&self, asset_path: &str) -> bool {
        self.entries.contains_key(asset_path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, Vec<u8>)> {
        self.entries.into_iter()
    }

    /// # Errors
    ///
    /// [`crate::ManifestError::Archive`] if encoding fails.
    pub fn encode(&self) -> ManifestResult<Vec<u8>> {
        let mut buf = byte_pool().get();
        bincode::serde::encode_into_std_write(self, &mut *buf, bincode::config::legacy())?;
        Ok(buf.to_vec())
    }

    /// # Errors
    ///
    /// [`crate::ManifestError::Archive`] for truncated or foreign data, or when a length
    /// prefix claims more than [`MAX_ARCHIVE_BYTES`].
    pub fn decode(data: &[u8]) -> ManifestResult<Self> {
        let config = bincode::config::legacy().with_limit::<MAX_ARCHIVE_BYTES>();
        let (archive, _) = bincode::serde::decode_from_slice(data, config)?;
        Ok(archive)
    }
}
