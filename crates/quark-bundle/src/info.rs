use serde::{Deserialize, Serialize};

use crate::path::normalize_path;

/// One deployable bundle.
///
/// `asset_list` holds full asset paths and `dependency_list` full bundle paths; the compact
/// wire form lives in [`crate::SimplifiedBundle`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInfo {
    #[serde(rename = "bundleID")]
    pub bundle_id: i32,
    pub bundle_path: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub asset_list: Vec<String>,
    #[serde(default)]
    pub dependency_list: Vec<String>,
}

impl BundleInfo {
    /// Creates a bundle with normalized paths.
    pub fn new<I, D>(bundle_id: i32, bundle_path: &str, assets: I, dependencies: D) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            bundle_id,
            bundle_path: normalize_path(bundle_path),
            hash: String::new(),
            asset_list: assets
                .into_iter()
                .map(|a| normalize_path(a.as_ref()))
                .collect(),
            dependency_list: dependencies
                .into_iter()
                .map(|d| normalize_path(d.as_ref()))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn contains_asset(&self, asset_path: &str) -> bool {
        self.asset_list.iter().any(|a| a == asset_path)
    }
}
