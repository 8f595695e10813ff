use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ManifestError, ManifestResult},
    info::BundleInfo,
    pack::VersionPackInfo,
    path::parent_dir,
};

/// Marks an asset path stored in full because it lies outside its bundle directory.
const ABSOLUTE_MARKER: char = '/';

/// Wire form of a [`BundleInfo`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedBundle {
    #[serde(rename = "bundleID")]
    pub bundle_id: i32,
    pub bundle_path: String,
    #[serde(default)]
    pub hash: String,
    /// Relative to the bundle directory, or `/`-prefixed full path.
    #[serde(default)]
    pub asset_list: Vec<String>,
    #[serde(default)]
    pub dependency_list: Vec<i32>,
}

/// Wire form of a [`VersionPackInfo`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedPack {
    pub version: String,
    pub platform: String,
    #[serde(default)]
    pub hash_mode: bool,
    #[serde(default)]
    pub bundle_list: Vec<SimplifiedBundle>,
}

fn simplify_asset(dir: &str, asset: &str) -> String {
    let relative = if dir.is_empty() {
        Some(asset)
    } else {
        asset.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/'))
    };
    match relative {
        Some(relative) if !relative.starts_with(ABSOLUTE_MARKER) => relative.to_owned(),
        // A relative form starting with the marker would be misread on restore.
        _ => format!("{ABSOLUTE_MARKER}{asset}"),
    }
}

fn unique_ids(ids: impl Iterator<Item = i32>) -> ManifestResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ManifestError::DuplicateBundleId(id));
        }
    }
    Ok(())
}

fn restore_asset(dir: &str, asset: &str) -> String {
    if let Some(full) = asset.strip_prefix(ABSOLUTE_MARKER) {
        return full.to_owned();
    }
    if dir.is_empty() {
        asset.to_owned()
    } else {
        format!("{dir}/{asset}")
    }
}

impl VersionPackInfo {
    /// Compresses paths for serialization.
    ///
    /// Paths are expected in normalized form (see [`crate::normalize_path`]).
    ///
    /// # Errors
    ///
    /// [`ManifestError::DuplicateBundleId`] when two bundles share an id, and
    /// [`ManifestError::UnknownDependency`] when a dependency path has no bundle id.
    pub fn simplify_path(&self) -> ManifestResult<SimplifiedPack> {
        unique_ids(self.bundle_list.iter().map(|b| b.bundle_id))?;
        let ids: HashMap<&str, i32> = self
            .bundle_list
            .iter()
            .map(|b| (b.bundle_path.as_str(), b.bundle_id))
            .collect();

        let bundle_list = self
            .bundle_list
            .iter()
            .map(|bundle| {
                let dir = parent_dir(&bundle.bundle_path);
                let dependency_list = bundle
                    .dependency_list
                    .iter()
                    .map(|dep| {
                        ids.get(dep.as_str())
                            .copied()
                            .ok_or_else(|| ManifestError::UnknownDependency {
                                bundle: bundle.bundle_path.clone(),
                                dependency: dep.clone(),
                            })
                    })
                    .collect::<ManifestResult<Vec<_>>>()?;
                Ok(SimplifiedBundle {
                    bundle_id: bundle.bundle_id,
                    bundle_path: bundle.bundle_path.clone(),
                    hash: bundle.hash.clone(),
                    asset_list: bundle
                        .asset_list
                        .iter()
                        .map(|a| simplify_asset(dir, a))
                        .collect(),
                    dependency_list,
                })
            })
            .collect::<ManifestResult<Vec<_>>>()?;

        Ok(SimplifiedPack {
            version: self.version.clone(),
            platform: self.platform.clone(),
            hash_mode: self.hash_mode,
            bundle_list,
        })
    }
}

impl SimplifiedPack {
    /// Expands the compressed paths back into an initialized [`VersionPackInfo`].
    ///
    /// # Errors
    ///
    /// [`ManifestError::DuplicateBundleId`] when two bundles share an id, and
    /// [`ManifestError::UnknownBundleId`] when a dependency id is not in the pack.
    pub fn restore_path(self) -> ManifestResult<VersionPackInfo> {
        unique_ids(self.bundle_list.iter().map(|b| b.bundle_id))?;
        let paths: HashMap<i32, String> = self
            .bundle_list
            .iter()
            .map(|b| (b.bundle_id, b.bundle_path.clone()))
            .collect();

        let bundle_list = self
            .bundle_list
            .into_iter()
            .map(|bundle| {
                let dir = parent_dir(&bundle.bundle_path);
                let asset_list = bundle
                    .asset_list
                    .iter()
                    .map(|a| restore_asset(dir, a))
                    .collect();
                let dependency_list = bundle
                    .dependency_list
                    .iter()
                    .map(|id| {
                        paths
                            .get(id)
                            .cloned()
                            .ok_or(ManifestError::UnknownBundleId(*id))
                    })
                    .collect::<ManifestResult<Vec<_>>>()?;
                Ok(BundleInfo {
                    bundle_id: bundle.bundle_id,
                    hash: bundle.hash,
                    asset_list,
                    dependency_list,
                    bundle_path: bundle.bundle_path,
                })
            })
            .collect::<ManifestResult<Vec<_>>>()?;

        let mut pack = VersionPackInfo::new(self.version, self.platform, self.hash_mode, bundle_list);
        pack.initialize();
        Ok(pack)
    }
}
