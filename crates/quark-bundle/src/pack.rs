use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    error::{ManifestError, ManifestResult},
    info::BundleInfo,
    path::{flatten_bundle_name, hash_qualified, normalize_path},
};

/// Root manifest of one build.
///
/// Call [`VersionPackInfo::initialize`] after construction or deserialization; lookups before
/// that find nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPackInfo {
    pub version: String,
    pub platform: String,
    #[serde(default)]
    pub hash_mode: bool,
    #[serde(default)]
    pub bundle_list: Vec<BundleInfo>,
    #[serde(skip)]
    bundle_index: HashMap<String, usize>,
    #[serde(skip)]
    asset_index: HashMap<String, usize>,
}

impl PartialEq for VersionPackInfo {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.platform == other.platform
            && self.hash_mode == other.hash_mode
            && self.bundle_list == other.bundle_list
    }
}

impl Eq for VersionPackInfo {}

impl VersionPackInfo {
    pub fn new(
        version: impl Into<String>,
        platform: impl Into<String>,
        hash_mode: bool,
        bundle_list: Vec<BundleInfo>,
    ) -> Self {
        Self {
            version: version.into(),
            platform: platform.into(),
            hash_mode,
            bundle_list,
            bundle_index: HashMap::new(),
            asset_index: HashMap::new(),
        }
    }

    /// Sentinel returned when a manifest cannot be decoded.
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        !self.version.is_empty()
    }

    /// Rebuilds the bundle-path and asset-path indices.
    ///
    /// An asset listed by several bundles resolves to the first one; [`Self::validate`]
    /// reports the conflict.
    pub fn initialize(&mut self) {
        self.bundle_index.clear();
        self.asset_index.clear();
        for (index, bundle) in self.bundle_list.iter().enumerate() {
            self.bundle_index.insert(bundle.bundle_path.clone(), index);
            for asset in &bundle.asset_list {
                if self.asset_index.contains_key(asset) {
                    warn!(asset = %asset, bundle = %bundle.bundle_path, "asset listed twice");
                    continue;
                }
                self.asset_index.insert(asset.clone(), index);
            }
        }
        debug!(
            version = %self.version,
            bundles = self.bundle_index.len(),
            assets = self.asset_index.len(),
            "manifest initialized"
        );
    }

    pub fn get_bundle_info_from_bundle_path(&self, bundle_path: &str) -> Option<&BundleInfo> {
        let key = normalize_path(bundle_path);
        let found = self
            .bundle_index
            .get(&key)
            .and_then(|&i| self.bundle_list.get(i));
        if found.is_none() {
            error!(bundle = %key, "bundle not found in manifest");
        }
        found
    }

    pub fn get_bundle_info_from_asset_path(&self, asset_path: &str) -> Option<&BundleInfo> {
        let found = self.find_bundle_of_asset(asset_path);
        if found.is_none() {
            error!(asset = %normalize_path(asset_path), "asset not found in manifest");
        }
        found
    }

    /// Like [`Self::get_bundle_info_from_asset_path`] without logging a miss.
    pub fn find_bundle_of_asset(&self, asset_path: &str) -> Option<&BundleInfo> {
        self.asset_index
            .get(&normalize_path(asset_path))
            .and_then(|&i| self.bundle_list.get(i))
    }

    pub fn get_bundle_info_by_id(&self, bundle_id: i32) -> Option<&BundleInfo> {
        self.bundle_list.iter().find(|b| b.bundle_id == bundle_id)
    }

    pub fn bundle_count(&self) -> usize {
        self.bundle_list.len()
    }

    pub fn asset_count(&self) -> usize {
        self.asset_index.len()
    }

    /// Stamps bundle content hashes from a build manifest keyed by bundle path. Returns how many
    /// bundles were stamped.
    pub fn apply_hash(&mut self, hashes: &HashMap<String, String>) -> usize {
        let mut stamped = 0;
        for bundle in &mut self.bundle_list {
            if let Some(hash) = hashes.get(&bundle.bundle_path) {
                bundle.hash.clone_from(hash);
                stamped += 1;
            }
        }
        stamped
    }

    /// Transitive dependencies of a bundle, dependencies before dependents, each bundle once,
    /// ending with the bundle itself.
    ///
    /// # Errors
    ///
    /// [`ManifestError::UnknownBundle`] for an unknown root,
    /// [`ManifestError::UnknownDependency`] when an edge points outside the manifest.
    pub fn dependency_closure(&self, bundle_path: &str) -> ManifestResult<Vec<String>> {
        let root = normalize_path(bundle_path);
        if !self.bundle_index.contains_key(&root) {
            return Err(ManifestError::UnknownBundle(root));
        }

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.visit(&root, &mut visited, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        path: &str,
        visited: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> ManifestResult<()> {
        if !visited.insert(path.to_owned()) {
            return Ok(());
        }
        let bundle = self
            .bundle_index
            .get(path)
            .and_then(|&i| self.bundle_list.get(i))
            .ok_or_else(|| ManifestError::UnknownBundle(path.to_owned()))?;

        for dependency in &bundle.dependency_list {
            if !self.bundle_index.contains_key(dependency) {
                return Err(ManifestError::UnknownDependency {
                    bundle: bundle.bundle_path.clone(),
                    dependency: dependency.clone(),
                });
            }
            self.visit(dependency, visited, order)?;
        }
        order.push(path.to_owned());
        Ok(())
    }

    /// Checks the structural invariants the build pipeline is expected to uphold: unique bundle
    /// ids, each asset in exactly one bundle, every dependency known, no dependency cycles.
    ///
    /// # Errors
    ///
    /// The first violation found.
    pub fn validate(&self) -> ManifestResult<()> {
        let mut ids = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();
        let paths: HashSet<&str> = self
            .bundle_list
            .iter()
            .map(|b| b.bundle_path.as_str())
            .collect();

        for bundle in &self.bundle_list {
            if !ids.insert(bundle.bundle_id) {
                return Err(ManifestError::DuplicateBundleId(bundle.bundle_id));
            }
            for asset in &bundle.asset_list {
                if let Some(first) = owners.insert(asset, &bundle.bundle_path) {
                    return Err(ManifestError::DuplicateAsset {
                        asset: asset.clone(),
                        first: first.to_owned(),
                        second: bundle.bundle_path.clone(),
                    });
                }
            }
            for dependency in &bundle.dependency_list {
                if !paths.contains(dependency.as_str()) {
                    return Err(ManifestError::UnknownDependency {
                        bundle: bundle.bundle_path.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        self.check_cycles()
    }

    fn check_cycles(&self) -> ManifestResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn walk<'a>(
            pack: &'a VersionPackInfo,
            path: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> ManifestResult<()> {
            match marks.get(path) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Active) => {
                    let start = stack.iter().position(|p| *p == path).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|p| (*p).to_owned()).collect();
                    cycle.push(path.to_owned());
                    return Err(ManifestError::DependencyCycle(cycle));
                }
                None => {}
            }
            marks.insert(path, Mark::Active);
            stack.push(path);
            if let Some(bundle) = pack.bundle_list.iter().find(|b| b.bundle_path == path) {
                for dependency in &bundle.dependency_list {
                    walk(pack, dependency, marks, stack)?;
                }
            }
            stack.pop();
            marks.insert(path, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        for bundle in &self.bundle_list {
            walk(self, &bundle.bundle_path, &mut marks, &mut stack)?;
        }
        Ok(())
    }

    /// Relative location a bundle is fetched from: flattened when requested, then
    /// hash-qualified in hash mode.
    pub fn bundle_fetch_path(&self, bundle: &BundleInfo, flatten: bool) -> String {
        let path = if flatten {
            flatten_bundle_name(&bundle.bundle_path)
        } else {
            bundle.bundle_path.clone()
        };
        if self.hash_mode {
            hash_qualified(&path, &bundle.hash)
        } else {
            path
        }
    }
}
