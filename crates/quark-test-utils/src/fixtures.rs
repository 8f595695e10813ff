//! Manifest and bundle fixtures.
//!
//! The sample layout:
//!
//! | id | bundle | assets | depends on |
//! |---|---|---|---|
//! | 1 | `base/a.bundle` | `base/a/x.txt` | |
//! | 2 | `ui/b.bundle` | `ui/b/y.txt` | `base/a.bundle` |
//! | 3 | `chain/c.bundle` | `chain/c/leaf.txt` | |
//! | 4 | `chain/d.bundle` | `chain/d/mid.txt` | `chain/c.bundle` |
//! | 5 | `chain/e.bundle` | `chain/e/top.txt` | `chain/d.bundle` |
//! | 6 | `broken/f.bundle` | `broken/f/z.txt` | |
//!
//! `broken/f.bundle` is listed in the manifest but never published.

use bytes::Bytes;
use quark_bundle::{BundleArchive, BundleInfo, MANIFEST_NAME, ManifestCipher, VersionPackInfo};
use url::Url;

use crate::MemFetcher;

pub const BUNDLE_A: &str = "base/a.bundle";
pub const BUNDLE_B: &str = "ui/b.bundle";
pub const BUNDLE_C: &str = "chain/c.bundle";
pub const BUNDLE_D: &str = "chain/d.bundle";
pub const BUNDLE_E: &str = "chain/e.bundle";
pub const BUNDLE_BROKEN: &str = "broken/f.bundle";

pub const ASSET_X: &str = "base/a/x.txt";
pub const ASSET_Y: &str = "ui/b/y.txt";
pub const ASSET_LEAF: &str = "chain/c/leaf.txt";
pub const ASSET_MID: &str = "chain/d/mid.txt";
pub const ASSET_TOP: &str = "chain/e/top.txt";
pub const ASSET_BROKEN: &str = "broken/f/z.txt";

#[must_use]
pub fn base_url() -> Url {
    Url::parse("http://cdn.test/bundles/").unwrap()
}

/// Contents stored for an asset: `"<path> contents"`.
#[must_use]
pub fn asset_contents(asset_path: &str) -> Bytes {
    Bytes::from(format!("{asset_path} contents"))
}

#[must_use]
pub fn sample_pack() -> VersionPackInfo {
    let none: [&str; 0] = [];
    let mut pack = VersionPackInfo::new(
        "1.0.0",
        "test",
        false,
        vec![
            BundleInfo::new(1, BUNDLE_A, [ASSET_X], none),
            BundleInfo::new(2, BUNDLE_B, [ASSET_Y], [BUNDLE_A]),
            BundleInfo::new(3, BUNDLE_C, [ASSET_LEAF], none),
            BundleInfo::new(4, BUNDLE_D, [ASSET_MID], [BUNDLE_C]),
            BundleInfo::new(5, BUNDLE_E, [ASSET_TOP], [BUNDLE_D]),
            BundleInfo::new(6, BUNDLE_BROKEN, [ASSET_BROKEN], none),
        ],
    );
    pack.initialize();
    pack
}

/// Archive holding every asset the bundle lists, with [`asset_contents`] payloads.
#[must_use]
pub fn archive_for(bundle: &BundleInfo) -> BundleArchive {
    bundle
        .asset_list
        .iter()
        .fold(BundleArchive::new(), |archive, asset| {
            archive.with_entry(asset, asset_contents(asset).to_vec())
        })
}

/// URL a provider with `flatten = false` fetches `bundle` from.
#[must_use]
pub fn bundle_url(base: &Url, pack: &VersionPackInfo, bundle_path: &str) -> Url {
    let bundle = pack
        .bundle_list
        .iter()
        .find(|b| b.bundle_path == bundle_path)
        .unwrap();
    base.join(&pack.bundle_fetch_path(bundle, false)).unwrap()
}

#[must_use]
pub fn manifest_url(base: &Url) -> Url {
    base.join(MANIFEST_NAME).unwrap()
}

/// Publishes the manifest and every bundle except `skip` to `fetcher`.
pub fn publish(
    fetcher: &MemFetcher,
    base: &Url,
    pack: &VersionPackInfo,
    cipher: Option<&ManifestCipher>,
    skip: &[&str],
) {
    fetcher.insert(
        &manifest_url(base),
        pack.to_binary_data(cipher).unwrap(),
    );
    for bundle in &pack.bundle_list {
        if skip.contains(&bundle.bundle_path.as_str()) {
            continue;
        }
        let url = base.join(&pack.bundle_fetch_path(bundle, false)).unwrap();
        fetcher.insert(&url, archive_for(bundle).encode().unwrap());
    }
}

/// [`sample_pack`] published at [`base_url`], without the broken bundle.
#[must_use]
pub fn sample_fetcher() -> MemFetcher {
    let fetcher = MemFetcher::new();
    publish(
        &fetcher,
        &base_url(),
        &sample_pack(),
        None,
        &[BUNDLE_BROKEN],
    );
    fetcher
}
