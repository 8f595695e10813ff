use std::collections::HashMap;

use quark::{
    RuntimeOptions,
    bundle::{BundleInfo, ManifestCipher, VersionPackInfo, hash_bytes},
    events::ErrorKind,
};
use quark_test_utils::{
    ASSET_MID, ASSET_TOP, BUNDLE_C, BUNDLE_D, BUNDLE_E, MemFetcher, archive_for, base_url,
    manifest_url, sample_pack,
};
use rstest::rstest;

use crate::common::{World, asset_options};

/// Sample pack in hash mode with every bundle stamped with its archive hash.
fn hashed_pack() -> VersionPackInfo {
    let mut pack = sample_pack();
    pack.hash_mode = true;
    let hashes: HashMap<String, String> = pack
        .bundle_list
        .iter()
        .map(|bundle| {
            let blob = archive_for(bundle).encode().unwrap();
            (bundle.bundle_path.clone(), hash_bytes(&blob))
        })
        .collect();
    assert_eq!(pack.apply_hash(&hashes), pack.bundle_count());
    pack
}

/// Publishes the manifest and the chain bundles under their fetch names.
fn cdn(pack: &VersionPackInfo, flatten: bool) -> MemFetcher {
    let fetcher = MemFetcher::new();
    let base = base_url();
    fetcher.insert(&manifest_url(&base), pack.to_binary_data(None).unwrap());
    for bundle in &pack.bundle_list {
        let url = base.join(&pack.bundle_fetch_path(bundle, flatten)).unwrap();
        fetcher.insert(&url, archive_for(bundle).encode().unwrap());
    }
    fetcher
}

fn options(flatten: bool) -> RuntimeOptions {
    RuntimeOptions::default().with_assets(asset_options().with_flatten_names(flatten))
}

#[rstest]
fn encrypted_round_trip_keeps_every_path() {
    let common = BundleInfo::new(
        10,
        "ui/common.bundle",
        ["ui/common/font.ttf", "shared/logo.png"],
        ["core.bundle"],
    );
    let core = BundleInfo::new(11, "core.bundle", ["boot.json"], Vec::<&str>::new())
        .with_hash("c0ffee");
    let mut pack = VersionPackInfo::new("2.4.1", "android", true, vec![common, core]);
    pack.initialize();
    let cipher = ManifestCipher::from_passphrase("release-key");

    let blob = pack.to_binary_data(Some(&cipher)).unwrap();
    let restored = VersionPackInfo::from_binary_data(&blob, Some(&cipher));

    assert_eq!(restored, pack);
    assert_eq!(
        restored
            .get_bundle_info_from_asset_path("shared/logo.png")
            .map(|b| b.bundle_path.as_str()),
        Some("ui/common.bundle")
    );
    assert_eq!(
        restored.dependency_closure("ui/common.bundle").unwrap(),
        vec!["core.bundle".to_owned(), "ui/common.bundle".to_owned()]
    );
    assert!(!VersionPackInfo::from_binary_data(&blob, None).is_valid());
}

#[rstest]
#[case::by_path(false)]
#[case::flattened(true)]
fn hash_mode_bundles_load_from_qualified_names(#[case] flatten: bool) {
    let pack = hashed_pack();
    let mut world = World::booted(options(flatten), cdn(&pack, flatten));

    let top = world.load(ASSET_TOP);
    world.settle();

    assert_eq!(top.borrow().clone(), Some(Some("chain/e/top.txt contents".to_owned())));
    assert_eq!(
        world.loaded(),
        vec![BUNDLE_C.to_owned(), BUNDLE_D.to_owned(), BUNDLE_E.to_owned()]
    );
    let bundle_e = pack.get_bundle_info_from_bundle_path(BUNDLE_E).unwrap();
    let url = base_url()
        .join(&pack.bundle_fetch_path(bundle_e, flatten))
        .unwrap();
    assert!(url.path().contains(&bundle_e.hash));
    assert_eq!(world.fetcher.calls(&url), 1);
}

#[rstest]
fn tampered_bundle_is_rejected() {
    let pack = hashed_pack();
    let fetcher = cdn(&pack, false);
    let bundle_d = pack.get_bundle_info_from_bundle_path(BUNDLE_D).unwrap();
    fetcher.insert(
        &base_url().join(&pack.bundle_fetch_path(bundle_d, false)).unwrap(),
        b"not the published archive".to_vec(),
    );
    let mut world = World::booted(options(false), fetcher);

    let mid = world.load(ASSET_MID);
    world.settle();

    assert_eq!(*mid.borrow(), Some(None));
    assert_eq!(world.errors.borrow()[0].kind, ErrorKind::Parse);
    assert_eq!(world.runtime.assets().bundle_stage(BUNDLE_D), None);
}
