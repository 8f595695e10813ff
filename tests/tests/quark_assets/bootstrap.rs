use quark::{
    RuntimeOptions,
    assets::AssetsError,
    bundle::ManifestCipher,
    events::{AssetEvent, ErrorKind},
    net::RetryPolicy,
};
use quark_test_utils::{ASSET_MID, BUNDLE_BROKEN, MemFetcher, base_url, publish, sample_pack};
use rstest::rstest;

use crate::common::World;

const SETTINGS: &str = r#"{
    "timer": { "max_fires_per_tick": 4 },
    "assets": {
        "retain_time": 0.5,
        "base_url": "http://cdn.test/bundles/",
        "manifest_name": "bundle_pack"
    }
}"#;

fn settings(cipher: &str) -> RuntimeOptions {
    let mut options = RuntimeOptions::from_json(SETTINGS).unwrap();
    options.assets = options
        .assets
        .with_retry_policy(RetryPolicy::none())
        .with_cipher(ManifestCipher::from_passphrase(cipher));
    options
}

fn encrypted_cdn(passphrase: &str) -> MemFetcher {
    let fetcher = MemFetcher::new();
    let cipher = ManifestCipher::from_passphrase(passphrase);
    publish(&fetcher, &base_url(), &sample_pack(), Some(&cipher), &[BUNDLE_BROKEN]);
    fetcher
}

#[rstest]
fn boots_from_settings_and_an_encrypted_manifest() {
    let mut world = World::new(settings("release-key"), encrypted_cdn("release-key"));
    assert_eq!(world.runtime.options().timer.max_fires_per_tick, 4);

    assert_eq!(world.initialize(), Some(Ok(())));
    assert_eq!(
        world.asset_events.borrow()[0],
        AssetEvent::ManifestLoaded {
            version: "1.0.0".to_owned(),
            bundles: 6
        }
    );

    let mid = world.load(ASSET_MID);
    world.settle();
    assert_eq!(mid.borrow().clone(), Some(Some("chain/d/mid.txt contents".to_owned())));

    // Configured retain window is half a second.
    world.runtime.assets().unload_asset(ASSET_MID);
    world.advance(0.6);
    assert_eq!(world.unloaded().len(), 2);
}

#[rstest]
fn wrong_key_fails_bootstrap_with_a_parse_error() {
    let mut world = World::new(settings("debug-key"), encrypted_cdn("release-key"));

    assert!(matches!(world.initialize(), Some(Err(AssetsError::Parse(_)))));
    assert_eq!(world.errors.borrow()[0].kind, ErrorKind::Parse);
    assert!(world.runtime.assets().manifest().is_none());

    let mid = world.load(ASSET_MID);
    world.settle();
    assert_eq!(*mid.borrow(), Some(None));
}
