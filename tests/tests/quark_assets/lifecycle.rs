use quark::{assets::BundleStage, events::ErrorKind};
use quark_test_utils::{
    ASSET_BROKEN, ASSET_LEAF, ASSET_X, ASSET_Y, BUNDLE_A, BUNDLE_B, BUNDLE_BROKEN, sample_fetcher,
};
use rstest::{fixture, rstest};

use crate::common::{World, options};

#[fixture]
fn world() -> World {
    World::booted(options(), sample_fetcher())
}

#[rstest]
fn dependent_asset_loads_after_its_dependency(mut world: World) {
    let y = world.load(ASSET_Y);
    world.settle();

    assert_eq!(y.borrow().clone(), Some(Some("ui/b/y.txt contents".to_owned())));
    assert_eq!(world.loaded(), vec![BUNDLE_A.to_owned(), BUNDLE_B.to_owned()]);
    assert_eq!(world.runtime.assets().bundle_ref_count(BUNDLE_A), 1);
    assert_eq!(world.runtime.assets().bundle_ref_count(BUNDLE_B), 1);
    assert_eq!(world.runtime.assets().asset_ref_count(ASSET_Y), 1);
}

#[rstest]
fn reload_within_retain_window_skips_the_network(mut world: World) {
    let _first = world.load(ASSET_Y);
    world.settle();
    assert!(world.runtime.assets().unload_asset(ASSET_Y));
    assert_eq!(
        world.runtime.assets().bundle_stage(BUNDLE_B),
        Some(BundleStage::Retained)
    );

    world.advance(1.0);
    let second = world.load(ASSET_Y);
    world.settle();

    assert!(second.borrow().as_ref().is_some_and(Option::is_some));
    assert_eq!(world.downloads(BUNDLE_A), 1);
    assert_eq!(world.downloads(BUNDLE_B), 1);
    assert!(world.unloaded().is_empty());

    // The first window was cancelled by the reload; only a full new one unloads.
    world.runtime.assets().unload_asset(ASSET_Y);
    world.advance(2.5);
    assert!(world.unloaded().is_empty());
    world.advance(1.0);

    let mut unloaded = world.unloaded();
    unloaded.sort();
    assert_eq!(unloaded, vec![BUNDLE_A.to_owned(), BUNDLE_B.to_owned()]);
    assert_eq!(world.runtime.assets().stats().bundles(), 0);
}

#[rstest]
fn overlapping_requests_share_downloads(mut world: World) {
    let x = world.load(ASSET_X);
    let y = world.load(ASSET_Y);
    let again = world.load(ASSET_Y);
    world.settle();

    for slot in [&x, &y, &again] {
        assert!(slot.borrow().as_ref().is_some_and(Option::is_some));
    }
    assert_eq!(world.downloads(BUNDLE_A), 1);
    assert_eq!(world.downloads(BUNDLE_B), 1);
    assert_eq!(world.runtime.assets().bundle_ref_count(BUNDLE_A), 3);
    assert_eq!(world.runtime.assets().asset_ref_count(ASSET_Y), 2);
}

#[rstest]
fn releases_balance_acquisitions(mut world: World) {
    let _x = world.load(ASSET_X);
    let _y = world.load(ASSET_Y);
    world.settle();
    let assets = world.runtime.assets().clone();

    assert!(assets.unload_asset(ASSET_Y));
    assert_eq!(assets.bundle_ref_count(BUNDLE_A), 1);
    assert_eq!(assets.bundle_stage(BUNDLE_A), Some(BundleStage::Loaded));
    assert_eq!(assets.bundle_stage(BUNDLE_B), Some(BundleStage::Retained));

    assert!(assets.unload_asset(ASSET_X));
    assert!(!assets.unload_asset(ASSET_X));
    assert_eq!(assets.bundle_ref_count(BUNDLE_A), 0);
    assert_eq!(assets.asset_ref_count(ASSET_X), 0);
}

#[rstest]
fn failed_download_reports_a_network_error(mut world: World) {
    let broken = world.load(ASSET_BROKEN);
    world.settle();

    assert_eq!(*broken.borrow(), Some(None));
    let errors = world.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Network);
    assert_eq!(world.runtime.assets().bundle_stage(BUNDLE_BROKEN), None);
}

#[rstest]
fn shutdown_drops_every_bundle(mut world: World) {
    let _y = world.load(ASSET_Y);
    world.settle();
    let pending = world.load(ASSET_LEAF);

    world.runtime.shutdown();

    assert_eq!(*pending.borrow(), Some(None));
    assert_eq!(world.runtime.assets().stats().bundles(), 0);
    assert!(world.runtime.assets().is_shut_down());
}
