use quark::assets::BundleStage;
use quark_test_utils::{ASSET_TOP, ASSET_X, BUNDLE_A, BUNDLE_C, BUNDLE_D, BUNDLE_E, sample_fetcher};
use rstest::{fixture, rstest};

use crate::common::{World, options};

/// C <- D <- E loaded through the top asset, then released: all three retained.
#[fixture]
fn retained_chain() -> World {
    let mut world = World::booted(options(), sample_fetcher());
    let _top = world.load(ASSET_TOP);
    world.settle();
    world.runtime.assets().unload_asset(ASSET_TOP);
    world
}

fn stages(world: &World) -> Vec<Option<BundleStage>> {
    [BUNDLE_C, BUNDLE_D, BUNDLE_E]
        .iter()
        .map(|bundle| world.runtime.assets().bundle_stage(bundle))
        .collect()
}

#[rstest]
fn one_layer_at_a_time(retained_chain: World) {
    let world = retained_chain;
    let assets = world.runtime.assets().clone();

    assert_eq!(assets.unload_unused_assets(1), 1);
    assert_eq!(
        stages(&world),
        vec![Some(BundleStage::Retained), Some(BundleStage::Retained), None]
    );

    assert_eq!(assets.unload_unused_assets(2), 2);
    assert_eq!(stages(&world), vec![None, None, None]);
    assert_eq!(
        world.unloaded(),
        vec![BUNDLE_E.to_owned(), BUNDLE_D.to_owned(), BUNDLE_C.to_owned()]
    );
}

#[rstest]
fn retain_timers_of_evicted_bundles_do_nothing(retained_chain: World) {
    let mut world = retained_chain;
    world.runtime.assets().unload_unused_assets(usize::MAX);
    world.advance(10.0);

    assert_eq!(world.unloaded().len(), 3);
    assert_eq!(world.runtime.assets().stats().unloads, 3);
}

#[rstest]
fn referenced_bundles_survive(retained_chain: World) {
    let mut world = retained_chain;
    let _x = world.load(ASSET_X);
    world.settle();

    assert_eq!(world.runtime.assets().unload_unused_assets(usize::MAX), 3);
    assert_eq!(
        world.runtime.assets().bundle_stage(BUNDLE_A),
        Some(BundleStage::Loaded)
    );
}

#[rstest]
fn evicted_chain_reloads_from_the_network(retained_chain: World) {
    let mut world = retained_chain;
    world.runtime.assets().unload_unused_assets(usize::MAX);

    let top = world.load(ASSET_TOP);
    world.settle();

    assert!(top.borrow().as_ref().is_some_and(Option::is_some));
    for bundle in [BUNDLE_C, BUNDLE_D, BUNDLE_E] {
        assert_eq!(world.downloads(bundle), 2, "{bundle}");
    }
}
