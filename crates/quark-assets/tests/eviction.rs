
use fixture::{Harness, options};
use quark_assets::BundleStage;
use quark_test_utils::{ASSET_MID, ASSET_TOP, ASSET_X, BUNDLE_A, BUNDLE_C, BUNDLE_D, BUNDLE_E};
use rstest::{fixture, rstest};

/// C <- D <- E chain loaded through the top asset and released: all three retained.
#[fixture]
fn retained_chain() -> Harness {
    let mut h = Harness::new(options());
    let _top = h.load_string(ASSET_TOP);
    h.settle();
    h.provider.unload_asset(ASSET_TOP);
    for bundle in [BUNDLE_C, BUNDLE_D, BUNDLE_E] {
        assert_eq!(h.provider.bundle_stage(bundle), Some(BundleStage::Retained));
    }
    h
}

#[rstest]
#[case::one_layer(1, 1, &[BUNDLE_C, BUNDLE_D])]
#[case::two_layers(2, 2, &[BUNDLE_C])]
#[case::exact(3, 3, &[])]
#[case::unbounded(usize::MAX, 3, &[])]
fn forced_eviction_respects_depth(
    retained_chain: Harness,
    #[case] depth: usize,
    #[case] evicted: usize,
    #[case] remaining: &[&str],
) {
    let h = retained_chain;
    assert_eq!(h.provider.unload_unused_assets(depth), evicted);

    for bundle in [BUNDLE_C, BUNDLE_D, BUNDLE_E] {
        let expected = remaining.contains(&bundle).then_some(BundleStage::Retained);
        assert_eq!(h.provider.bundle_stage(bundle), expected, "{bundle}");
    }
}

#[rstest]
fn zero_depth_evicts_nothing(retained_chain: Harness) {
    assert_eq!(retained_chain.provider.unload_unused_assets(0), 0);
    assert_eq!(retained_chain.provider.stats().retained, 3);
}

#[rstest]
fn forced_eviction_emits_unload_events_outermost_first(retained_chain: Harness) {
    let h = retained_chain;
    h.provider.unload_unused_assets(usize::MAX);
    assert_eq!(
        h.unloaded(),
        vec![BUNDLE_E.to_owned(), BUNDLE_D.to_owned(), BUNDLE_C.to_owned()]
    );
}

#[rstest]
fn evicted_bundles_ignore_their_stale_timers(retained_chain: Harness) {
    let mut h = retained_chain;
    h.provider.unload_unused_assets(usize::MAX);
    h.tick(10.0);
    h.tick(10.0);
    assert_eq!(h.provider.stats().unloads, 3);
}

#[rstest]
fn forced_eviction_skips_referenced_bundles() {
    let mut h = Harness::new(options());
    let _mid = h.load_string(ASSET_MID);
    let _top = h.load_string(ASSET_TOP);
    let _x = h.load_string(ASSET_X);
    h.settle();
    h.provider.unload_asset(ASSET_TOP);

    assert_eq!(h.provider.unload_unused_assets(usize::MAX), 1);
    assert_eq!(h.provider.bundle_stage(BUNDLE_E), None);
    assert_eq!(h.provider.bundle_stage(BUNDLE_D), Some(BundleStage::Loaded));
    assert_eq!(h.provider.bundle_stage(BUNDLE_C), Some(BundleStage::Loaded));
    assert_eq!(h.provider.bundle_stage(BUNDLE_A), Some(BundleStage::Loaded));
}

#[rstest]
fn normal_path_still_debounces_after_forced_eviction(retained_chain: Harness) {
    let mut h = retained_chain;
    h.provider.unload_unused_assets(1);

    let _mid = h.load_string(ASSET_MID);
    h.settle();
    h.provider.unload_asset(ASSET_MID);
    assert_eq!(h.provider.bundle_stage(BUNDLE_D), Some(BundleStage::Retained));
    assert_eq!(h.downloads(BUNDLE_D), 1);
}
