
use std::{cell::RefCell, rc::Rc};

use fixture::{Harness, options};
use quark_assets::{AssetOptions, AssetsError, AssetsResult};
use quark_bundle::ManifestCipher;
use quark_events::{AssetEvent, ErrorKind};
use quark_test_utils::{
    ASSET_X, BUNDLE_BROKEN, MemFetcher, base_url, manifest_url, publish, sample_fetcher,
    sample_pack,
};
use rstest::rstest;

type Outcome = Rc<RefCell<Option<AssetsResult<()>>>>;

fn initialize(h: &mut Harness) -> Outcome {
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    h.provider
        .initialize(move |result| *sink.borrow_mut() = Some(result));
    h.settle();
    outcome
}

#[rstest]
fn initialize_installs_the_manifest() {
    let mut h = Harness::without_manifest(options(), sample_fetcher());
    let outcome = initialize(&mut h);

    assert_eq!(*outcome.borrow(), Some(Ok(())));
    assert_eq!(
        h.asset_events.borrow()[0],
        AssetEvent::ManifestLoaded {
            version: "1.0.0".to_owned(),
            bundles: 6
        }
    );
    assert_eq!(h.fetcher.calls(&manifest_url(&base_url())), 1);

    let x = h.load_string(ASSET_X);
    h.settle();
    assert!(x.borrow().as_ref().is_some_and(Option::is_some));
}

#[rstest]
#[case::matching_key("release-key", "release-key", true)]
#[case::wrong_key("release-key", "debug-key", false)]
fn encrypted_manifest(#[case] written_with: &str, #[case] read_with: &str, #[case] ok: bool) {
    let fetcher = MemFetcher::new();
    let writer = ManifestCipher::from_passphrase(written_with);
    publish(&fetcher, &base_url(), &sample_pack(), Some(&writer), &[BUNDLE_BROKEN]);

    let reader = ManifestCipher::from_passphrase(read_with);
    let mut h = Harness::without_manifest(options().with_cipher(reader), fetcher);
    let outcome = initialize(&mut h);

    if ok {
        assert_eq!(*outcome.borrow(), Some(Ok(())));
        assert!(h.provider.manifest().is_some());
    } else {
        assert!(matches!(*outcome.borrow(), Some(Err(AssetsError::Parse(_)))));
        assert_eq!(h.errors.borrow()[0].kind, ErrorKind::Parse);
        assert!(h.provider.manifest().is_none());
    }
}

#[rstest]
fn plain_reader_rejects_encrypted_manifest() {
    let fetcher = MemFetcher::new();
    let cipher = ManifestCipher::from_passphrase("release-key");
    publish(&fetcher, &base_url(), &sample_pack(), Some(&cipher), &[]);

    let mut h = Harness::without_manifest(options(), fetcher);
    let outcome = initialize(&mut h);
    assert!(matches!(*outcome.borrow(), Some(Err(AssetsError::Parse(_)))));
}

#[rstest]
fn missing_manifest_is_a_network_error() {
    let mut h = Harness::without_manifest(options(), MemFetcher::new());
    let outcome = initialize(&mut h);

    assert!(matches!(*outcome.borrow(), Some(Err(AssetsError::Network(_)))));
    let errors = h.errors.borrow();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Network);
}

#[rstest]
fn initialize_without_base_url_fails_immediately() {
    let mut h = Harness::without_manifest(AssetOptions::default(), sample_fetcher());
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    h.provider
        .initialize(move |result| *sink.borrow_mut() = Some(result));

    assert!(matches!(*outcome.borrow(), Some(Err(AssetsError::Network(_)))));
    h.settle();
    assert_eq!(h.fetcher.total_calls(), 0);
}

#[rstest]
fn shutdown_cancels_manifest_download() {
    let mut h = Harness::without_manifest(options(), sample_fetcher());
    h.fetcher.set_hold(true);
    let outcome: Outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    h.provider
        .initialize(move |result| *sink.borrow_mut() = Some(result));
    h.settle();

    h.provider.shutdown();
    h.settle();

    assert!(matches!(*outcome.borrow(), Some(Err(AssetsError::ShutDown))));
    assert!(h.provider.manifest().is_none());
    assert!(h.errors.borrow().is_empty());
}
