use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use bytes::Bytes;
use quark::{
    Runtime, RuntimeOptions,
    assets::{AssetOptions, AssetsResult},
    bundle::MANIFEST_NAME,
    events::{ErrorKind, FrameworkError},
    net::{NetOptions, RetryPolicy},
};
use quark_test_utils::{
    ASSET_BROKEN, ASSET_Y, BUNDLE_BROKEN, TestHttpServer, archive_for, init_test_tracing,
    sample_pack,
};
use tokio::runtime::Handle;

use crate::common::{FRAME, Slot};

/// Sample pack under `/bundles/`, without the broken bundle.
async fn cdn() -> TestHttpServer {
    let pack = sample_pack();
    let mut blobs = HashMap::new();
    blobs.insert(
        format!("bundles/{MANIFEST_NAME}"),
        Bytes::from(pack.to_binary_data(None).unwrap()),
    );
    for bundle in &pack.bundle_list {
        if bundle.bundle_path == BUNDLE_BROKEN {
            continue;
        }
        blobs.insert(
            format!("bundles/{}", pack.bundle_fetch_path(bundle, false)),
            Bytes::from(archive_for(bundle).encode().unwrap()),
        );
    }
    TestHttpServer::with_blobs(blobs).await
}

fn http_runtime(server: &TestHttpServer) -> Runtime {
    init_test_tracing();
    let options = RuntimeOptions::default()
        .with_net(NetOptions::default().with_request_timeout(Duration::from_secs(5)))
        .with_assets(
            AssetOptions::default()
                .with_base_url(server.url("bundles/"))
                .with_retry_policy(RetryPolicy::none()),
        );
    Runtime::with_http(options, Handle::current()).unwrap()
}

/// Ticks until `done` holds, giving the HTTP workers time between frames.
async fn tick_until(runtime: &mut Runtime, done: impl Fn() -> bool) {
    for _ in 0..1_000 {
        runtime.tick(FRAME);
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("runtime did not settle");
}

async fn boot(runtime: &mut Runtime) {
    let outcome: Rc<RefCell<Option<AssetsResult<()>>>> = Rc::default();
    let sink = Rc::clone(&outcome);
    runtime
        .assets()
        .initialize(move |result| *sink.borrow_mut() = Some(result));
    tick_until(runtime, || outcome.borrow().is_some()).await;
    assert_eq!(*outcome.borrow(), Some(Ok(())));
}

fn load(runtime: &Runtime, asset_path: &str) -> Slot<String> {
    let slot: Slot<String> = Rc::default();
    let sink = Rc::clone(&slot);
    runtime
        .assets()
        .load_asset_async::<String, _>(asset_path, move |value| *sink.borrow_mut() = Some(value));
    slot
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loads_bundles_over_http() {
    let server = cdn().await;
    let mut runtime = http_runtime(&server);
    boot(&mut runtime).await;

    let y = load(&runtime, ASSET_Y);
    tick_until(&mut runtime, || y.borrow().is_some()).await;

    assert_eq!(y.borrow().clone(), Some(Some("ui/b/y.txt contents".to_owned())));
    assert_eq!(runtime.assets().stats().loaded, 2);
    assert_eq!(runtime.assets().stats().downloads, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_bundle_surfaces_a_network_error() {
    let server = cdn().await;
    let mut runtime = http_runtime(&server);
    let errors: Rc<RefCell<Vec<FrameworkError>>> = Rc::default();
    let sink = Rc::clone(&errors);
    runtime
        .events()
        .subscribe(move |error: &FrameworkError| sink.borrow_mut().push(error.clone()));
    boot(&mut runtime).await;

    let broken = load(&runtime, ASSET_BROKEN);
    tick_until(&mut runtime, || broken.borrow().is_some()).await;

    assert_eq!(*broken.borrow(), Some(None));
    assert_eq!(errors.borrow().len(), 1);
    assert_eq!(errors.borrow()[0].kind, ErrorKind::Network);
}
