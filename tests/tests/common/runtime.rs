use std::{cell::RefCell, rc::Rc};

use quark::{
    Runtime, RuntimeOptions,
    assets::{AssetOptions, AssetsResult},
    events::{AssetEvent, FrameworkError},
    net::{Fetcher, RetryPolicy},
};
use quark_test_utils::{MemFetcher, base_url, bundle_url, init_test_tracing, sample_pack};

/// Slot a load callback writes into: `None` until the callback runs.
pub type Slot<T> = Rc<RefCell<Option<Option<T>>>>;

/// One frame at 60 fps.
pub const FRAME: f32 = 1.0 / 60.0;

pub fn asset_options() -> AssetOptions {
    AssetOptions::default()
        .with_base_url(base_url())
        .with_retry_policy(RetryPolicy::none())
}

/// A [`Runtime`] over an in-memory CDN that records every asset event and framework error.
pub struct World {
    pub runtime: Runtime,
    pub fetcher: Rc<MemFetcher>,
    pub asset_events: Rc<RefCell<Vec<AssetEvent>>>,
    pub errors: Rc<RefCell<Vec<FrameworkError>>>,
}

impl World {
    pub fn new(options: RuntimeOptions, fetcher: MemFetcher) -> Self {
        init_test_tracing();
        let fetcher = Rc::new(fetcher);
        let dyn_fetcher: Rc<dyn Fetcher> = fetcher.clone();
        let runtime = Runtime::new(options, dyn_fetcher);

        let asset_events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&asset_events);
        runtime
            .events()
            .subscribe(move |event: &AssetEvent| sink.borrow_mut().push(event.clone()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        runtime
            .events()
            .subscribe(move |error: &FrameworkError| sink.borrow_mut().push(error.clone()));

        Self {
            runtime,
            fetcher,
            asset_events,
            errors,
        }
    }

    /// Downloads the manifest and clears the recorded events.
    pub fn booted(options: RuntimeOptions, fetcher: MemFetcher) -> Self {
        let mut world = Self::new(options, fetcher);
        assert_eq!(world.initialize(), Some(Ok(())));
        world.asset_events.borrow_mut().clear();
        world
    }

    pub fn initialize(&mut self) -> Option<AssetsResult<()>> {
        let outcome = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&outcome);
        self.runtime
            .assets()
            .initialize(move |result| *sink.borrow_mut() = Some(result));
        self.settle();
        outcome.take()
    }

    pub fn frames(&mut self, count: usize) {
        for _ in 0..count {
            self.runtime.tick(FRAME);
        }
    }

    /// Enough frames for ready downloads and their follow-up work to finish.
    pub fn settle(&mut self) {
        self.frames(6);
    }

    /// One long frame, e.g. to run out a retain window.
    pub fn advance(&mut self, seconds: f32) {
        self.runtime.tick(seconds);
    }

    pub fn load(&self, asset_path: &str) -> Slot<String> {
        let slot: Slot<String> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&slot);
        self.runtime
            .assets()
            .load_asset_async::<String, _>(asset_path, move |value| {
                *sink.borrow_mut() = Some(value);
            });
        slot
    }

    /// Fetches issued for a sample bundle.
    pub fn downloads(&self, bundle_path: &str) -> u32 {
        self.fetcher
            .calls(&bundle_url(&base_url(), &sample_pack(), bundle_path))
    }

    pub fn loaded(&self) -> Vec<String> {
        self.asset_events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                AssetEvent::BundleLoaded { bundle } => Some(bundle.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn unloaded(&self) -> Vec<String> {
        self.asset_events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                AssetEvent::BundleUnloaded { bundle } => Some(bundle.clone()),
                _ => None,
            })
            .collect()
    }
}

pub fn options() -> RuntimeOptions {
    RuntimeOptions::default().with_assets(asset_options())
}
