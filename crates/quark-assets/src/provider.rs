use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, hash_map::Entry},
    fmt, mem,
    panic::{self, AssertUnwindSafe},
    rc::{Rc, Weak},
};

use bytes::Bytes;
use quark_bundle::{VersionPackInfo, normalize_path};
use quark_events::{AssetEvent, EventBus, FrameworkError};
use quark_net::{Fetcher, NetError};
use quark_task::{DownloadTask, InstantiateTask, TaskId, TaskResult, TaskSpawner};
use quark_timer::{TimerHandle, TimerId};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::{
    asset::{AssetRef, FromAsset, Instance, LoadedBundle},
    decoder::{ArchiveDecoder, BundleDecoder},
    error::{AssetsError, AssetsResult},
    options::AssetOptions,
    source::{AssetSource, NoAssetSource},
    stats::{BundleStage, ProviderStats},
};

type AssetDone = Box<dyn FnOnce(AssetsResult<AssetRef>)>;
type PreloadDone = Box<dyn FnOnce(AssetsResult<()>)>;

/// What a queued request hands its result to.
enum Waiter {
    Asset { asset_path: String, done: AssetDone },
    Preload { done: PreloadDone },
}

impl Waiter {
    fn fail(self, error: AssetsError, effects: &mut Effects) {
        match self {
            Self::Asset { done, .. } => effects.call(move || done(Err(error))),
            Self::Preload { done } => effects.call(move || done(Err(error))),
        }
    }
}

/// An async request holding one reference on every bundle of its closure.
struct Request {
    target: String,
    closure: Vec<String>,
    waiter: Waiter,
}

struct BundleEntry {
    stage: BundleStage,
    refs: usize,
    loaded: Option<Rc<LoadedBundle>>,
    /// Direct dependencies, for forced eviction order.
    dependencies: Vec<String>,
    retain_timer: Option<TimerId>,
    /// Bumped on every retain and revive; a stale retain timer sees a different value.
    generation: u64,
    task: Option<TaskId>,
}

enum Origin {
    /// Each hold references every bundle of the closure once.
    Bundle(Vec<String>),
    /// Loaded through the sync path; holds no bundles.
    Direct,
}

struct AssetEntry {
    refs: usize,
    origin: Origin,
    asset: AssetRef,
}

#[derive(Default)]
struct State {
    manifest: Option<Rc<VersionPackInfo>>,
    bundles: HashMap<String, BundleEntry>,
    assets: HashMap<String, AssetEntry>,
    requests: Vec<Request>,
    manifest_task: Option<TaskId>,
    downloads: u64,
    unloads: u64,
    shut_down: bool,
}

enum Effect {
    Event(AssetEvent),
    Error(FrameworkError),
    Call(Box<dyn FnOnce()>),
}

/// Side effects collected under the state borrow and run after it is released, so callbacks
/// and subscribers may call back into the provider.
#[derive(Default)]
struct Effects(Vec<Effect>);

impl Effects {
    fn event(&mut self, event: AssetEvent) {
        self.0.push(Effect::Event(event));
    }

    fn report(&mut self, error: &AssetsError, context: &str) {
        if !error.is_reported() {
            return;
        }
        if let Some(kind) = error.kind() {
            self.0
                .push(Effect::Error(FrameworkError::new(kind, format!("{context}: {error}"))));
        }
    }

    fn call<F: FnOnce() + 'static>(&mut self, f: F) {
        self.0.push(Effect::Call(Box::new(f)));
    }
}

struct Inner {
    this: Weak<Inner>,
    options: AssetOptions,
    fetcher: Rc<dyn Fetcher>,
    decoder: Box<dyn BundleDecoder>,
    source: Box<dyn AssetSource>,
    timers: TimerHandle,
    tasks: TaskSpawner,
    events: EventBus,
    state: RefCell<State>,
}

impl Inner {
    fn with_state<R>(&self, f: impl FnOnce(&Self, &mut State, &mut Effects) -> R) -> R {
        let mut effects = Effects::default();
        let result = {
            let mut state = self.state.borrow_mut();
            f(self, &mut *state, &mut effects)
        };
        self.apply(effects);
        result
    }

    /// Runs every effect of the batch. A panicking callback or subscriber does not stop the
    /// rest; the first panic resumes once the batch is delivered.
    fn apply(&self, effects: Effects) {
        let mut first_panic = None;
        for effect in effects.0 {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match effect {
                Effect::Event(event) => self.events.send(&event),
                Effect::Error(error) => self.events.send(&error),
                Effect::Call(f) => f(),
            }));
            if let Err(payload) = outcome {
                error!("asset callback panicked");
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }

    fn base_url(&self) -> AssetsResult<&Url> {
        self.options
            .base_url
            .as_ref()
            .ok_or_else(|| NetError::InvalidUrl("no base url configured".to_owned()).into())
    }

    fn join(&self, relative: &str) -> AssetsResult<Url> {
        self.base_url()?
            .join(relative)
            .map_err(|e| NetError::InvalidUrl(format!("{relative}: {e}")).into())
    }

    fn bundle_url(&self, manifest: &VersionPackInfo, bundle_path: &str) -> AssetsResult<Url> {
        let bundle = manifest
            .get_bundle_info_from_bundle_path(bundle_path)
            .ok_or_else(|| AssetsError::MissingAsset(bundle_path.to_owned()))?;
        self.join(&manifest.bundle_fetch_path(bundle, self.options.flatten_names))
    }

    // Requests

    fn request_asset(&self, asset_path: &str, done: AssetDone) {
        let asset_path = normalize_path(asset_path);
        self.with_state(|this, state, effects| {
            if state.shut_down {
                effects.call(move || done(Err(AssetsError::ShutDown)));
                return;
            }

            if let Some(asset) = this.hold_asset(state, &asset_path) {
                trace!(asset = %asset_path, "asset served from cache");
                effects.call(move || done(Ok(asset)));
                return;
            }

            let target = state.manifest.as_ref().and_then(|manifest| {
                manifest
                    .get_bundle_info_from_asset_path(&asset_path)
                    .map(|bundle| bundle.bundle_path.clone())
            });
            let Some(target) = target else {
                effects.call(move || done(Err(AssetsError::MissingAsset(asset_path))));
                return;
            };

            let waiter = Waiter::Asset { asset_path, done };
            this.submit(state, target, waiter, effects);
        });
    }

    fn request_bundle(&self, bundle_path: &str, done: PreloadDone) {
        let bundle_path = normalize_path(bundle_path);
        self.with_state(|this, state, effects| {
            if state.shut_down {
                effects.call(move || done(Err(AssetsError::ShutDown)));
                return;
            }

            let known = state.manifest.as_ref().is_some_and(|manifest| {
                manifest
                    .get_bundle_info_from_bundle_path(&bundle_path)
                    .is_some()
            });
            if !known {
                effects.call(move || done(Err(AssetsError::MissingAsset(bundle_path))));
                return;
            }

            this.submit(state, bundle_path, Waiter::Preload { done }, effects);
        });
    }

    /// Reserves the closure of `target`, queues the request and completes whatever is ready.
    fn submit(&self, state: &mut State, target: String, waiter: Waiter, effects: &mut Effects) {
        let Some(manifest) = state.manifest.clone() else {
            waiter.fail(AssetsError::MissingAsset(target), effects);
            return;
        };

        let closure = match manifest.dependency_closure(&target) {
            Ok(closure) => closure,
            Err(e) => {
                let error = AssetsError::from(e);
                error!(bundle = %target, %error, "dependency closure failed");
                effects.report(&error, &target);
                waiter.fail(error, effects);
                return;
            }
        };

        if let Err(error) = self.reserve(state, &manifest, &closure) {
            error!(bundle = %target, %error, "bundle request rejected");
            effects.report(&error, &target);
            waiter.fail(error, effects);
            return;
        }

        trace!(bundle = %target, closure = closure.len(), "request queued");
        state.requests.push(Request {
            target,
            closure,
            waiter,
        });
        self.complete_ready(state, effects);
    }

    /// Takes one reference on every bundle of `closure`, scheduling downloads for the absent
    /// ones. Nothing is reserved when any URL cannot be built.
    fn reserve(
        &self,
        state: &mut State,
        manifest: &VersionPackInfo,
        closure: &[String],
    ) -> AssetsResult<()> {
        let mut urls = HashMap::new();
        for path in closure {
            if !state.bundles.contains_key(path) {
                urls.insert(path.as_str(), self.bundle_url(manifest, path)?);
            }
        }

        for path in closure {
            if let Some(entry) = state.bundles.get_mut(path) {
                self.hold_bundle(path, entry);
                continue;
            }
            if let Some(url) = urls.remove(path.as_str()) {
                self.start_download(state, manifest, path, url);
            }
        }
        Ok(())
    }

    fn start_download(
        &self,
        state: &mut State,
        manifest: &VersionPackInfo,
        bundle_path: &str,
        url: Url,
    ) {
        let dependencies = manifest
            .get_bundle_info_from_bundle_path(bundle_path)
            .map(|bundle| bundle.dependency_list.clone())
            .unwrap_or_default();

        debug!(bundle = %bundle_path, %url, "bundle download scheduled");
        let this = self.this.clone();
        let key = bundle_path.to_owned();
        let task = self.tasks.add_task(DownloadTask::new(
            url,
            Rc::clone(&self.fetcher),
            self.options.retry_policy.clone(),
            move |result| {
                if let Some(inner) = this.upgrade() {
                    inner.bundle_fetched(&key, result);
                }
            },
        ));

        state.bundles.insert(
            bundle_path.to_owned(),
            BundleEntry {
                stage: BundleStage::Loading,
                refs: 1,
                loaded: None,
                dependencies,
                retain_timer: None,
                generation: 0,
                task: Some(task),
            },
        );
        state.downloads += 1;
    }

    // Reference counting

    fn hold_bundle(&self, bundle_path: &str, entry: &mut BundleEntry) {
        entry.refs += 1;
        if entry.stage == BundleStage::Retained {
            if let Some(id) = entry.retain_timer.take() {
                self.timers.stop_timer(id);
            }
            entry.generation += 1;
            entry.stage = BundleStage::Loaded;
            debug!(bundle = %bundle_path, "bundle revived");
        }
        trace!(bundle = %bundle_path, refs = entry.refs, "bundle acquired");
    }

    /// Takes another reference on a held asset and on its bundles.
    fn hold_asset(&self, state: &mut State, asset_path: &str) -> Option<AssetRef> {
        let entry = state.assets.get_mut(asset_path)?;
        entry.refs += 1;
        let asset = entry.asset.clone();
        if let Origin::Bundle(closure) = &entry.origin {
            for path in closure.clone() {
                match state.bundles.get_mut(&path) {
                    Some(bundle) => self.hold_bundle(&path, bundle),
                    None => warn!(bundle = %path, asset = %asset_path, "held asset lost its bundle"),
                }
            }
        }
        Some(asset)
    }

    fn release_bundle(&self, state: &mut State, bundle_path: &str, effects: &mut Effects) {
        let Some(entry) = state.bundles.get_mut(bundle_path) else {
            warn!(bundle = %bundle_path, "release of an uncached bundle");
            return;
        };
        if entry.refs == 0 {
            warn!(bundle = %bundle_path, "bundle released more often than acquired");
            return;
        }

        entry.refs -= 1;
        trace!(bundle = %bundle_path, refs = entry.refs, "bundle released");
        if entry.refs == 0 && entry.stage == BundleStage::Loaded {
            self.retain(state, bundle_path, effects);
        }
    }

    fn release_asset(&self, state: &mut State, asset_path: &str, effects: &mut Effects) -> bool {
        let Some(entry) = state.assets.get_mut(asset_path) else {
            warn!(asset = %asset_path, "unload of an asset that is not held");
            return false;
        };

        entry.refs -= 1;
        let closure = match &entry.origin {
            Origin::Bundle(closure) => closure.clone(),
            Origin::Direct => Vec::new(),
        };
        if entry.refs == 0 {
            state.assets.remove(asset_path);
            debug!(asset = %asset_path, "asset released");
        }
        for path in &closure {
            self.release_bundle(state, path, effects);
        }
        true
    }

    /// Starts the debounce window of an unreferenced, loaded bundle.
    fn retain(&self, state: &mut State, bundle_path: &str, effects: &mut Effects) {
        let retain_time = self.options.retain_time;
        if retain_time <= 0.0 {
            self.unload_bundle(state, bundle_path, effects);
            return;
        }
        let Some(entry) = state.bundles.get_mut(bundle_path) else {
            return;
        };

        entry.stage = BundleStage::Retained;
        entry.generation += 1;
        let generation = entry.generation;
        let this = self.this.clone();
        let key = bundle_path.to_owned();
        entry.retain_timer = Some(self.timers.after(retain_time, move || {
            if let Some(inner) = this.upgrade() {
                inner.retain_expired(&key, generation);
            }
        }));
        debug!(bundle = %bundle_path, retain_time, "bundle retained");
    }

    fn retain_expired(&self, bundle_path: &str, generation: u64) {
        self.with_state(|this, state, effects| {
            let Some(entry) = state.bundles.get_mut(bundle_path) else {
                return;
            };
            if entry.stage != BundleStage::Retained || entry.generation != generation {
                return;
            }
            entry.retain_timer = None;
            this.unload_bundle(state, bundle_path, effects);
        });
    }

    fn unload_bundle(&self, state: &mut State, bundle_path: &str, effects: &mut Effects) {
        let Some(entry) = state.bundles.remove(bundle_path) else {
            return;
        };
        if let Some(id) = entry.retain_timer {
            self.timers.stop_timer(id);
        }
        if let Some(id) = entry.task {
            self.tasks.cancel_task(id);
        }

        state.unloads += 1;
        debug!(bundle = %bundle_path, stage = %entry.stage, refs = entry.refs, "bundle unloaded");
        if entry.loaded.is_some() {
            effects.event(AssetEvent::BundleUnloaded {
                bundle: bundle_path.to_owned(),
            });
        }
    }

    // Completion

    fn bundle_fetched(&self, bundle_path: &str, result: TaskResult<Bytes>) {
        self.with_state(|this, state, effects| {
            let manifest = state.manifest.clone();
            let Some(entry) = state.bundles.get_mut(bundle_path) else {
                debug!(bundle = %bundle_path, "fetch finished for a dropped bundle");
                return;
            };
            if entry.stage != BundleStage::Loading {
                return;
            }
            entry.task = None;

            let decoded = result.map_err(AssetsError::from).and_then(|data| {
                let bundle = manifest
                    .as_deref()
                    .and_then(|m| m.get_bundle_info_from_bundle_path(bundle_path))
                    .ok_or_else(|| AssetsError::MissingAsset(bundle_path.to_owned()))?;
                this.decoder.decode(bundle, data)
            });

            match decoded {
                Ok(loaded) => {
                    entry.loaded = Some(Rc::new(loaded));
                    entry.stage = BundleStage::Loaded;
                    let unreferenced = entry.refs == 0;
                    debug!(bundle = %bundle_path, "bundle loaded");
                    effects.event(AssetEvent::BundleLoaded {
                        bundle: bundle_path.to_owned(),
                    });
                    if unreferenced {
                        this.retain(state, bundle_path, effects);
                    }
                    this.complete_ready(state, effects);
                }
                Err(error) => {
                    state.bundles.remove(bundle_path);
                    error!(bundle = %bundle_path, %error, "bundle load failed");
                    effects.report(&error, bundle_path);
                    this.fail_waiting(state, bundle_path, &error, effects);
                }
            }
        });
    }

    fn complete_ready(&self, state: &mut State, effects: &mut Effects) {
        let (ready, waiting): (Vec<_>, Vec<_>) =
            mem::take(&mut state.requests)
                .into_iter()
                .partition(|request| {
                    request.closure.iter().all(|path| {
                        state
                            .bundles
                            .get(path)
                            .is_some_and(|entry| entry.stage == BundleStage::Loaded)
                    })
                });
        state.requests = waiting;

        for request in ready {
            self.finish(state, request, effects);
        }
    }

    fn finish(&self, state: &mut State, request: Request, effects: &mut Effects) {
        let Request {
            target,
            closure,
            waiter,
        } = request;

        let (asset_path, done) = match waiter {
            Waiter::Preload { done } => {
                for path in &closure {
                    self.release_bundle(state, path, effects);
                }
                debug!(bundle = %target, "bundle preloaded");
                effects.call(move || done(Ok(())));
                return;
            }
            Waiter::Asset { asset_path, done } => (asset_path, done),
        };

        let data = state
            .bundles
            .get(&target)
            .and_then(|entry| entry.loaded.as_ref())
            .and_then(|bundle| bundle.get(&asset_path));
        let Some(data) = data else {
            error!(asset = %asset_path, bundle = %target, "asset missing from its bundle");
            for path in &closure {
                self.release_bundle(state, path, effects);
            }
            effects.call(move || done(Err(AssetsError::MissingAsset(asset_path))));
            return;
        };

        let direct = state
            .assets
            .get(&asset_path)
            .is_some_and(|entry| matches!(entry.origin, Origin::Direct));
        if direct {
            for path in &closure {
                self.release_bundle(state, path, effects);
            }
        }
        // A bundle-backed entry shares this closure, so the reservation becomes its hold.
        let asset = match state.assets.entry(asset_path.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.refs += 1;
                entry.asset.clone()
            }
            Entry::Vacant(vacant) => {
                let asset = AssetRef::new(asset_path.clone(), data);
                vacant.insert(AssetEntry {
                    refs: 1,
                    origin: Origin::Bundle(closure),
                    asset: asset.clone(),
                });
                asset
            }
        };

        debug!(asset = %asset_path, bundle = %target, "asset loaded");
        effects.call(move || done(Ok(asset)));
    }

    /// Fails every request whose closure contains `failed`, releasing their other reservations.
    fn fail_waiting(
        &self,
        state: &mut State,
        failed: &str,
        error: &AssetsError,
        effects: &mut Effects,
    ) {
        let (failed_requests, waiting): (Vec<_>, Vec<_>) = mem::take(&mut state.requests)
            .into_iter()
            .partition(|request| request.closure.iter().any(|path| path == failed));
        state.requests = waiting;

        for request in failed_requests {
            for path in request.closure.iter().filter(|path| *path != failed) {
                self.release_bundle(state, path, effects);
            }
            request.waiter.fail(error.clone(), effects);
        }
    }

    // Manifest

    fn install_manifest(
        &self,
        state: &mut State,
        mut pack: VersionPackInfo,
        effects: &mut Effects,
    ) -> AssetsResult<()> {
        pack.initialize();
        pack.validate()?;
        info!(version = %pack.version, bundles = pack.bundle_count(), "manifest installed");
        effects.event(AssetEvent::ManifestLoaded {
            version: pack.version.clone(),
            bundles: pack.bundle_count(),
        });
        state.manifest = Some(Rc::new(pack));
        Ok(())
    }

    fn manifest_fetched(&self, result: TaskResult<Bytes>) -> AssetsResult<()> {
        let decoded = result.map_err(AssetsError::from).and_then(|data| {
            VersionPackInfo::try_from_binary_data(&data, self.options.cipher.as_ref())
                .map_err(AssetsError::from)
        });

        self.with_state(|this, state, effects| {
            state.manifest_task = None;
            if state.shut_down {
                return Err(AssetsError::ShutDown);
            }
            let installed = decoded.and_then(|pack| this.install_manifest(state, pack, effects));
            if let Err(error) = &installed {
                error!(%error, "manifest load failed");
                effects.report(error, &this.options.manifest_name);
            }
            installed
        })
    }
}

/// Reference-counted bundle cache.
///
/// Every async request reserves the dependency closure of the asset's bundle; bundles not yet
/// cached are downloaded once, concurrent requests share the in-flight download, and the
/// callback runs when the whole closure is loaded. Releasing the last reference starts a
/// retain timer instead of unloading, so a quick re-acquire reuses the decoded bundle.
///
/// All mutation happens on the tick thread. Callbacks and events are delivered after the
/// internal state is released, so they may call back into the provider.
#[derive(Clone)]
pub struct AssetProvider {
    inner: Rc<Inner>,
}

impl AssetProvider {
    pub fn builder(options: AssetOptions, fetcher: Rc<dyn Fetcher>) -> AssetProviderBuilder {
        AssetProviderBuilder {
            options,
            fetcher,
            decoder: None,
            source: None,
        }
    }

    pub fn options(&self) -> &AssetOptions {
        &self.inner.options
    }

    /// Fetches and installs the manifest through the task engine.
    ///
    /// Network and parse failures are also raised as [`FrameworkError`] events.
    pub fn initialize<F>(&self, callback: F)
    where
        F: FnOnce(AssetsResult<()>) + 'static,
    {
        if self.is_shut_down() {
            callback(Err(AssetsError::ShutDown));
            return;
        }

        let url = match self.inner.join(&self.inner.options.manifest_name) {
            Ok(url) => url,
            Err(error) => {
                error!(%error, "manifest url unavailable");
                let mut effects = Effects::default();
                effects.report(&error, &self.inner.options.manifest_name);
                self.inner.apply(effects);
                callback(Err(error));
                return;
            }
        };

        debug!(%url, "manifest download scheduled");
        let this = Rc::downgrade(&self.inner);
        let task = self.inner.tasks.add_task(DownloadTask::new(
            url,
            Rc::clone(&self.inner.fetcher),
            self.inner.options.retry_policy.clone(),
            move |result| match this.upgrade() {
                Some(inner) => callback(inner.manifest_fetched(result)),
                None => callback(Err(AssetsError::ShutDown)),
            },
        ));
        self.inner.state.borrow_mut().manifest_task = Some(task);
    }

    /// Installs an already decoded manifest.
    ///
    /// # Errors
    ///
    /// [`AssetsError::Parse`] when the manifest fails validation, [`AssetsError::ShutDown`]
    /// after [`Self::shutdown`].
    pub fn set_manifest(&self, pack: VersionPackInfo) -> AssetsResult<()> {
        self.inner.with_state(|this, state, effects| {
            if state.shut_down {
                return Err(AssetsError::ShutDown);
            }
            this.install_manifest(state, pack, effects)
        })
    }

    pub fn manifest(&self) -> Option<Rc<VersionPackInfo>> {
        self.inner.state.borrow().manifest.clone()
    }

    /// Loads `asset_path` with its bundle closure and hands the typed value to `callback`.
    ///
    /// `callback` gets `None` on failure; a successful load holds one reference until
    /// [`Self::unload_asset`]. A payload that does not convert to `T` is released again and
    /// reported as `None`.
    pub fn load_asset_async<T, F>(&self, asset_path: &str, callback: F)
    where
        T: FromAsset,
        F: FnOnce(Option<T>) + 'static,
    {
        let this = Rc::downgrade(&self.inner);
        self.inner.request_asset(
            asset_path,
            Box::new(move |result| {
                let asset = match result {
                    Ok(asset) => asset,
                    Err(error) => {
                        debug!(%error, "async load failed");
                        callback(None);
                        return;
                    }
                };
                match T::from_asset(&asset) {
                    Some(value) => callback(Some(value)),
                    None => {
                        error!(
                            asset = asset.path(),
                            ty = std::any::type_name::<T>(),
                            "asset payload does not convert"
                        );
                        if let Some(inner) = this.upgrade() {
                            inner.with_state(|inner, state, effects| {
                                inner.release_asset(state, asset.path(), effects)
                            });
                        }
                        callback(None);
                    }
                }
            }),
        );
    }

    /// Loads an asset immediately, from the cache or the configured [`AssetSource`].
    ///
    /// The result is held exactly like an async load and released with
    /// [`Self::unload_asset`].
    pub fn load_asset_sync<T: FromAsset>(&self, asset_path: &str) -> Option<T> {
        let asset_path = normalize_path(asset_path);
        self.inner.with_state(|this, state, _| {
            if state.shut_down {
                warn!(asset = %asset_path, "sync load after shutdown");
                return None;
            }

            if let Some(entry) = state.assets.get(&asset_path) {
                let Some(value) = T::from_asset(&entry.asset) else {
                    error!(asset = %asset_path, ty = std::any::type_name::<T>(), "asset payload does not convert");
                    return None;
                };
                this.hold_asset(state, &asset_path);
                return Some(value);
            }

            let data = match this.source.load(&asset_path) {
                Ok(data) => data,
                Err(error) => {
                    error!(asset = %asset_path, %error, "sync load failed");
                    return None;
                }
            };
            let asset = AssetRef::new(asset_path.clone(), data);
            let Some(value) = T::from_asset(&asset) else {
                error!(asset = %asset_path, ty = std::any::type_name::<T>(), "asset payload does not convert");
                return None;
            };
            debug!(asset = %asset_path, "asset loaded from source");
            state.assets.insert(
                asset_path,
                AssetEntry {
                    refs: 1,
                    origin: Origin::Direct,
                    asset,
                },
            );
            Some(value)
        })
    }

    /// Drops one reference on a held asset. Returns `false` when the asset is not held.
    pub fn unload_asset(&self, asset_path: &str) -> bool {
        let asset_path = normalize_path(asset_path);
        self.inner.with_state(|this, state, effects| {
            if state.shut_down {
                return false;
            }
            this.release_asset(state, &asset_path, effects)
        })
    }

    /// Loads a bundle and its dependencies without holding them; they end up retained.
    pub fn preload_bundle<F>(&self, bundle_path: &str, callback: F)
    where
        F: FnOnce(bool) + 'static,
    {
        self.inner
            .request_bundle(bundle_path, Box::new(move |result| callback(result.is_ok())));
    }

    /// Loads `asset_path`, then builds a value from it on a following task pass.
    ///
    /// The instance keeps its asset referenced until [`Self::release_instance`]. A factory
    /// error releases the asset and yields `None`.
    pub fn instantiate_async<T, B, F>(&self, asset_path: &str, factory: B, callback: F)
    where
        T: 'static,
        B: FnOnce(&AssetRef) -> Result<T, String> + 'static,
        F: FnOnce(Option<Instance<T>>) + 'static,
    {
        let this = Rc::downgrade(&self.inner);
        let tasks = self.inner.tasks.clone();
        self.load_asset_async::<AssetRef, _>(asset_path, move |asset| {
            let Some(asset) = asset else {
                callback(None);
                return;
            };
            let path = asset.path().to_owned();
            tasks.add_task(InstantiateTask::new(
                move || factory(&asset),
                move |result| match result {
                    Ok(value) => callback(Some(Instance::new(path, value))),
                    Err(error) => {
                        error!(asset = %path, %error, "instantiation failed");
                        if let Some(inner) = this.upgrade() {
                            inner.with_state(|inner, state, effects| {
                                if !state.shut_down {
                                    inner.release_asset(state, &path, effects);
                                }
                            });
                        }
                        callback(None);
                    }
                },
            ));
        });
    }

    /// Releases the asset reference an [`Instance`] holds.
    pub fn release_instance<T>(&self, instance: Instance<T>) -> bool {
        let (asset_path, _value) = instance.into_parts();
        self.unload_asset(&asset_path)
    }

    /// Unloads retained bundles now instead of waiting for their timers.
    ///
    /// Each pass evicts retained bundles no other cached bundle depends on, so one pass peels
    /// one layer off a dependency chain. At most `max_depth` passes run; `usize::MAX` drains
    /// every retained bundle. Returns the number of bundles unloaded.
    pub fn unload_unused_assets(&self, max_depth: usize) -> usize {
        self.inner.with_state(|this, state, effects| {
            let mut evicted = 0;
            for depth in 0..max_depth {
                let mut victims: Vec<String> = {
                    let depended: HashSet<&str> = state
                        .bundles
                        .values()
                        .flat_map(|entry| entry.dependencies.iter().map(String::as_str))
                        .collect();
                    state
                        .bundles
                        .iter()
                        .filter(|(path, entry)| {
                            entry.stage == BundleStage::Retained
                                && !depended.contains(path.as_str())
                        })
                        .map(|(path, _)| path.clone())
                        .collect()
                };
                if victims.is_empty() {
                    break;
                }

                victims.sort();
                trace!(depth, count = victims.len(), "forced eviction pass");
                for path in &victims {
                    this.unload_bundle(state, path, effects);
                }
                evicted += victims.len();
            }
            if evicted > 0 {
                debug!(evicted, max_depth, "unused bundles unloaded");
            }
            evicted
        })
    }

    /// Fails pending requests, cancels downloads and retain timers, and drops every entry.
    pub fn shutdown(&self) {
        self.inner.with_state(|this, state, effects| {
            if state.shut_down {
                return;
            }
            state.shut_down = true;

            if let Some(id) = state.manifest_task.take() {
                this.tasks.cancel_task(id);
            }
            for request in mem::take(&mut state.requests) {
                request.waiter.fail(AssetsError::ShutDown, effects);
            }
            state.assets.clear();

            let mut paths: Vec<String> = state.bundles.keys().cloned().collect();
            paths.sort();
            for path in &paths {
                this.unload_bundle(state, path, effects);
            }
            info!(bundles = paths.len(), "asset provider shut down");
        });
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.state.borrow().shut_down
    }

    pub fn stats(&self) -> ProviderStats {
        let state = self.inner.state.borrow();
        let mut stats = ProviderStats {
            assets: state.assets.len(),
            pending_requests: state.requests.len(),
            downloads: state.downloads,
            unloads: state.unloads,
            ..ProviderStats::default()
        };
        for entry in state.bundles.values() {
            match entry.stage {
                BundleStage::Loading => stats.loading += 1,
                BundleStage::Loaded => stats.loaded += 1,
                BundleStage::Retained => stats.retained += 1,
            }
        }
        stats
    }

    /// Stage of a cached bundle; `None` when it is not cached.
    pub fn bundle_stage(&self, bundle_path: &str) -> Option<BundleStage> {
        let state = self.inner.state.borrow();
        state
            .bundles
            .get(&normalize_path(bundle_path))
            .map(|entry| entry.stage)
    }

    pub fn bundle_ref_count(&self, bundle_path: &str) -> usize {
        let state = self.inner.state.borrow();
        state
            .bundles
            .get(&normalize_path(bundle_path))
            .map_or(0, |entry| entry.refs)
    }

    pub fn asset_ref_count(&self, asset_path: &str) -> usize {
        let state = self.inner.state.borrow();
        state
            .assets
            .get(&normalize_path(asset_path))
            .map_or(0, |entry| entry.refs)
    }

    /// Decoded contents of a cached bundle.
    pub fn loaded_bundle(&self, bundle_path: &str) -> Option<Rc<LoadedBundle>> {
        let state = self.inner.state.borrow();
        state
            .bundles
            .get(&normalize_path(bundle_path))
            .and_then(|entry| entry.loaded.clone())
    }
}

impl fmt::Debug for AssetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetProvider")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Configures the pluggable parts of an [`AssetProvider`].
pub struct AssetProviderBuilder {
    options: AssetOptions,
    fetcher: Rc<dyn Fetcher>,
    decoder: Option<Box<dyn BundleDecoder>>,
    source: Option<Box<dyn AssetSource>>,
}

impl AssetProviderBuilder {
    /// Replaces the default [`ArchiveDecoder`].
    #[must_use]
    pub fn decoder<D: BundleDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Sets the backing store of [`AssetProvider::load_asset_sync`].
    #[must_use]
    pub fn source<S: AssetSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn build(self, timers: TimerHandle, tasks: TaskSpawner, events: EventBus) -> AssetProvider {
        let decoder: Box<dyn BundleDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Box::new(ArchiveDecoder::new(self.options.verify_hash)),
        };
        let source: Box<dyn AssetSource> = match self.source {
            Some(source) => source,
            None => Box::new(NoAssetSource),
        };
        let options = self.options;
        let fetcher = self.fetcher;

        let inner = Rc::new_cyclic(|this| Inner {
            this: this.clone(),
            options,
            fetcher,
            decoder,
            source,
            timers,
            tasks,
            events,
            state: RefCell::new(State::default()),
        });
        AssetProvider { inner }
    }
}
