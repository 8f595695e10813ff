use std::{fmt, rc::Rc};

use quark_action::ActionSystem;
use quark_assets::{AssetProvider, AssetProviderBuilder};
use quark_events::EventBus;
use quark_net::{Fetcher, HttpClient, NetFetcher};
use quark_task::TaskSystem;
use quark_timer::TimerSystem;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::{
    context::Context,
    error::{RuntimeError, RuntimeResult},
    options::RuntimeOptions,
    registry::{Logic, ModuleRegistry},
};

/// Owns every engine and drives them from one per-frame [`Runtime::tick`].
///
/// Pass order within a tick: posted cross-thread events, timers, tasks, actions, then logic
/// modules in the order they were added.
pub struct Runtime {
    options: RuntimeOptions,
    events: EventBus,
    timers: TimerSystem,
    tasks: TaskSystem,
    actions: ActionSystem,
    assets: AssetProvider,
    context: Context,
    registry: ModuleRegistry,
    logics: Vec<(String, Box<dyn Logic>)>,
    frame: u64,
    shut_down: bool,
}

impl Runtime {
    pub fn new(options: RuntimeOptions, fetcher: Rc<dyn Fetcher>) -> Self {
        Self::with_provider(options, fetcher, |builder| builder)
    }

    /// Like [`Self::new`], with a hook to plug a custom decoder or sync asset source into the
    /// provider.
    pub fn with_provider<F>(options: RuntimeOptions, fetcher: Rc<dyn Fetcher>, configure: F) -> Self
    where
        F: FnOnce(AssetProviderBuilder) -> AssetProviderBuilder,
    {
        let events = EventBus::new();
        let timers = TimerSystem::new(options.timer.clone());
        let tasks = TaskSystem::new();
        let actions = ActionSystem::new();
        let assets = configure(AssetProvider::builder(options.assets.clone(), fetcher)).build(
            timers.handle(),
            tasks.spawner(),
            events.clone(),
        );
        let context = Context::new(
            timers.handle(),
            tasks.spawner(),
            actions.handle(),
            events.clone(),
            assets.clone(),
        );
        debug!(?options, "runtime created");

        Self {
            options,
            events,
            timers,
            tasks,
            actions,
            assets,
            context,
            registry: ModuleRegistry::new(),
            logics: Vec::new(),
            frame: 0,
            shut_down: false,
        }
    }

    /// Fetches bundles over HTTP on `runtime`, with completions marshalled back to the tick.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Net`] when the HTTP client cannot be built.
    pub fn with_http(options: RuntimeOptions, runtime: Handle) -> RuntimeResult<Self> {
        let client = HttpClient::new(options.net.clone())?;
        let fetcher: Rc<dyn Fetcher> = Rc::new(NetFetcher::new(client, runtime));
        Ok(Self::new(options, fetcher))
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn timers(&self) -> &TimerSystem {
        &self.timers
    }

    pub fn tasks(&self) -> &TaskSystem {
        &self.tasks
    }

    pub fn actions(&self) -> &ActionSystem {
        &self.actions
    }

    pub fn assets(&self) -> &AssetProvider {
        &self.assets
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Instantiates the module registered under `key` and starts it.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownModule`], [`RuntimeError::ModuleRunning`] when an instance is
    /// already running, [`RuntimeError::ShutDown`] after [`Self::shutdown`].
    pub fn add_logic(&mut self, key: &str) -> RuntimeResult<()> {
        if self.shut_down {
            return Err(RuntimeError::ShutDown);
        }
        if self.logics.iter().any(|(running, _)| running == key) {
            return Err(RuntimeError::ModuleRunning(key.to_owned()));
        }

        let mut logic = self.registry.create(key)?;
        logic.startup(&self.context);
        self.logics.push((key.to_owned(), logic));
        info!(module = key, "logic module started");
        Ok(())
    }

    /// Shuts down and drops a running module. Returns `false` when `key` is not running.
    pub fn remove_logic(&mut self, key: &str) -> bool {
        let Some(index) = self.logics.iter().position(|(running, _)| running == key) else {
            return false;
        };
        let (_, mut logic) = self.logics.remove(index);
        logic.shutdown(&self.context);
        info!(module = key, "logic module stopped");
        true
    }

    pub fn logic_keys(&self) -> impl Iterator<Item = &str> {
        self.logics.iter().map(|(key, _)| key.as_str())
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn tick(&mut self, dt: f32) {
        if self.shut_down {
            warn!("tick after shutdown ignored");
            return;
        }

        self.frame += 1;
        let posted = self.events.dispatch_posted();
        trace!(frame = self.frame, dt, posted, "tick");

        self.timers.tick(dt);
        self.tasks.tick(dt);
        self.actions.tick(dt);
        for (_, logic) in &mut self.logics {
            logic.tick(&self.context, dt);
        }
    }

    /// Stops logic modules in reverse order, force-unloads every bundle, drains every engine
    /// and drops all subscribers. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        while let Some((key, mut logic)) = self.logics.pop() {
            logic.shutdown(&self.context);
            debug!(module = %key, "logic module stopped");
        }
        self.assets.shutdown();
        self.actions.shutdown();
        self.tasks.shutdown();
        self.timers.shutdown();
        self.events.clear();
        info!(frames = self.frame, "runtime shut down");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("frame", &self.frame)
            .field("logics", &self.logics.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}
