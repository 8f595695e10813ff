use quark_action::ActionHandle;
use quark_assets::AssetProvider;
use quark_events::EventBus;
use quark_task::TaskSpawner;
use quark_timer::TimerHandle;

/// Handles to every engine of a [`crate::Runtime`], cloned into subsystems that need them.
///
/// Additions and cancellations made through these handles apply on the next pass of the
/// owning engine.
#[derive(Clone, Debug)]
pub struct Context {
    timers: TimerHandle,
    tasks: TaskSpawner,
    actions: ActionHandle,
    events: EventBus,
    assets: AssetProvider,
}

impl Context {
    pub(crate) fn new(
        timers: TimerHandle,
        tasks: TaskSpawner,
        actions: ActionHandle,
        events: EventBus,
        assets: AssetProvider,
    ) -> Self {
        Self {
            timers,
            tasks,
            actions,
            events,
            assets,
        }
    }

    pub fn timers(&self) -> &TimerHandle {
        &self.timers
    }

    pub fn tasks(&self) -> &TaskSpawner {
        &self.tasks
    }

    pub fn actions(&self) -> &ActionHandle {
        &self.actions
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn assets(&self) -> &AssetProvider {
        &self.assets
    }
}
