use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use tracing::{debug, error, trace};

use crate::action::{Action, drive};

/// Identifier of a scheduled action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action#{}", self.0)
    }
}

type FinalFn = Box<dyn FnOnce()>;

struct Entry {
    id: ActionId,
    action: Box<dyn Action>,
    started: bool,
    final_callback: Option<FinalFn>,
}

impl Entry {
    /// Stops, disposes and runs the final callback.
    fn retire(mut self) {
        if !self.action.is_end() {
            self.action.stop();
        }
        self.action.dispose();
        if let Some(final_callback) = self.final_callback.take() {
            final_callback();
        }
    }
}

#[derive(Default)]
struct Shared {
    next_id: u64,
    adds: Vec<Entry>,
    stops: HashSet<ActionId>,
    stop_all: bool,
    /// Ids added and not yet retired.
    live: HashSet<ActionId>,
}

/// Cloneable scheduling handle for an [`ActionSystem`].
#[derive(Clone, Default)]
pub struct ActionHandle {
    shared: Rc<RefCell<Shared>>,
}

impl ActionHandle {
    pub fn add_action<A: Action + 'static>(&self, action: A) -> ActionId {
        self.push(Box::new(action), None)
    }

    /// Schedules an action with a callback that runs exactly once when it leaves the system,
    /// whether it ended, was stopped or panicked.
    pub fn add_action_with_final<A, F>(&self, action: A, final_callback: F) -> ActionId
    where
        A: Action + 'static,
        F: FnOnce() + 'static,
    {
        self.push(Box::new(action), Some(Box::new(final_callback)))
    }

    pub fn add_boxed(&self, action: Box<dyn Action>, final_callback: Option<FinalFn>) -> ActionId {
        self.push(action, final_callback)
    }

    /// Stops the action on the next pass.
    pub fn stop_action(&self, id: ActionId) {
        self.shared.borrow_mut().stops.insert(id);
    }

    pub fn stop_all(&self) {
        self.shared.borrow_mut().stop_all = true;
    }

    /// `true` once the action has been retired, or if the id is unknown.
    pub fn is_end(&self, id: ActionId) -> bool {
        !self.shared.borrow().live.contains(&id)
    }

    fn push(&self, action: Box<dyn Action>, final_callback: Option<FinalFn>) -> ActionId {
        let mut shared = self.shared.borrow_mut();
        shared.next_id += 1;
        let id = ActionId(shared.next_id);
        shared.live.insert(id);
        shared.adds.push(Entry {
            id,
            action,
            started: false,
            final_callback,
        });
        trace!(action = %id, "action queued");
        id
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("ActionHandle")
            .field("live", &shared.live.len())
            .field("pending_adds", &shared.adds.len())
            .finish()
    }
}

/// Owner of all running actions.
#[derive(Default)]
pub struct ActionSystem {
    handle: ActionHandle,
    actions: Vec<Entry>,
}

impl ActionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ActionHandle {
        self.handle.clone()
    }

    pub fn add_action<A: Action + 'static>(&self, action: A) -> ActionId {
        self.handle.add_action(action)
    }

    pub fn stop_action(&self, id: ActionId) {
        self.handle.stop_action(id);
    }

    pub fn stop_all(&self) {
        self.handle.stop_all();
    }

    pub fn is_end(&self, id: ActionId) -> bool {
        self.handle.is_end(id)
    }

    pub fn len(&self) -> usize {
        self.handle.shared.borrow().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one scheduling pass.
    ///
    /// A panicking action is stopped, disposed and its final callback runs. Safety-marked
    /// actions then have the panic logged and dropped; otherwise the panic resumes with the
    /// remaining actions intact.
    pub fn tick(&mut self, dt: f32) {
        self.apply_pending();

        let mut index = 0;
        while index < self.actions.len() {
            let entry = &mut self.actions[index];
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                drive(entry.action.as_mut(), &mut entry.started, dt);
            }));

            let Err(payload) = outcome else {
                index += 1;
                continue;
            };

            let entry = self.actions.remove(index);
            let id = entry.id;
            let safety = entry.action.is_safety();
            self.handle.shared.borrow_mut().live.remove(&id);
            entry.retire();

            if !safety {
                error!(action = %id, "action panicked");
                panic::resume_unwind(payload);
            }
            error!(action = %id, reason = panic_message(&*payload), "safety action panicked, contained");
        }

        self.prune();
    }

    /// Stops and retires every action immediately, final callbacks included.
    pub fn shutdown(&mut self) {
        let queued = std::mem::take(&mut self.handle.shared.borrow_mut().adds);
        self.actions.extend(queued);
        {
            let mut shared = self.handle.shared.borrow_mut();
            shared.stops.clear();
            shared.stop_all = false;
            shared.live.clear();
        }
        let count = self.actions.len();
        for entry in std::mem::take(&mut self.actions) {
            entry.retire();
        }
        debug!(count, "action system shut down");
    }

    fn apply_pending(&mut self) {
        let (adds, stops, stop_all) = {
            let mut shared = self.handle.shared.borrow_mut();
            (
                std::mem::take(&mut shared.adds),
                std::mem::take(&mut shared.stops),
                std::mem::replace(&mut shared.stop_all, false),
            )
        };
        self.actions.extend(adds);

        for entry in &mut self.actions {
            if (stop_all || stops.contains(&entry.id)) && !entry.action.is_end() {
                debug!(action = %entry.id, "action stopped");
                entry.action.stop();
                // A stopped action is never executed.
                entry.started = true;
            }
        }
    }

    fn prune(&mut self) {
        let (ended, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.actions)
            .into_iter()
            .partition(|e| e.action.is_end());
        self.actions = running;

        if ended.is_empty() {
            return;
        }
        {
            let mut shared = self.handle.shared.borrow_mut();
            for entry in &ended {
                shared.live.remove(&entry.id);
            }
        }
        for entry in ended {
            trace!(action = %entry.id, "action retired");
            entry.retire();
        }
    }
}

impl fmt::Debug for ActionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSystem")
            .field("actions", &self.actions.len())
            .field("handle", &self.handle)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
