use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
};

use tracing::{debug, error, trace};

use crate::task::{Task, TaskState, step};

/// Identifier of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

struct Entry {
    id: TaskId,
    started: bool,
    task: Box<dyn Task>,
}

#[derive(Default)]
struct Pending {
    next_id: u64,
    adds: Vec<Entry>,
    cancels: HashSet<TaskId>,
}

/// Cloneable handle that schedules and cancels tasks from anywhere on the tick thread,
/// including from inside a running task.
#[derive(Clone, Default)]
pub struct TaskSpawner {
    pending: Rc<RefCell<Pending>>,
}

impl TaskSpawner {
    /// Queues a task. It is first executed on the next tick.
    pub fn add_task<T: Task + 'static>(&self, task: T) -> TaskId {
        self.add_boxed(Box::new(task))
    }

    pub fn add_boxed(&self, task: Box<dyn Task>) -> TaskId {
        let mut pending = self.pending.borrow_mut();
        pending.next_id += 1;
        let id = TaskId(pending.next_id);
        trace!(task = %id, "task queued");
        pending.adds.push(Entry {
            id,
            started: false,
            task,
        });
        id
    }

    /// Cancels a task on the next pass. The task still goes through its normal disposal.
    pub fn cancel_task(&self, id: TaskId) {
        self.pending.borrow_mut().cancels.insert(id);
    }
}

impl fmt::Debug for TaskSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.pending.borrow();
        f.debug_struct("TaskSpawner")
            .field("pending_adds", &pending.adds.len())
            .field("pending_cancels", &pending.cancels.len())
            .finish()
    }
}

/// Registry of active tasks, driven once per frame.
#[derive(Default)]
pub struct TaskSystem {
    spawner: TaskSpawner,
    tasks: Vec<Entry>,
}

impl TaskSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawner(&self) -> TaskSpawner {
        self.spawner.clone()
    }

    pub fn add_task<T: Task + 'static>(&self, task: T) -> TaskId {
        self.spawner.add_task(task)
    }

    pub fn cancel_task(&self, id: TaskId) {
        self.spawner.cancel_task(id);
    }

    /// Current state, or `None` once the task was retired (or never existed).
    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        if let Some(entry) = self.tasks.iter().find(|e| e.id == id) {
            return Some(entry.task.state());
        }
        self.spawner
            .pending
            .borrow()
            .adds
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.task.state())
    }

    pub fn progress(&self, id: TaskId) -> Option<f32> {
        self.tasks
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.task.progress())
    }

    /// Active tasks plus tasks queued for the next tick.
    pub fn len(&self) -> usize {
        self.tasks.len() + self.spawner.pending.borrow().adds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one scheduling pass.
    ///
    /// A panic inside a task is caught at dispatch, the task is cancelled, disposed and removed,
    /// and the panic then resumes. The rest of the active list is left intact.
    pub fn tick(&mut self, dt: f32) {
        self.apply_pending();

        let mut index = 0;
        while index < self.tasks.len() {
            let entry = &mut self.tasks[index];
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                step(entry.task.as_mut(), &mut entry.started, dt);
            }));

            if let Err(payload) = outcome {
                let mut entry = self.tasks.remove(index);
                error!(task = %entry.id, "task panicked, aborting");
                entry.task.cancel();
                entry.task.dispose();
                panic::resume_unwind(payload);
            }
            index += 1;
        }

        self.prune();
    }

    /// Cancels and disposes every task, queued ones included.
    pub fn shutdown(&mut self) {
        let queued = std::mem::take(&mut self.spawner.pending.borrow_mut().adds);
        self.tasks.extend(queued);
        self.spawner.pending.borrow_mut().cancels.clear();

        let count = self.tasks.len();
        for mut entry in self.tasks.drain(..) {
            if !entry.task.state().is_done() {
                entry.task.cancel();
            }
            entry.task.dispose();
        }
        debug!(count, "task system shut down");
    }

    fn apply_pending(&mut self) {
        let (adds, cancels) = {
            let mut pending = self.spawner.pending.borrow_mut();
            (
                std::mem::take(&mut pending.adds),
                std::mem::take(&mut pending.cancels),
            )
        };
        self.tasks.extend(adds);

        if cancels.is_empty() {
            return;
        }
        for entry in &mut self.tasks {
            if cancels.contains(&entry.id) && !entry.task.state().is_done() {
                debug!(task = %entry.id, "task cancelled");
                entry.task.cancel();
            }
        }
    }

    fn prune(&mut self) {
        self.tasks.retain_mut(|entry| {
            let state = entry.task.state();
            if !state.is_done() {
                return true;
            }
            trace!(task = %entry.id, %state, "task retired");
            entry.task.dispose();
            false
        });
    }
}

impl fmt::Debug for TaskSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSystem")
            .field("tasks", &self.tasks.len())
            .field("spawner", &self.spawner)
            .finish()
    }
}
