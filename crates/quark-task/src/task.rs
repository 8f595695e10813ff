use std::fmt;

/// Lifecycle of a task: `Waiting -> InProgress -> {Completed | Aborted}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    Waiting,
    InProgress,
    Completed,
    Aborted,
}

impl TaskState {
    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Callback invoked with the terminal state of a composite.
pub type FinishFn = Box<dyn FnOnce(TaskState)>;

/// A unit of cooperative work.
///
/// The engine calls [`Task::execute`] once while the task is `Waiting`, then [`Task::tick`] on
/// every pass while it is `InProgress`. The task itself decides its transitions. Terminal tasks
/// are disposed and dropped by the engine.
pub trait Task {
    fn state(&self) -> TaskState;

    fn execute(&mut self);

    fn tick(&mut self, dt: f32);

    /// Fraction of work done in `0.0..=1.0`.
    fn progress(&self) -> f32 {
        if self.state() == TaskState::Completed {
            1.0
        } else {
            0.0
        }
    }

    /// Moves the task to `Aborted`. Must be idempotent and must run the task's failure path
    /// exactly once.
    fn cancel(&mut self);

    /// Releases callbacks and handles. Called once, after the task became terminal.
    fn dispose(&mut self) {}
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn state(&self) -> TaskState {
        (**self).state()
    }

    fn execute(&mut self) {
        (**self).execute();
    }

    fn tick(&mut self, dt: f32) {
        (**self).tick(dt);
    }

    fn progress(&self) -> f32 {
        (**self).progress()
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }

    fn dispose(&mut self) {
        (**self).dispose();
    }
}

/// Drives one child the way the engine would.
pub(crate) fn step(task: &mut dyn Task, started: &mut bool, dt: f32) {
    if !*started {
        *started = true;
        if task.state() == TaskState::Waiting {
            task.execute();
        }
        return;
    }
    if task.state() == TaskState::InProgress {
        task.tick(dt);
    }
}
