use std::fmt;

use crate::task::{Task, TaskState};

/// Leaf task polled through a closure.
///
/// The closure runs on every tick after execution and returns the next state; any
/// non-terminal state keeps the task running.
pub struct FuncTask {
    state: TaskState,
    poll: Option<Box<dyn FnMut(f32) -> TaskState>>,
}

impl FuncTask {
    pub fn new<F>(poll: F) -> Self
    where
        F: FnMut(f32) -> TaskState + 'static,
    {
        Self {
            state: TaskState::Waiting,
            poll: Some(Box::new(poll)),
        }
    }
}

impl Task for FuncTask {
    fn state(&self) -> TaskState {
        self.state
    }

    fn execute(&mut self) {
        self.state = TaskState::InProgress;
    }

    fn tick(&mut self, dt: f32) {
        if let Some(poll) = self.poll.as_mut() {
            match poll(dt) {
                TaskState::Completed => self.state = TaskState::Completed,
                TaskState::Aborted => self.state = TaskState::Aborted,
                TaskState::Waiting | TaskState::InProgress => {}
            }
        }
    }

    fn cancel(&mut self) {
        self.state = TaskState::Aborted;
    }

    fn dispose(&mut self) {
        self.poll = None;
    }
}

impl fmt::Debug for FuncTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncTask")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
