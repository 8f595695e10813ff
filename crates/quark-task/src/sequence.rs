use std::fmt;

use tracing::trace;

use crate::task::{FinishFn, Task, TaskState, step};

/// Runs children one after another, in order.
///
/// Aborts as soon as a child aborts; completes after the last child completes. An empty
/// sequence completes on execution.
pub struct SequenceTask {
    state: TaskState,
    children: Vec<Box<dyn Task>>,
    index: usize,
    started: bool,
    on_finish: Option<FinishFn>,
}

impl SequenceTask {
    pub fn new(children: Vec<Box<dyn Task>>) -> Self {
        Self {
            state: TaskState::Waiting,
            children,
            index: 0,
            started: false,
            on_finish: None,
        }
    }

    #[must_use]
    pub fn with_finish<F: FnOnce(TaskState) + 'static>(mut self, on_finish: F) -> Self {
        self.on_finish = Some(Box::new(on_finish));
        self
    }

    pub fn push<T: Task + 'static>(&mut self, task: T) {
        self.children.push(Box::new(task));
    }

    /// Index of the running child.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Starts children until one is still running or the sequence is done.
    fn advance(&mut self, dt: f32) {
        while let Some(child) = self.children.get_mut(self.index) {
            step(child.as_mut(), &mut self.started, dt);
            match child.state() {
                TaskState::Completed => {
                    self.index += 1;
                    self.started = false;
                }
                TaskState::Aborted => {
                    trace!(index = self.index, "sequence child aborted");
                    self.finish(TaskState::Aborted);
                    return;
                }
                TaskState::Waiting | TaskState::InProgress => return,
            }
        }
        self.finish(TaskState::Completed);
    }

    fn finish(&mut self, state: TaskState) {
        self.state = state;
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(state);
        }
    }
}

impl Task for SequenceTask {
    fn state(&self) -> TaskState {
        self.state
    }

    fn execute(&mut self) {
        self.state = TaskState::InProgress;
        self.advance(0.0);
    }

    fn tick(&mut self, dt: f32) {
        self.advance(dt);
    }

    fn progress(&self) -> f32 {
        if self.children.is_empty() {
            return if self.state.is_done() { 1.0 } else { 0.0 };
        }
        let current = self
            .children
            .get(self.index)
            .map_or(0.0, |child| child.progress());
        (self.index as f32 + current) / self.children.len() as f32
    }

    fn cancel(&mut self) {
        if self.state.is_done() {
            return;
        }
        if let Some(child) = self.children.get_mut(self.index) {
            if !child.state().is_done() {
                child.cancel();
            }
        }
        self.finish(TaskState::Aborted);
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.dispose();
        }
        self.on_finish = None;
    }
}

impl fmt::Debug for SequenceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceTask")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
