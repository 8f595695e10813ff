use std::fmt;

use tracing::trace;

use crate::task::{FinishFn, Task, TaskState, step};

struct Child {
    task: Box<dyn Task>,
    started: bool,
}

/// Runs every child within the same tick and finishes once all of them are terminal.
///
/// Failure dominates: if any child aborted the whole task aborts, even when the others
/// completed. An empty parallel completes on execution.
pub struct ParallelTask {
    state: TaskState,
    children: Vec<Child>,
    on_finish: Option<FinishFn>,
}

impl ParallelTask {
    pub fn new(children: Vec<Box<dyn Task>>) -> Self {
        Self {
            state: TaskState::Waiting,
            children: children
                .into_iter()
                .map(|task| Child {
                    task,
                    started: false,
                })
                .collect(),
            on_finish: None,
        }
    }

    #[must_use]
    pub fn with_finish<F: FnOnce(TaskState) + 'static>(mut self, on_finish: F) -> Self {
        self.on_finish = Some(Box::new(on_finish));
        self
    }

    pub fn push<T: Task + 'static>(&mut self, task: T) {
        self.children.push(Child {
            task: Box::new(task),
            started: false,
        });
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn settle(&mut self) {
        if !self.children.iter().all(|c| c.task.state().is_done()) {
            return;
        }
        let aborted = self
            .children
            .iter()
            .any(|c| c.task.state() == TaskState::Aborted);
        self.finish(if aborted {
            TaskState::Aborted
        } else {
            TaskState::Completed
        });
    }

    fn finish(&mut self, state: TaskState) {
        trace!(children = self.children.len(), %state, "parallel finished");
        self.state = state;
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(state);
        }
    }
}

impl Task for ParallelTask {
    fn state(&self) -> TaskState {
        self.state
    }

    fn execute(&mut self) {
        self.state = TaskState::InProgress;
        for child in &mut self.children {
            step(child.task.as_mut(), &mut child.started, 0.0);
        }
        self.settle();
    }

    fn tick(&mut self, dt: f32) {
        for child in &mut self.children {
            if !child.task.state().is_done() {
                step(child.task.as_mut(), &mut child.started, dt);
            }
        }
        self.settle();
    }

    fn progress(&self) -> f32 {
        if self.children.is_empty() {
            return if self.state.is_done() { 1.0 } else { 0.0 };
        }
        let sum: f32 = self.children.iter().map(|c| c.task.progress()).sum();
        sum / self.children.len() as f32
    }

    fn cancel(&mut self) {
        if self.state.is_done() {
            return;
        }
        for child in &mut self.children {
            if !child.task.state().is_done() {
                child.task.cancel();
            }
        }
        self.finish(TaskState::Aborted);
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.task.dispose();
        }
        self.on_finish = None;
    }
}

impl fmt::Debug for ParallelTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelTask")
            .field("state", &self.state)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
