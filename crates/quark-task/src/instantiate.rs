use std::fmt;

use tracing::debug;

use crate::{
    error::{TaskError, TaskResult},
    task::{Task, TaskState},
};

type Factory<T> = Box<dyn FnOnce() -> Result<T, String>>;
type Finish<T> = Box<dyn FnOnce(TaskResult<T>)>;

/// Builds a value one tick after execution and hands it to a completion callback.
///
/// A factory error aborts the task with [`TaskError::Instantiation`].
pub struct InstantiateTask<T> {
    state: TaskState,
    factory: Option<Factory<T>>,
    on_finish: Option<Finish<T>>,
}

impl<T: 'static> InstantiateTask<T> {
    pub fn new<F, C>(factory: F, on_finish: C) -> Self
    where
        F: FnOnce() -> Result<T, String> + 'static,
        C: FnOnce(TaskResult<T>) + 'static,
    {
        Self {
            state: TaskState::Waiting,
            factory: Some(Box::new(factory)),
            on_finish: Some(Box::new(on_finish)),
        }
    }

    fn finish(&mut self, result: TaskResult<T>) {
        self.state = if result.is_ok() {
            TaskState::Completed
        } else {
            TaskState::Aborted
        };
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(result);
        }
    }
}

impl<T: 'static> Task for InstantiateTask<T> {
    fn state(&self) -> TaskState {
        self.state
    }

    fn execute(&mut self) {
        self.state = TaskState::InProgress;
    }

    fn tick(&mut self, _dt: f32) {
        let Some(factory) = self.factory.take() else {
            return;
        };
        let result = factory().map_err(|reason| {
            debug!(%reason, "instantiation failed");
            TaskError::Instantiation(reason)
        });
        self.finish(result);
    }

    fn cancel(&mut self) {
        if self.state.is_done() {
            return;
        }
        self.factory = None;
        self.finish(Err(TaskError::Cancelled));
    }

    fn dispose(&mut self) {
        self.factory = None;
        self.on_finish = None;
    }
}

impl<T> fmt::Debug for InstantiateTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiateTask")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
