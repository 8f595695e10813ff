#![forbid(unsafe_code)]

//! Cooperative task engine.
//!
//! Tasks are explicit state machines advanced by [`TaskSystem::tick`]. Nothing here blocks or
//! spawns threads: a task waits by staying [`TaskState::InProgress`] across ticks.
//!
//! ```
//! use quark_task::{FuncTask, TaskState, TaskSystem};
//!
//! let mut tasks = TaskSystem::new();
//! let mut frames = 0;
//! let id = tasks.add_task(FuncTask::new(move |_dt| {
//!     frames += 1;
//!     if frames == 3 { TaskState::Completed } else { TaskState::InProgress }
//! }));
//!
//! for _ in 0..4 {
//!     tasks.tick(0.016);
//! }
//! assert_eq!(tasks.task_state(id), None);
//! ```

mod download;
mod error;
mod func;
mod instantiate;
mod parallel;
mod sequence;
mod system;
mod task;

pub use crate::{
    download::DownloadTask,
    error::{TaskError, TaskResult},
    func::FuncTask,
    instantiate::InstantiateTask,
    parallel::ParallelTask,
    sequence::SequenceTask,
    system::{TaskId, TaskSpawner, TaskSystem},
    task::{FinishFn, Task, TaskState},
};
