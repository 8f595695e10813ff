use std::{cell::RefCell, rc::Rc};

use quark::{
    Runtime, RuntimeOptions,
    task::{FuncTask, ParallelTask, SequenceTask, Task, TaskState},
};
use quark_test_utils::MemFetcher;
use rstest::{fixture, rstest};

use crate::common::World;

type Outcome = Rc<RefCell<Option<TaskState>>>;

#[fixture]
fn runtime() -> Runtime {
    World::new(RuntimeOptions::default(), MemFetcher::new()).runtime
}

/// Runs for `frames` ticks, then settles in `end`.
fn after_frames(frames: u32, end: TaskState) -> Box<dyn Task> {
    let mut left = frames;
    Box::new(FuncTask::new(move |_| {
        left = left.saturating_sub(1);
        if left == 0 { end } else { TaskState::InProgress }
    }))
}

fn outcome() -> (Outcome, impl FnOnce(TaskState) + 'static) {
    let outcome: Outcome = Rc::default();
    let sink = Rc::clone(&outcome);
    (outcome, move |state| *sink.borrow_mut() = Some(state))
}

fn run(runtime: &mut Runtime, frames: usize) {
    for _ in 0..frames {
        runtime.tick(0.016);
    }
}

#[rstest]
#[case::all_complete(TaskState::Completed, TaskState::Completed)]
#[case::one_aborts(TaskState::Aborted, TaskState::Aborted)]
fn parallel_waits_for_every_child(
    mut runtime: Runtime,
    #[case] slow_end: TaskState,
    #[case] expected: TaskState,
) {
    let (seen, on_finish) = outcome();
    runtime.context().tasks().add_task(
        ParallelTask::new(vec![
            after_frames(1, TaskState::Completed),
            after_frames(5, slow_end),
        ])
        .with_finish(on_finish),
    );

    run(&mut runtime, 3);
    assert_eq!(*seen.borrow(), None);

    run(&mut runtime, 5);
    assert_eq!(*seen.borrow(), Some(expected));
    assert!(runtime.tasks().is_empty());
}

#[rstest]
fn sequence_stops_at_the_first_abort(mut runtime: Runtime) {
    let ran_last = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran_last);
    let (seen, on_finish) = outcome();
    runtime.context().tasks().add_task(
        SequenceTask::new(vec![
            after_frames(1, TaskState::Completed),
            after_frames(1, TaskState::Aborted),
            Box::new(FuncTask::new(move |_| {
                *flag.borrow_mut() = true;
                TaskState::Completed
            })),
        ])
        .with_finish(on_finish),
    );

    run(&mut runtime, 8);

    assert_eq!(*seen.borrow(), Some(TaskState::Aborted));
    assert!(!*ran_last.borrow());
}

#[rstest]
fn empty_composites_complete_immediately(mut runtime: Runtime) {
    let (sequence, on_sequence) = outcome();
    let (parallel, on_parallel) = outcome();
    let tasks = runtime.context().tasks().clone();
    tasks.add_task(SequenceTask::new(Vec::new()).with_finish(on_sequence));
    tasks.add_task(ParallelTask::new(Vec::new()).with_finish(on_parallel));

    run(&mut runtime, 1);

    assert_eq!(*sequence.borrow(), Some(TaskState::Completed));
    assert_eq!(*parallel.borrow(), Some(TaskState::Completed));
}

#[rstest]
fn cancelled_task_aborts_and_leaves_the_engine(mut runtime: Runtime) {
    let (seen, on_finish) = outcome();
    let tasks = runtime.context().tasks().clone();
    let id = tasks.add_task(
        SequenceTask::new(vec![after_frames(1_000, TaskState::Completed)]).with_finish(on_finish),
    );
    run(&mut runtime, 2);

    tasks.cancel_task(id);
    run(&mut runtime, 1);

    assert_eq!(*seen.borrow(), Some(TaskState::Aborted));
    assert_eq!(runtime.tasks().task_state(id), None);
}
