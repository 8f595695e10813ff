use std::{cell::RefCell, rc::Rc};

use quark::{
    Runtime, RuntimeOptions,
    action::{ActionBuilder, Repeat},
};
use quark_test_utils::MemFetcher;
use rstest::{fixture, rstest};

use crate::common::World;

type Log = Rc<RefCell<Vec<&'static str>>>;

#[fixture]
fn runtime() -> Runtime {
    World::new(RuntimeOptions::default(), MemFetcher::new()).runtime
}

fn note(log: &Log, entry: &'static str) -> impl FnMut() + 'static {
    let log = Rc::clone(log);
    move || log.borrow_mut().push(entry)
}

#[rstest]
fn empty_sequence_ends_on_its_first_pass(mut runtime: Runtime) {
    let log: Log = Rc::default();
    let id = ActionBuilder::sequence()
        .on_final(note(&log, "final"))
        .flush(runtime.context().actions());
    assert!(!runtime.actions().is_end(id));

    runtime.tick(0.1);

    assert!(runtime.actions().is_end(id));
    assert_eq!(*log.borrow(), vec!["final"]);
}

#[rstest]
fn parallel_ends_with_its_slowest_child(mut runtime: Runtime) {
    let log: Log = Rc::default();
    let id = ActionBuilder::parallel()
        .begin_sequence()
        .wait_time(0.5)
        .callback(note(&log, "fast"))
        .end()
        .begin_sequence()
        .wait_time(1.0)
        .callback(note(&log, "slow"))
        .end()
        .on_final(note(&log, "final"))
        .flush(runtime.context().actions());

    for _ in 0..3 {
        runtime.tick(0.25);
    }
    assert!(!runtime.actions().is_end(id));
    assert_eq!(*log.borrow(), vec!["fast"]);

    runtime.tick(0.25);
    assert!(runtime.actions().is_end(id));
    assert_eq!(*log.borrow(), vec!["fast", "slow", "final"]);
}

#[rstest]
fn stopped_script_runs_its_final_callback_once(mut runtime: Runtime) {
    let log: Log = Rc::default();
    let actions = runtime.context().actions().clone();
    let id = ActionBuilder::repeat(Repeat::Forever)
        .wait_frames(1)
        .callback(note(&log, "beat"))
        .on_final(note(&log, "final"))
        .flush(&actions);

    runtime.tick(0.1);
    runtime.tick(0.1);
    actions.stop_action(id);
    runtime.tick(0.1);
    runtime.tick(0.1);

    assert!(actions.is_end(id));
    assert_eq!(log.borrow().iter().filter(|e| **e == "final").count(), 1);
    assert_eq!(log.borrow().last(), Some(&"final"));
}

#[rstest]
fn shutdown_retires_running_scripts(mut runtime: Runtime) {
    let log: Log = Rc::default();
    let id = ActionBuilder::sequence()
        .wait_time(60.0)
        .on_final(note(&log, "final"))
        .flush(runtime.context().actions());
    runtime.tick(0.1);

    runtime.shutdown();

    assert!(runtime.actions().is_end(id));
    assert_eq!(*log.borrow(), vec!["final"]);
}
