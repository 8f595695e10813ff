use std::{cell::Cell, rc::Rc, time::Duration};

use quark::{
    Runtime, RuntimeOptions,
    timer::{Repeat, TimerOptions},
};
use rstest::rstest;

use crate::common::World;

fn runtime(options: RuntimeOptions) -> Runtime {
    World::new(options, quark_test_utils::MemFetcher::new()).runtime
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&count);
    (count, move || sink.set(sink.get() + 1))
}

#[rstest]
#[case::default_bound(RuntimeOptions::default(), 10)]
#[case::configured_bound(
    RuntimeOptions::default().with_timer(TimerOptions::default().with_max_fires_per_tick(3)),
    3
)]
#[timeout(Duration::from_secs(5))]
fn long_frame_fires_at_most_the_bound(#[case] options: RuntimeOptions, #[case] bound: u32) {
    let mut runtime = runtime(options);
    let (count, on_tick) = counter();
    runtime
        .context()
        .timers()
        .add_timer(0.1, on_tick, Repeat::Forever, 0.0);

    runtime.tick(5.0);
    assert_eq!(count.get(), bound);

    // The rest of the backlog is gone, not deferred.
    runtime.tick(0.1);
    assert_eq!(count.get(), bound + 1);
}

#[rstest]
fn countdown_completes_once_after_its_total() {
    let mut runtime = runtime(RuntimeOptions::default());
    let (ticks, on_tick) = counter();
    let (completions, on_complete) = counter();
    runtime
        .context()
        .timers()
        .add_countdown(0.5, on_tick, on_complete, 2.0);

    for _ in 0..10 {
        runtime.tick(0.25);
    }

    assert_eq!(ticks.get(), 4);
    assert_eq!(completions.get(), 1);
    assert_eq!(runtime.timers().active_count(), 0);
}

#[rstest]
fn stopped_timer_never_completes() {
    let mut runtime = runtime(RuntimeOptions::default());
    let (ticks, on_tick) = counter();
    let (completions, on_complete) = counter();
    let timers = runtime.context().timers().clone();
    let id = timers.add_countdown(0.5, on_tick, on_complete, 2.0);

    runtime.tick(0.5);
    timers.stop_timer(id);
    runtime.tick(5.0);

    assert_eq!(ticks.get(), 1);
    assert_eq!(completions.get(), 0);
}
