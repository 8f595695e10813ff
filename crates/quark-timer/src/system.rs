use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use tracing::{debug, trace};

use crate::{
    options::TimerOptions,
    timer::{Repeat, Timer, TimerId},
};

#[derive(Default)]
struct Pending {
    next_id: u64,
    adds: Vec<Timer>,
    cancels: HashSet<TimerId>,
    stop_all: bool,
}

/// Cloneable registration handle for a [`TimerSystem`].
///
/// Every mutation is buffered and applied at the start of the next tick, so a handle can be
/// used freely from inside timer callbacks.
#[derive(Clone, Default)]
pub struct TimerHandle {
    pending: Rc<RefCell<Pending>>,
}

impl TimerHandle {
    /// Registers a timer firing every `interval` seconds after an initial `delay`.
    pub fn add_timer<F>(&self, interval: f32, on_tick: F, repeat: Repeat, delay: f32) -> TimerId
    where
        F: FnMut() + 'static,
    {
        self.push(interval, delay, repeat, Box::new(on_tick), None)
    }

    /// Registers a timer that ticks every `interval` for `total` seconds, then calls
    /// `on_complete` once.
    pub fn add_countdown<F, C>(&self, interval: f32, on_tick: F, on_complete: C, total: f32) -> TimerId
    where
        F: FnMut() + 'static,
        C: FnOnce() + 'static,
    {
        let count = if interval > 0.0 {
            // Saturating float-to-int cast; the clamp keeps at least one fire.
            ((total / interval).floor() as u32).max(1)
        } else {
            1
        };
        self.push(
            interval,
            0.0,
            Repeat::Times(count),
            Box::new(on_tick),
            Some(Box::new(on_complete)),
        )
    }

    /// Registers a one-shot timer that runs `callback` after `delay` seconds.
    pub fn after<F>(&self, delay: f32, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut callback = Some(callback);
        self.add_timer(
            0.0,
            move || {
                if let Some(callback) = callback.take() {
                    callback();
                }
            },
            Repeat::ONCE,
            delay,
        )
    }

    /// Cancels a timer on the next pass. Unknown ids are ignored.
    pub fn stop_timer(&self, id: TimerId) {
        self.pending.borrow_mut().cancels.insert(id);
    }

    /// Cancels every timer, including those added before the next pass.
    pub fn stop_all(&self) {
        self.pending.borrow_mut().stop_all = true;
    }

    fn push(
        &self,
        interval: f32,
        delay: f32,
        repeat: Repeat,
        on_tick: crate::timer::TickFn,
        on_complete: Option<crate::timer::CompleteFn>,
    ) -> TimerId {
        let mut pending = self.pending.borrow_mut();
        pending.next_id += 1;
        let id = TimerId(pending.next_id);
        trace!(timer = %id, interval, delay, ?repeat, "timer scheduled");
        pending.adds.push(Timer {
            id,
            interval,
            delay: delay.max(0.0),
            elapsed: 0.0,
            remaining: repeat,
            on_tick,
            on_complete,
        });
        id
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.pending.borrow();
        f.debug_struct("TimerHandle")
            .field("pending_adds", &pending.adds.len())
            .field("pending_cancels", &pending.cancels.len())
            .finish()
    }
}

/// Owner of all live timers.
pub struct TimerSystem {
    options: TimerOptions,
    handle: TimerHandle,
    timers: Vec<Timer>,
}

impl TimerSystem {
    #[must_use]
    pub fn new(options: TimerOptions) -> Self {
        Self {
            options,
            handle: TimerHandle::default(),
            timers: Vec::new(),
        }
    }

    #[must_use]
    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn options(&self) -> &TimerOptions {
        &self.options
    }

    pub fn add_timer<F>(&self, interval: f32, on_tick: F, repeat: Repeat, delay: f32) -> TimerId
    where
        F: FnMut() + 'static,
    {
        self.handle.add_timer(interval, on_tick, repeat, delay)
    }

    pub fn add_countdown<F, C>(&self, interval: f32, on_tick: F, on_complete: C, total: f32) -> TimerId
    where
        F: FnMut() + 'static,
        C: FnOnce() + 'static,
    {
        self.handle.add_countdown(interval, on_tick, on_complete, total)
    }

    pub fn stop_timer(&self, id: TimerId) {
        self.handle.stop_timer(id);
    }

    pub fn stop_all(&self) {
        self.handle.stop_all();
    }

    /// Timers that will take part in the next tick, pending additions included and pending
    /// cancellations excluded.
    #[must_use]
    pub fn active_count(&self) -> usize {
        let pending = self.handle.pending.borrow();
        if pending.stop_all {
            return 0;
        }
        self.timers
            .iter()
            .chain(pending.adds.iter())
            .filter(|t| !t.remaining.is_exhausted() && !pending.cancels.contains(&t.id))
            .count()
    }

    #[must_use]
    pub fn is_active(&self, id: TimerId) -> bool {
        let pending = self.handle.pending.borrow();
        if pending.stop_all || pending.cancels.contains(&id) {
            return false;
        }
        self.timers
            .iter()
            .chain(pending.adds.iter())
            .any(|t| t.id == id && !t.remaining.is_exhausted())
    }

    /// Advances every timer by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.apply_pending();
        self.timers.retain(|t| !t.remaining.is_exhausted());

        let max_fires = self.options.max_fires_per_tick.max(1);
        for timer in &mut self.timers {
            timer.advance(dt, max_fires);
        }
    }

    /// Drops every timer immediately without firing completion callbacks.
    pub fn shutdown(&mut self) {
        let dropped = self.timers.len();
        self.timers.clear();
        let mut pending = self.handle.pending.borrow_mut();
        pending.adds.clear();
        pending.cancels.clear();
        pending.stop_all = false;
        debug!(dropped, "timer system shut down");
    }

    fn apply_pending(&mut self) {
        let (adds, cancels, stop_all) = {
            let mut pending = self.handle.pending.borrow_mut();
            (
                std::mem::take(&mut pending.adds),
                std::mem::take(&mut pending.cancels),
                std::mem::replace(&mut pending.stop_all, false),
            )
        };

        self.timers.extend(adds);

        if stop_all {
            debug!(count = self.timers.len(), "stopping all timers");
            for timer in &mut self.timers {
                timer.remaining = Repeat::Times(0);
            }
            return;
        }

        for timer in &mut self.timers {
            if cancels.contains(&timer.id) {
                trace!(timer = %timer.id, "timer cancelled");
                timer.remaining = Repeat::Times(0);
            }
        }
    }
}

impl Default for TimerSystem {
    fn default() -> Self {
        Self::new(TimerOptions::default())
    }
}

impl fmt::Debug for TimerSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSystem")
            .field("options", &self.options)
            .field("timers", &self.timers.len())
            .finish()
    }
}
