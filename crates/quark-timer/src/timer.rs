use std::fmt;

/// Identifier of a registered timer. Never reused within one [`crate::TimerSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// How many times a timer fires before it retires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Fires until stopped.
    Forever,
    Times(u32),
}

impl Repeat {
    pub const ONCE: Self = Self::Times(1);

    /// Maps the classic signed repeat count: any negative value means forever.
    #[must_use]
    pub fn from_count(count: i32) -> Self {
        u32::try_from(count).map_or(Self::Forever, Self::Times)
    }

    #[must_use]
    pub fn is_exhausted(self) -> bool {
        matches!(self, Self::Times(0))
    }

    /// Consumes one iteration. Returns `true` when this was the last one.
    pub(crate) fn consume(&mut self) -> bool {
        match self {
            Self::Forever => false,
            Self::Times(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
        }
    }
}

pub(crate) type TickFn = Box<dyn FnMut()>;
pub(crate) type CompleteFn = Box<dyn FnOnce()>;

pub(crate) struct Timer {
    pub(crate) id: TimerId,
    pub(crate) interval: f32,
    pub(crate) delay: f32,
    pub(crate) elapsed: f32,
    pub(crate) remaining: Repeat,
    pub(crate) on_tick: TickFn,
    pub(crate) on_complete: Option<CompleteFn>,
}

impl Timer {
    /// Advances by `dt` and fires as many times as the backlog allows, up to `max_fires`.
    pub(crate) fn advance(&mut self, dt: f32, max_fires: u32) {
        if self.remaining.is_exhausted() {
            return;
        }

        let mut dt = dt.max(0.0);
        if self.delay > 0.0 {
            if dt < self.delay {
                self.delay -= dt;
                return;
            }
            dt -= self.delay;
            self.delay = 0.0;
        }

        if self.interval <= 0.0 {
            self.fire();
            return;
        }

        self.elapsed += dt;
        let mut fires = 0;
        while self.elapsed >= self.interval && fires < max_fires {
            self.elapsed -= self.interval;
            fires += 1;
            if self.fire() {
                return;
            }
        }

        if self.elapsed >= self.interval {
            let dropped = (self.elapsed / self.interval).floor();
            tracing::trace!(
                timer = %self.id,
                dropped,
                "timer backlog exceeds per-tick bound, discarding"
            );
            self.elapsed %= self.interval;
        }
    }

    /// Returns `true` once the timer retires.
    fn fire(&mut self) -> bool {
        (self.on_tick)();
        if !self.remaining.consume() {
            return false;
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
        true
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("interval", &self.interval)
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}
