use std::fmt;

use quark_timer::Repeat;
use tracing::trace;

use crate::action::{Action, drive};

struct Child {
    action: Box<dyn Action>,
    started: bool,
}

impl Child {
    fn new(action: Box<dyn Action>) -> Self {
        Self {
            action,
            started: false,
        }
    }
}

fn wrap(children: Vec<Box<dyn Action>>) -> Vec<Child> {
    children.into_iter().map(Child::new).collect()
}

fn restart(children: &mut [Child]) {
    for child in children {
        child.started = false;
    }
}

fn stop_children(children: &mut [Child]) {
    for child in children {
        if !child.action.is_end() {
            child.action.stop();
        }
    }
}

/// Runs children one after another.
///
/// Children that end instantly are chained within the same tick; later children in the chain
/// start with a zero delta.
pub struct SequenceAction {
    children: Vec<Child>,
    index: usize,
    ended: bool,
    safety: bool,
}

impl SequenceAction {
    pub fn new(children: Vec<Box<dyn Action>>) -> Self {
        Self {
            children: wrap(children),
            index: 0,
            ended: false,
            safety: false,
        }
    }
}

impl Action for SequenceAction {
    fn execute(&mut self) {
        self.index = 0;
        restart(&mut self.children);
        self.ended = self.children.is_empty();
    }

    fn tick(&mut self, dt: f32) {
        let mut dt = dt;
        while let Some(child) = self.children.get_mut(self.index) {
            drive(child.action.as_mut(), &mut child.started, dt);
            if !child.action.is_end() {
                return;
            }
            self.index += 1;
            dt = 0.0;
        }
        self.ended = true;
    }

    fn stop(&mut self) {
        stop_children(&mut self.children);
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
        for child in &mut self.children {
            child.action.mark_safety();
        }
    }

    fn is_safety(&self) -> bool {
        self.safety
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.action.dispose();
        }
    }
}

/// Advances every live child on each tick; ends when all children have ended.
pub struct ParallelAction {
    children: Vec<Child>,
    ended: bool,
    safety: bool,
}

impl ParallelAction {
    pub fn new(children: Vec<Box<dyn Action>>) -> Self {
        Self {
            children: wrap(children),
            ended: false,
            safety: false,
        }
    }
}

impl Action for ParallelAction {
    fn execute(&mut self) {
        restart(&mut self.children);
        self.ended = self.children.is_empty();
    }

    fn tick(&mut self, dt: f32) {
        let mut running = false;
        for child in &mut self.children {
            if child.started && child.action.is_end() {
                continue;
            }
            drive(child.action.as_mut(), &mut child.started, dt);
            running |= !child.action.is_end();
        }
        self.ended = !running;
    }

    fn stop(&mut self) {
        stop_children(&mut self.children);
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
        for child in &mut self.children {
            child.action.mark_safety();
        }
    }

    fn is_safety(&self) -> bool {
        self.safety
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.action.dispose();
        }
    }
}

/// A sequence that wraps back to its first child.
///
/// Each loop restarts every child through `execute`. At most one full loop runs per tick, and a
/// repeat with no children (or zero loops) ends immediately.
pub struct RepeatSequenceAction {
    children: Vec<Child>,
    repeat: Repeat,
    loops: u32,
    index: usize,
    ended: bool,
    safety: bool,
}

impl RepeatSequenceAction {
    pub fn new(children: Vec<Box<dyn Action>>, repeat: Repeat) -> Self {
        Self {
            children: wrap(children),
            repeat,
            loops: 0,
            index: 0,
            ended: false,
            safety: false,
        }
    }

    pub fn forever(children: Vec<Box<dyn Action>>) -> Self {
        Self::new(children, Repeat::Forever)
    }

    /// Completed loops so far.
    pub fn loops(&self) -> u32 {
        self.loops
    }
}

impl Action for RepeatSequenceAction {
    fn execute(&mut self) {
        self.index = 0;
        self.loops = 0;
        restart(&mut self.children);
        self.ended = self.children.is_empty() || self.repeat.is_exhausted();
    }

    fn tick(&mut self, dt: f32) {
        let mut dt = dt;
        let mut stepped = 0;
        while stepped < self.children.len() {
            let Some(child) = self.children.get_mut(self.index) else {
                break;
            };
            drive(child.action.as_mut(), &mut child.started, dt);
            if !child.action.is_end() {
                return;
            }
            stepped += 1;
            dt = 0.0;
            self.index += 1;

            if self.index == self.children.len() {
                self.index = 0;
                self.loops += 1;
                trace!(loops = self.loops, "repeat sequence wrapped");
                if let Repeat::Times(n) = self.repeat {
                    if self.loops >= n {
                        self.ended = true;
                        return;
                    }
                }
                restart(&mut self.children);
            }
        }
    }

    fn stop(&mut self) {
        stop_children(&mut self.children);
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
        for child in &mut self.children {
            child.action.mark_safety();
        }
    }

    fn is_safety(&self) -> bool {
        self.safety
    }

    fn dispose(&mut self) {
        for child in &mut self.children {
            child.action.dispose();
        }
    }
}

macro_rules! composite_debug {
    ($($ty:ident),+) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("children", &self.children.len())
                    .field("ended", &self.ended)
                    .finish_non_exhaustive()
            }
        }
    )+};
}

composite_debug!(SequenceAction, ParallelAction, RepeatSequenceAction);
