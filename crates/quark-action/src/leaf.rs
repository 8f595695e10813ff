use std::fmt;

use crate::action::Action;

/// Ends after `duration` seconds of tick time.
#[derive(Debug)]
pub struct WaitTimeAction {
    duration: f32,
    elapsed: f32,
    ended: bool,
    safety: bool,
}

impl WaitTimeAction {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            ended: false,
            safety: false,
        }
    }
}

impl Action for WaitTimeAction {
    fn execute(&mut self) {
        self.elapsed = 0.0;
        self.ended = self.duration <= 0.0;
    }

    fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.ended = true;
        }
    }

    fn stop(&mut self) {
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
    }

    fn is_safety(&self) -> bool {
        self.safety
    }
}

/// Ends after a number of ticks.
#[derive(Debug)]
pub struct WaitFramesAction {
    frames: u32,
    counted: u32,
    ended: bool,
    safety: bool,
}

impl WaitFramesAction {
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            counted: 0,
            ended: false,
            safety: false,
        }
    }
}

impl Action for WaitFramesAction {
    fn execute(&mut self) {
        self.counted = 0;
        self.ended = self.frames == 0;
    }

    fn tick(&mut self, _dt: f32) {
        self.counted += 1;
        if self.counted >= self.frames {
            self.ended = true;
        }
    }

    fn stop(&mut self) {
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
    }

    fn is_safety(&self) -> bool {
        self.safety
    }
}

/// Ends once the predicate returns `true`. The predicate is checked on execute and every tick.
pub struct WaitUntilAction {
    predicate: Option<Box<dyn FnMut() -> bool>>,
    ended: bool,
    safety: bool,
}

impl WaitUntilAction {
    pub fn new<F: FnMut() -> bool + 'static>(predicate: F) -> Self {
        Self {
            predicate: Some(Box::new(predicate)),
            ended: false,
            safety: false,
        }
    }

    fn check(&mut self) {
        if let Some(predicate) = self.predicate.as_mut() {
            self.ended = predicate();
        }
    }
}

impl Action for WaitUntilAction {
    fn execute(&mut self) {
        self.check();
    }

    fn tick(&mut self, _dt: f32) {
        self.check();
    }

    fn stop(&mut self) {
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
    }

    fn is_safety(&self) -> bool {
        self.safety
    }

    fn dispose(&mut self) {
        self.predicate = None;
    }
}

impl fmt::Debug for WaitUntilAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitUntilAction")
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

/// Runs a closure on execute and ends immediately. Re-executing (inside a repeat) runs it again.
pub struct CallbackAction {
    callback: Option<Box<dyn FnMut()>>,
    ended: bool,
    safety: bool,
}

impl CallbackAction {
    pub fn new<F: FnMut() + 'static>(callback: F) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            ended: false,
            safety: false,
        }
    }
}

impl Action for CallbackAction {
    fn execute(&mut self) {
        self.ended = true;
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }

    fn tick(&mut self, _dt: f32) {}

    fn stop(&mut self) {
        self.ended = true;
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn mark_safety(&mut self) {
        self.safety = true;
    }

    fn is_safety(&self) -> bool {
        self.safety
    }

    fn dispose(&mut self) {
        self.callback = None;
    }
}

impl fmt::Debug for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAction")
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
