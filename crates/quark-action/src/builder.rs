use quark_timer::Repeat;
use tracing::warn;

use crate::{
    action::Action,
    composite::{ParallelAction, RepeatSequenceAction, SequenceAction},
    leaf::{CallbackAction, WaitFramesAction, WaitTimeAction, WaitUntilAction},
    system::{ActionHandle, ActionId},
};

#[derive(Clone, Copy, Debug)]
enum Kind {
    Sequence,
    Parallel,
    Repeat(Repeat),
}

struct Frame {
    kind: Kind,
    children: Vec<Box<dyn Action>>,
}

impl Frame {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    fn into_action(self) -> Box<dyn Action> {
        match self.kind {
            Kind::Sequence => Box::new(SequenceAction::new(self.children)),
            Kind::Parallel => Box::new(ParallelAction::new(self.children)),
            Kind::Repeat(repeat) => Box::new(RepeatSequenceAction::new(self.children, repeat)),
        }
    }
}

/// Fluent constructor for action trees.
///
/// `begin_*` opens a nested composite, `end` closes the innermost one. Scopes still open at
/// [`ActionBuilder::build`] are closed with a warning.
///
/// ```
/// use quark_action::{ActionBuilder, Repeat};
///
/// let action = ActionBuilder::sequence()
///     .wait_time(1.0)
///     .begin_parallel()
///         .callback(|| println!("flash"))
///         .begin_repeat(Repeat::Times(3))
///             .wait_frames(2)
///         .end()
///     .end()
///     .build();
/// # drop(action);
/// ```
pub struct ActionBuilder {
    stack: Vec<Frame>,
    safety: bool,
    final_callback: Option<Box<dyn FnOnce()>>,
}

impl ActionBuilder {
    fn with_root(kind: Kind) -> Self {
        Self {
            stack: vec![Frame::new(kind)],
            safety: false,
            final_callback: None,
        }
    }

    pub fn sequence() -> Self {
        Self::with_root(Kind::Sequence)
    }

    pub fn parallel() -> Self {
        Self::with_root(Kind::Parallel)
    }

    pub fn repeat(repeat: Repeat) -> Self {
        Self::with_root(Kind::Repeat(repeat))
    }

    #[must_use]
    pub fn add<A: Action + 'static>(mut self, action: A) -> Self {
        self.push(Box::new(action));
        self
    }

    #[must_use]
    pub fn wait_time(self, seconds: f32) -> Self {
        self.add(WaitTimeAction::new(seconds))
    }

    #[must_use]
    pub fn wait_frames(self, frames: u32) -> Self {
        self.add(WaitFramesAction::new(frames))
    }

    #[must_use]
    pub fn wait_until<F: FnMut() -> bool + 'static>(self, predicate: F) -> Self {
        self.add(WaitUntilAction::new(predicate))
    }

    #[must_use]
    pub fn callback<F: FnMut() + 'static>(self, callback: F) -> Self {
        self.add(CallbackAction::new(callback))
    }

    #[must_use]
    pub fn begin_sequence(mut self) -> Self {
        self.stack.push(Frame::new(Kind::Sequence));
        self
    }

    #[must_use]
    pub fn begin_parallel(mut self) -> Self {
        self.stack.push(Frame::new(Kind::Parallel));
        self
    }

    #[must_use]
    pub fn begin_repeat(mut self, repeat: Repeat) -> Self {
        self.stack.push(Frame::new(Kind::Repeat(repeat)));
        self
    }

    /// Closes the innermost scope. Closing the root is ignored.
    #[must_use]
    pub fn end(mut self) -> Self {
        if self.stack.len() <= 1 {
            warn!("action builder: end() without matching begin");
            return self;
        }
        if let Some(frame) = self.stack.pop() {
            self.push(frame.into_action());
        }
        self
    }

    /// Marks the whole tree so a panic inside it is contained by the scheduler.
    #[must_use]
    pub fn safety(mut self) -> Self {
        self.safety = true;
        self
    }

    /// Callback run once when the flushed tree leaves the scheduler.
    #[must_use]
    pub fn on_final<F: FnOnce() + 'static>(mut self, callback: F) -> Self {
        self.final_callback = Some(Box::new(callback));
        self
    }

    /// Number of scopes opened and not yet closed.
    pub fn open_scopes(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    pub fn build(self) -> Box<dyn Action> {
        self.finish().0
    }

    /// Builds the tree and schedules it.
    pub fn flush(self, handle: &ActionHandle) -> ActionId {
        let (action, final_callback) = self.finish();
        handle.add_boxed(action, final_callback)
    }

    fn push(&mut self, action: Box<dyn Action>) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(action);
        }
    }

    fn finish(mut self) -> (Box<dyn Action>, Option<Box<dyn FnOnce()>>) {
        let open = self.open_scopes();
        if open > 0 {
            warn!(open, "action builder: closing unbalanced scopes");
        }
        let mut action = loop {
            match self.stack.pop() {
                Some(frame) if self.stack.is_empty() => break frame.into_action(),
                Some(frame) => self.push(frame.into_action()),
                None => break Box::new(SequenceAction::new(Vec::new())) as Box<dyn Action>,
            }
        };
        if self.safety {
            action.mark_safety();
        }
        (action, self.final_callback)
    }
}

impl std::fmt::Debug for ActionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBuilder")
            .field("open_scopes", &self.open_scopes())
            .field("safety", &self.safety)
            .finish_non_exhaustive()
    }
}
