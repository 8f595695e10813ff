/// A cooperative scripted behavior.
///
/// The scheduler calls [`Action::execute`] once, then [`Action::tick`] every pass until
/// [`Action::is_end`] reports `true`. [`Action::stop`] ends the action cooperatively.
pub trait Action {
    fn execute(&mut self);

    fn tick(&mut self, dt: f32);

    fn stop(&mut self);

    fn is_end(&self) -> bool;

    /// Marks the action so a panic inside it is contained after cleanup instead of resuming.
    fn mark_safety(&mut self);

    fn is_safety(&self) -> bool;

    fn dispose(&mut self) {}
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn execute(&mut self) {
        (**self).execute();
    }

    fn tick(&mut self, dt: f32) {
        (**self).tick(dt);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn is_end(&self) -> bool {
        (**self).is_end()
    }

    fn mark_safety(&mut self) {
        (**self).mark_safety();
    }

    fn is_safety(&self) -> bool {
        (**self).is_safety()
    }

    fn dispose(&mut self) {
        (**self).dispose();
    }
}

/// Starts an action on its first drive, then ticks it while it runs.
pub(crate) fn drive(action: &mut dyn Action, started: &mut bool, dt: f32) {
    if !*started {
        *started = true;
        action.execute();
    }
    if !action.is_end() {
        action.tick(dt);
    }
}
