#![forbid(unsafe_code)]

//! Scripted gameplay actions.
//!
//! An [`Action`] is a small state machine with a boolean end state. Composites
//! ([`SequenceAction`], [`ParallelAction`], [`RepeatSequenceAction`]) own their children and
//! forward stop, dispose and safety marking to them. [`ActionBuilder`] assembles trees with
//! nested begin/end scopes.
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//!
//! use quark_action::{ActionBuilder, ActionSystem};
//!
//! let mut system = ActionSystem::new();
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//!
//! let id = ActionBuilder::sequence()
//!     .wait_time(0.5)
//!     .callback(move || counter.set(counter.get() + 1))
//!     .flush(&system.handle());
//!
//! system.tick(0.25);
//! system.tick(0.25);
//! assert_eq!(hits.get(), 1);
//! assert!(system.is_end(id));
//! ```

mod action;
mod builder;
mod composite;
mod leaf;
mod system;

pub use quark_timer::Repeat;

pub use crate::{
    action::Action,
    builder::ActionBuilder,
    composite::{ParallelAction, RepeatSequenceAction, SequenceAction},
    leaf::{CallbackAction, WaitFramesAction, WaitTimeAction, WaitUntilAction},
    system::{ActionHandle, ActionId, ActionSystem},
};
