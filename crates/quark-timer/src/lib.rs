#![forbid(unsafe_code)]

//! Frame-driven timers.
//!
//! [`TimerSystem`] owns every live timer and advances them from an externally supplied delta
//! time; there are no threads. Timers are registered and cancelled through a cloneable
//! [`TimerHandle`], which also works from inside a timer callback.
//!
//! ## Scheduling contract
//! - Additions made through a handle join the active list at the start of the next
//!   [`TimerSystem::tick`].
//! - [`TimerHandle::stop_timer`] zeroes the remaining repeat count on the next pass; the timer is
//!   pruned there. Callbacks already running in the current tick are unaffected.
//! - A timer whose interval is `<= 0` fires once per tick.
//! - A stalled frame catches up by firing at most [`TimerOptions::max_fires_per_tick`] times;
//!   the rest of the backlog is dropped.

mod options;
mod system;
mod timer;

pub use options::{DEFAULT_MAX_FIRES_PER_TICK, TimerOptions};
pub use system::{TimerHandle, TimerSystem};
pub use timer::{Repeat, TimerId};
