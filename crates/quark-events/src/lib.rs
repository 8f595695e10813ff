#![forbid(unsafe_code)]

//! Event bus for the quark runtime.
//!
//! Subscribers register per event type and get a [`Subscription`] token back; dispatch is
//! synchronous on the tick thread. Worker threads hand events over through an
//! [`EventPoster`], and the bus delivers them on the next [`EventBus::dispatch_posted`].

mod bus;
mod event;

pub use bus::{EventBus, EventPoster, Subscription};
pub use event::{AssetEvent, ErrorKind, FrameworkError};
