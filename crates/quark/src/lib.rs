#![forbid(unsafe_code)]

//! # quark
//!
//! Facade over the quark engines: a frame-driven timer, task and action scheduler plus a
//! reference-counted bundle cache, wired together by [`Runtime`].
//!
//! ## Quick start
//!
//! ```ignore
//! use quark::prelude::*;
//!
//! let options = RuntimeOptions::from_json(include_str!("settings.json"))?;
//! let mut runtime = Runtime::with_http(options, tokio_handle)?;
//! runtime.assets().initialize(|result| { /* manifest ready */ });
//!
//! loop {
//!     runtime.tick(frame_delta);
//! }
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod action {
    pub use quark_action::*;
}

pub mod assets {
    pub use quark_assets::*;
}

pub mod bundle {
    pub use quark_bundle::*;
}

pub mod events {
    pub use quark_events::*;
}

pub mod net {
    pub use quark_net::*;
}

pub mod pool {
    pub use quark_pool::*;
}

pub mod task {
    pub use quark_task::*;
}

pub mod timer {
    pub use quark_timer::*;
}

// ── Runtime ─────────────────────────────────────────────────────────────

mod context;
mod error;
mod logging;
mod options;
mod registry;
mod runtime;

pub use context::Context;
pub use error::{RuntimeError, RuntimeResult};
pub use logging::init_tracing;
pub use options::RuntimeOptions;
pub use registry::{Logic, ModuleRegistry};
pub use runtime::Runtime;

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use quark_action::{ActionBuilder, ActionHandle, ActionId, Repeat};
    pub use quark_assets::{AssetOptions, AssetProvider, AssetRef, FromAsset, Instance};
    pub use quark_events::{AssetEvent, ErrorKind, EventBus, FrameworkError};
    pub use quark_task::{Task, TaskSpawner, TaskState};
    pub use quark_timer::{TimerHandle, TimerId};

    pub use crate::{Context, Logic, ModuleRegistry, Runtime, RuntimeOptions};
}
