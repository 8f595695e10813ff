//! All integration tests for quark
#![expect(
    clippy::unwrap_used,
    reason = "integration test crate, unwraps are acceptable in test code"
)]

mod common;
mod quark_assets;
mod quark_bundle;
mod quark_engines;
mod quark_net;
