#![forbid(unsafe_code)]
#![expect(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test utility crate, unwraps are acceptable"
)]

//! Shared test utilities for the quark workspace.

pub mod fixtures;
pub mod http_server;
pub mod mem_fetcher;

pub use fixtures::*;
pub use http_server::TestHttpServer;
pub use mem_fetcher::MemFetcher;

/// Installs a test-writer `tracing` subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
