// Common fixtures and utilities for integration tests

pub mod runtime;

pub use runtime::*;
