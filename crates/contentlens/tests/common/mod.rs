//! Shared test utilities for contentlens integration tests.
//!
//! - `TestHarness` wires a `Lifecycle` to temp directories and a stub generator
//! - `StubGenerator` records every request and replies with a canned answer

pub mod harness;

pub use harness::{StubGenerator, TestHarness};
