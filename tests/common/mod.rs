//! Shared test utilities for featsearch integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Session helpers are deterministic under
//! `tokio::time::pause()` / `start_paused = true`.

pub mod assertions;
pub mod builders;
pub mod fake_scope_api;
pub mod fixtures;

pub use builders::*;
pub use fake_scope_api::FakeScopeApi;
pub use fixtures::*;
