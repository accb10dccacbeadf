//! Shared test utilities for faxdesk integration tests.
//!
//! This module provides:
//! - `TestHarness` with a temp watch folder, an in-memory database and
//!   scripted collaborators
//! - Builders for request and record fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{TestHarness, SUMMARY};
