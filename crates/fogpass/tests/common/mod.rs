//! Shared test utilities for fogpass integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against a fresh database and temp directories
//! - Builders for delimited and workbook fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
