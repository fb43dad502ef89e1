//! AutoRig End-to-End Test Infrastructure
//!
//! Shared fixtures and scene helpers for the integration tests:
//!
//! - [`fixtures`]: mesh part sets for both biped presets
//! - [`harness`]: run the pipeline and query the resulting hierarchy
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p autorig-tests
//! ```

pub mod fixtures;
pub mod harness;

pub use fixtures::{basic_biped, extended_biped, two_part_example};
pub use harness::{rig_parts, RigRun};
