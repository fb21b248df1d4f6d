//! Shared test infrastructure for tagstream-core.
//!
//! - `loader` - YAML fixture loading
//! - `generators` - seeded randomness for chunk splits
//! - `harness` - event formatting and the exact/variation runners
//!
//! Each test binary uses a different subset.

#![allow(dead_code, unused_imports)]

pub mod generators;
pub mod harness;
pub mod loader;

pub use generators::Gen;
pub use harness::{collect_events, run_test, run_with_variations};
pub use loader::load_fixtures_by_name;
