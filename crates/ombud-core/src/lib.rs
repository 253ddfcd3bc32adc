//! Foundational low-level utilities shared across ombud crates.
//!
//! Provides the unix-time helpers used by ownership snapshots, health
//! reporting, and poll-deadline calculations.

pub mod time;

pub use time::{elapsed_ms, unix_timestamp_ms, unix_timestamp_s};
