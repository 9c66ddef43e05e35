//! # graphreduce
//!
//! Command-line front end for `graphreduce-core`.
//!
//! The binary in `main.rs` only installs logging and dispatches to [`cli`];
//! everything else lives here so integration tests can drive it directly.

pub mod cli;
pub mod config;
