//! # Formats
//!
//! Binary snapshot format for graphs. File I/O lives in the app layer.

mod snapshot;

pub use snapshot::*;
