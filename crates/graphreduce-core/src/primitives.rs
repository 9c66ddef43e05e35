//! # Fixed Constants
//!
//! Constants compiled into the binary and immutable at runtime.

/// Magic bytes for the graph snapshot header.
///
/// - File Header = Magic Bytes ("GRDC") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"GRDC";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum size of an edge-list or snapshot file (256 MB).
pub const MAX_INPUT_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum number of edge records accepted from one input.
pub const MAX_EDGE_RECORDS: usize = 5_000_000;
