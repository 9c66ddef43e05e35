//! # graphreduce-core
//!
//! The deterministic reduction engine for graphreduce - THE LOGIC.
//!
//! Two engines share one graph abstraction:
//! - **Linear contraction** collapses degree-2 vertices into shortcut edges
//!   that keep reachability and cumulative cost, recording the vertices each
//!   shortcut stands in for.
//! - **Kruskal** computes a minimum spanning forest and reports it unordered,
//!   depth-first, or breadth-first per component with a running aggregated
//!   cost.
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-threaded: every call runs to completion
//! - Engines borrow the caller's graph; contraction mutates it, Kruskal only
//!   reads it
//! - Deterministic: BTree collections only, stable sorts, fixed tie-breaking
//! - NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod contraction;
pub mod formats;
pub mod graph;
pub mod identifiers;
pub mod mst;
pub mod primitives;
pub mod types;

mod union_find;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use identifiers::Identifiers;
pub use types::{Edge, EdgeId, EdgeRecord, GraphError, GraphKind, VertexId};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use contraction::{ContractionStats, LinearContraction};
pub use graph::{Graph, GraphStore, SerializableGraph};
pub use mst::{Components, Kruskal, MstRow, OrderBy, total_cost};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{graph_from_bytes, graph_to_bytes};
