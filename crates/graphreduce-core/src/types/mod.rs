//! # Core Type Definitions
//!
//! This module contains the core types shared by both reduction engines:
//! - Vertex and edge identifiers (`VertexId`, `EdgeId`)
//! - Graph mode (`GraphKind`)
//! - Edges and their contracted-vertex payload (`Edge`)
//! - Input rows (`EdgeRecord`)
//! - Error types (`GraphError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so they can live in `BTreeMap`/`BTreeSet`
//! and iterate in the same order on every run.

use crate::identifiers::Identifiers;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable external identifier of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub i64);

impl VertexId {
    /// Get the raw identifier value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an edge.
///
/// Original edges keep the identifier they were loaded with. Shortcuts
/// created by contraction live in their own namespace, numbered from 1 by
/// the engine that created them, so the two can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeId {
    /// An edge supplied by the caller.
    Original(i64),
    /// A shortcut synthesized during contraction.
    Shortcut(u64),
}

impl EdgeId {
    /// Flat integer form used in result tables.
    ///
    /// Shortcut `n` is rendered as `-n`, the conventional negative id for
    /// synthesized edges.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Original(id) => id,
            Self::Shortcut(n) => (n as i64).wrapping_neg(),
        }
    }

    /// Whether this edge was synthesized by contraction.
    #[must_use]
    pub const fn is_shortcut(self) -> bool {
        matches!(self, Self::Shortcut(_))
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

// =============================================================================
// GRAPH KIND
// =============================================================================

/// Whether edges are one-way or two-way. Fixed for the lifetime of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GraphKind {
    Directed,
    #[default]
    Undirected,
}

impl GraphKind {
    #[must_use]
    pub const fn from_directed(directed: bool) -> Self {
        if directed {
            Self::Directed
        } else {
            Self::Undirected
        }
    }

    #[must_use]
    pub const fn is_directed(self) -> bool {
        matches!(self, Self::Directed)
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directed => f.write_str("directed"),
            Self::Undirected => f.write_str("undirected"),
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// An edge of the graph together with its contraction payload.
///
/// In an undirected graph `source` and `target` are just the two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub cost: f64,
    /// Vertices this edge stands in for. Empty for original edges.
    pub contracted: Identifiers<VertexId>,
}

impl Edge {
    /// Create an original edge with an empty contracted-vertex list.
    #[must_use]
    pub fn new(id: i64, source: VertexId, target: VertexId, cost: f64) -> Self {
        Self {
            id: EdgeId::Original(id),
            source,
            target,
            cost,
            contracted: Identifiers::new(),
        }
    }

    /// Create a shortcut edge carrying the given contracted vertices.
    #[must_use]
    pub fn shortcut(
        serial: u64,
        source: VertexId,
        target: VertexId,
        cost: f64,
        contracted: Identifiers<VertexId>,
    ) -> Self {
        Self {
            id: EdgeId::Shortcut(serial),
            source,
            target,
            cost,
            contracted,
        }
    }

    /// Whether the edge is a self-loop.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Whether the edge runs `from -> to` (or joins them, when undirected).
    #[must_use]
    pub fn joins(&self, from: VertexId, to: VertexId, kind: GraphKind) -> bool {
        (self.source == from && self.target == to)
            || (!kind.is_directed() && self.source == to && self.target == from)
    }

    /// The endpoint opposite to `v`, if `v` is an endpoint at all.
    #[must_use]
    pub fn opposite(&self, v: VertexId) -> Option<VertexId> {
        if self.source == v {
            Some(self.target)
        } else if self.target == v {
            Some(self.source)
        } else {
            None
        }
    }
}

// =============================================================================
// EDGE RECORD
// =============================================================================

/// One input row of an edge list.
///
/// A non-negative `cost` yields `source -> target`; a non-negative
/// `reverse_cost` yields `target -> source` under the same id. Negative costs
/// mean the direction does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: i64,
    pub source: i64,
    pub target: i64,
    pub cost: f64,
    #[serde(default)]
    pub reverse_cost: Option<f64>,
}

impl EdgeRecord {
    #[must_use]
    pub fn new(id: i64, source: i64, target: i64, cost: f64) -> Self {
        Self {
            id,
            source,
            target,
            cost,
            reverse_cost: None,
        }
    }

    #[must_use]
    pub fn with_reverse_cost(mut self, reverse_cost: f64) -> Self {
        self.reverse_cost = Some(reverse_cost);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in graphreduce.
///
/// Structural surprises inside the engines are not errors: they are skipped.
/// This enum covers the fallible surfaces around them (loading, selectors,
/// snapshots, file I/O).
#[derive(Debug, Error)]
pub enum GraphError {
    /// The requested vertex is not in the graph.
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// An edge cost is not a finite, non-negative number.
    #[error("Invalid cost {cost} on edge {edge}")]
    InvalidCost { edge: i64, cost: f64 },

    /// The MST ordering selector is not 0, 1 or 2.
    #[error("Invalid order selector: {0} (expected 0, 1 or 2)")]
    InvalidOrder(i64),

    /// Input could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
