//! # Graph Store
//!
//! The graph abstraction consumed by both reduction engines.
//!
//! This module defines the `GraphStore` trait and `Graph`, an adjacency-list
//! implementation of it. All data structures use `BTreeMap`/`BTreeSet` for
//! deterministic ordering; edges iterate in insertion order.

use crate::{Edge, EdgeId, EdgeRecord, GraphError, GraphKind, Identifiers, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the graph operations the engines rely on.
///
/// Lookups are infallible. Mutations return `Result<T, GraphError>` so that
/// other storage layouts can reject them.
pub trait GraphStore {
    /// Directed or undirected, fixed for the lifetime of the graph.
    fn kind(&self) -> GraphKind;

    /// All vertex ids, materialized in ascending order.
    ///
    /// Callers that mutate the graph iterate this snapshot, never the live
    /// vertex collection.
    fn vertex_ids(&self) -> Vec<VertexId>;

    /// Check if a vertex exists.
    fn contains_vertex(&self, v: VertexId) -> bool;

    /// Distinct vertices sharing an edge with `v`, in either direction.
    /// `v` itself is never part of the result, even with a self-loop.
    fn adjacent_vertices(&self, v: VertexId) -> Identifiers<VertexId>;

    /// Whether an edge `from -> to` exists (either way when undirected).
    fn has_edge(&self, from: VertexId, to: VertexId) -> bool;

    /// Cheapest edge `from -> to`. Ties resolve to the earliest inserted edge.
    fn min_cost_edge(&self, from: VertexId, to: VertexId) -> Option<&Edge>;

    /// All edges in insertion order.
    fn edges(&self) -> impl Iterator<Item = &Edge> + '_;

    /// Insert a shortcut edge created by contraction.
    fn add_shortcut(&mut self, shortcut: Edge) -> Result<(), GraphError>;

    /// Remove every edge `from -> to` (either way when undirected).
    /// Returns the removed edges; both vertices stay.
    fn remove_edges(&mut self, from: VertexId, to: VertexId) -> Vec<Edge>;

    /// Remove a vertex and every edge touching it. Returns the removed edges.
    fn remove_vertex(&mut self, v: VertexId) -> Result<Vec<Edge>, GraphError>;

    /// Drop `id` from the live-shortcut bookkeeping.
    fn forget_shortcut(&mut self, id: EdgeId);

    /// Ids of the shortcuts currently present in the graph.
    fn shortcuts(&self) -> &Identifiers<EdgeId>;

    /// Get the total number of vertices.
    fn vertex_count(&self) -> usize;

    /// Get the total number of edges.
    fn edge_count(&self) -> usize;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// Adjacency-list graph.
///
/// Every edge gets an insertion slot; vertices record the slots of the edges
/// touching them, so per-vertex iteration also follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    kind: GraphKind,

    /// Vertex -> slots of incident edges (in and out)
    vertices: BTreeMap<VertexId, BTreeSet<u64>>,

    /// Edge storage: slot -> Edge
    edges: BTreeMap<u64, Edge>,

    /// Live shortcut ids
    shortcuts: Identifiers<EdgeId>,

    /// Next available slot
    next_slot: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Build a graph from edge records.
    ///
    /// A record contributes `source -> target` when `cost >= 0` and
    /// `target -> source` when `reverse_cost >= 0`. Records with no usable
    /// direction are skipped.
    pub fn from_records(kind: GraphKind, records: &[EdgeRecord]) -> Result<Self, GraphError> {
        let mut graph = Self::new(kind);
        for record in records {
            graph.insert_record(record)?;
        }
        tracing::debug!(
            records = records.len(),
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            %kind,
            "graph loaded"
        );
        Ok(graph)
    }

    /// Insert a single edge record. See [`Graph::from_records`].
    pub fn insert_record(&mut self, record: &EdgeRecord) -> Result<(), GraphError> {
        let source = VertexId(record.source);
        let target = VertexId(record.target);

        if record.cost >= 0.0 {
            self.insert_edge(Edge::new(record.id, source, target, record.cost))?;
        } else if record.cost.is_nan() {
            return Err(GraphError::InvalidCost {
                edge: record.id,
                cost: record.cost,
            });
        }

        if let Some(reverse_cost) = record.reverse_cost {
            if reverse_cost >= 0.0 {
                self.insert_edge(Edge::new(record.id, target, source, reverse_cost))?;
            } else if reverse_cost.is_nan() {
                return Err(GraphError::InvalidCost {
                    edge: record.id,
                    cost: reverse_cost,
                });
            }
        }
        Ok(())
    }

    /// Insert an edge, creating its endpoints as needed.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !edge.cost.is_finite() || edge.cost < 0.0 {
            return Err(GraphError::InvalidCost {
                edge: edge.id.as_i64(),
                cost: edge.cost,
            });
        }

        let slot = self.next_slot;
        self.next_slot = self.next_slot.saturating_add(1);

        self.vertices.entry(edge.source).or_default().insert(slot);
        self.vertices.entry(edge.target).or_default().insert(slot);
        if edge.id.is_shortcut() {
            self.shortcuts.insert(edge.id);
        }
        self.edges.insert(slot, edge);
        Ok(())
    }

    /// Add an isolated vertex. No-op if it already exists.
    pub fn add_vertex(&mut self, v: VertexId) {
        self.vertices.entry(v).or_default();
    }

    /// Edges touching `v`, in insertion order.
    pub fn incident_edges(&self, v: VertexId) -> impl Iterator<Item = &Edge> + '_ {
        self.vertices
            .get(&v)
            .into_iter()
            .flat_map(|slots| slots.iter().filter_map(|slot| self.edges.get(slot)))
    }

    /// First edge carrying `id`, in insertion order.
    ///
    /// Original ids may appear twice when a record has a reverse cost.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.values().find(|edge| edge.id == id)
    }

    /// Shortcut edges currently in the graph, in insertion order.
    pub fn shortcut_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .values()
            .filter(|edge| self.shortcuts.contains(&edge.id))
    }

    /// Number of edges touching `v` (a self-loop counts once).
    #[must_use]
    pub fn degree(&self, v: VertexId) -> usize {
        self.vertices.get(&v).map_or(0, BTreeSet::len)
    }

    /// Total cost of all edges.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.edges.values().map(|edge| edge.cost).sum()
    }
}

impl GraphStore for Graph {
    fn kind(&self) -> GraphKind {
        self.kind
    }

    fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains_key(&v)
    }

    fn adjacent_vertices(&self, v: VertexId) -> Identifiers<VertexId> {
        self.incident_edges(v)
            .filter_map(|edge| edge.opposite(v))
            .filter(|&u| u != v)
            .collect()
    }

    fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        let kind = self.kind;
        self.incident_edges(from)
            .any(|edge| edge.joins(from, to, kind))
    }

    fn min_cost_edge(&self, from: VertexId, to: VertexId) -> Option<&Edge> {
        let kind = self.kind;
        self.incident_edges(from)
            .filter(|edge| edge.joins(from, to, kind))
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
    }

    fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    fn add_shortcut(&mut self, shortcut: Edge) -> Result<(), GraphError> {
        if !self.contains_vertex(shortcut.source) {
            return Err(GraphError::VertexNotFound(shortcut.source));
        }
        if !self.contains_vertex(shortcut.target) {
            return Err(GraphError::VertexNotFound(shortcut.target));
        }
        self.insert_edge(shortcut)
    }

    fn remove_edges(&mut self, from: VertexId, to: VertexId) -> Vec<Edge> {
        let kind = self.kind;
        let slots: Vec<u64> = self
            .vertices
            .get(&from)
            .into_iter()
            .flatten()
            .copied()
            .filter(|slot| {
                self.edges
                    .get(slot)
                    .is_some_and(|edge| edge.joins(from, to, kind))
            })
            .collect();

        let mut removed = Vec::with_capacity(slots.len());
        for slot in slots {
            for end in [from, to] {
                if let Some(end_slots) = self.vertices.get_mut(&end) {
                    end_slots.remove(&slot);
                }
            }
            if let Some(edge) = self.edges.remove(&slot) {
                removed.push(edge);
            }
        }
        removed
    }

    fn remove_vertex(&mut self, v: VertexId) -> Result<Vec<Edge>, GraphError> {
        let slots = self.vertices.remove(&v).ok_or(GraphError::VertexNotFound(v))?;

        let mut removed = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some(edge) = self.edges.remove(&slot) else {
                continue;
            };
            if let Some(other) = edge.opposite(v).filter(|&u| u != v) {
                if let Some(other_slots) = self.vertices.get_mut(&other) {
                    other_slots.remove(&slot);
                }
            }
            removed.push(edge);
        }
        Ok(removed)
    }

    fn forget_shortcut(&mut self, id: EdgeId) {
        self.shortcuts.remove(&id);
    }

    fn shortcuts(&self) -> &Identifiers<EdgeId> {
        &self.shortcuts
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable representation of the graph for snapshots.
///
/// Edges are stored in insertion order, so a restored graph iterates exactly
/// like the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub kind: GraphKind,
    pub vertices: Vec<VertexId>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub shortcuts: Vec<EdgeId>,
}

impl From<&Graph> for SerializableGraph {
    fn from(graph: &Graph) -> Self {
        Self {
            kind: graph.kind,
            vertices: graph.vertex_ids(),
            edges: graph.edges.values().cloned().collect(),
            shortcuts: graph.shortcuts.to_vec(),
        }
    }
}

impl TryFrom<SerializableGraph> for Graph {
    type Error = GraphError;

    /// Rebuild a graph, checking that the payload is self-consistent: every
    /// edge endpoint is a listed vertex and every live shortcut id names a
    /// shortcut edge.
    fn try_from(sg: SerializableGraph) -> Result<Self, Self::Error> {
        let mut graph = Graph::new(sg.kind);

        for v in sg.vertices {
            graph.add_vertex(v);
        }
        for edge in sg.edges {
            for end in [edge.source, edge.target] {
                if !graph.contains_vertex(end) {
                    return Err(GraphError::SerializationError(format!(
                        "edge {} references unlisted vertex {}",
                        edge.id, end
                    )));
                }
            }
            graph.insert_edge(edge)?;
        }

        // insert_edge tracked every shortcut-tagged edge; keep only the
        // ones the snapshot lists as live.
        let live: Identifiers<EdgeId> = sg.shortcuts.into_iter().collect();
        if let Some(missing) = live.iter().find(|&id| !graph.shortcuts.contains(id)) {
            return Err(GraphError::SerializationError(format!(
                "live shortcut {missing} has no edge"
            )));
        }
        graph.shortcuts = graph
            .shortcuts
            .iter()
            .copied()
            .filter(|id| live.contains(id))
            .collect();

        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================
