//! # Linear Contraction
//!
//! Collapses degree-2 ("linear") vertices into shortcut edges.
//!
//! A vertex `v` is linear when it has exactly two adjacent vertices `u` and
//! `w` and a path `u - v - w` can be rebuilt without it:
//!
//! ```text
//! undirected:  u --e1-- v --e2-- w      =>  u --(e1+e2)-- w
//! directed:    u -e1-> v -e2-> w        =>  u -(e1+e2)-> w
//!              w -e3-> v -e4-> u        =>  w -(e3+e4)-> u
//! ```
//!
//! The shortcut's cost is the sum of the two replaced edges and its
//! contracted-vertex list is `{v}` plus the lists of both replaced edges, so
//! a chain collapsed step by step ends up as one edge listing every interior
//! vertex of the chain.
//!
//! The engine works on an explicit queue. It never iterates the graph's own
//! collections while mutating them.

use crate::graph::GraphStore;
use crate::{Edge, EdgeId, GraphError, GraphKind, Identifiers, VertexId};
use serde::{Deserialize, Serialize};

/// Counters describing one contraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionStats {
    /// Vertices removed from the graph.
    pub contracted: usize,
    /// Shortcut edges inserted.
    pub shortcuts: usize,
    /// Queue entries left in place: no longer linear when popped, or a
    /// shortcut cost that overflows.
    pub skipped: usize,
}

/// The linear contraction engine.
///
/// Usage: optionally [`set_forbidden_vertices`](Self::set_forbidden_vertices),
/// then [`calculate_vertices`](Self::calculate_vertices), then
/// [`do_contraction`](Self::do_contraction). [`contract`](Self::contract)
/// runs the last two in one call.
#[derive(Debug, Clone, Default)]
pub struct LinearContraction {
    linear_vertices: Identifiers<VertexId>,
    forbidden_vertices: Identifiers<VertexId>,
    /// Serial of the last shortcut minted by this engine.
    last_shortcut: u64,
}

impl LinearContraction {
    /// Create a new engine with an empty queue and no forbidden vertices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertices that must never be contracted.
    ///
    /// Any of them already queued are dropped from the queue.
    pub fn set_forbidden_vertices(&mut self, forbidden: Identifiers<VertexId>) {
        tracing::debug!(count = forbidden.len(), "setting forbidden vertices");
        self.forbidden_vertices = forbidden;
        self.linear_vertices
            .difference_update(&self.forbidden_vertices);
    }

    #[must_use]
    pub fn forbidden_vertices(&self) -> &Identifiers<VertexId> {
        &self.forbidden_vertices
    }

    /// The current work queue.
    #[must_use]
    pub fn linear_vertices(&self) -> &Identifiers<VertexId> {
        &self.linear_vertices
    }

    /// Phase 1: queue every linear, non-forbidden vertex of `graph`.
    pub fn calculate_vertices<G: GraphStore>(&mut self, graph: &G) {
        for v in graph.vertex_ids() {
            if Self::is_linear(graph, v) {
                self.linear_vertices.insert(v);
            }
        }
        self.linear_vertices
            .difference_update(&self.forbidden_vertices);

        tracing::debug!(
            linear = self.linear_vertices.len(),
            vertices = graph.vertex_count(),
            "linear vertices calculated"
        );
    }

    /// Phase 2: drain the queue, replacing each vertex with shortcuts.
    ///
    /// Each shortcut takes the place of every edge along its two hops. The
    /// vertex itself goes once no edge touches it; a directed vertex keeps
    /// the edges no shortcut replaced. A vertex whose shortcut cost would
    /// not be finite is left untouched and counted as skipped.
    ///
    /// Neighbours of a contracted vertex are re-tested and queued when they
    /// became linear. Terminates because every contraction replaces at least
    /// two edges with one.
    pub fn do_contraction<G: GraphStore>(
        &mut self,
        graph: &mut G,
    ) -> Result<ContractionStats, GraphError> {
        let mut stats = ContractionStats::default();

        // Keep numbering past shortcuts the graph already carries.
        let highest = graph
            .edges()
            .filter_map(|edge| match edge.id {
                EdgeId::Shortcut(serial) => Some(serial),
                EdgeId::Original(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.last_shortcut = self.last_shortcut.max(highest);

        while let Some(v) = self.linear_vertices.pop_front() {
            let pair = Self::linear_pair(&*graph, v);
            debug_assert!(pair.is_some(), "queued vertex {v} is no longer linear");
            let Some((v1, v2)) = pair else {
                tracing::debug!(vertex = %v, "skipping stale queue entry");
                stats.skipped = stats.skipped.saturating_add(1);
                continue;
            };
            tracing::trace!(vertex = %v, left = %v1, right = %v2, "contracting");

            let bypasses: Vec<Bypass> = match graph.kind() {
                GraphKind::Directed => [
                    Bypass::cheapest(&*graph, v1, v, v2),
                    Bypass::cheapest(&*graph, v2, v, v1),
                ]
                .into_iter()
                .flatten()
                .collect(),
                GraphKind::Undirected => {
                    Bypass::cheapest(&*graph, v1, v, v2).into_iter().collect()
                }
            };

            if let Some(bypass) = bypasses.iter().find(|b| !b.cost.is_finite()) {
                tracing::warn!(
                    vertex = %v,
                    source = %bypass.from,
                    target = %bypass.to,
                    "shortcut cost overflows, vertex kept"
                );
                stats.skipped = stats.skipped.saturating_add(1);
                continue;
            }

            for bypass in bypasses {
                let (from, to) = (bypass.from, bypass.to);
                self.last_shortcut = self.last_shortcut.saturating_add(1);
                let shortcut = bypass.into_shortcut(self.last_shortcut);
                tracing::trace!(
                    id = %shortcut.id,
                    source = %shortcut.source,
                    target = %shortcut.target,
                    cost = shortcut.cost,
                    contracted = %shortcut.contracted,
                    "adding shortcut"
                );
                graph.add_shortcut(shortcut)?;
                stats.shortcuts = stats.shortcuts.saturating_add(1);

                let mut replaced = graph.remove_edges(from, v);
                replaced.extend(graph.remove_edges(v, to));
                for edge in replaced {
                    if edge.id.is_shortcut() {
                        graph.forget_shortcut(edge.id);
                    }
                }
            }

            if graph.adjacent_vertices(v).is_empty() {
                graph.remove_vertex(v)?;
                stats.contracted = stats.contracted.saturating_add(1);
            } else {
                tracing::trace!(vertex = %v, "vertex keeps unreplaced edges");
            }

            for neighbour in [v1, v2] {
                if Self::is_linear(&*graph, neighbour)
                    && !self.forbidden_vertices.contains(&neighbour)
                {
                    tracing::trace!(vertex = %neighbour, "queueing freed neighbour");
                    self.linear_vertices.insert(neighbour);
                } else {
                    self.linear_vertices.remove(&neighbour);
                }
            }
        }

        tracing::debug!(
            contracted = stats.contracted,
            shortcuts = stats.shortcuts,
            skipped = stats.skipped,
            "linear contraction finished"
        );
        Ok(stats)
    }

    /// Run [`calculate_vertices`](Self::calculate_vertices) and
    /// [`do_contraction`](Self::do_contraction).
    pub fn contract<G: GraphStore>(&mut self, graph: &mut G) -> Result<ContractionStats, GraphError> {
        self.calculate_vertices(&*graph);
        self.do_contraction(graph)
    }

    /// Whether `v` can be replaced by shortcuts.
    ///
    /// Requires exactly two adjacent vertices, no self-loop on `v`, and a
    /// through-path in at least one direction.
    pub fn is_linear<G: GraphStore>(graph: &G, v: VertexId) -> bool {
        Self::linear_pair(graph, v).is_some()
    }

    /// The two neighbours of `v` when it is linear.
    fn linear_pair<G: GraphStore>(graph: &G, v: VertexId) -> Option<(VertexId, VertexId)> {
        let adjacent = graph.adjacent_vertices(v);
        if adjacent.len() != 2 || graph.has_edge(v, v) {
            return None;
        }

        let mut pair = adjacent.iter().copied();
        let (u, w) = (pair.next()?, pair.next()?);
        Self::is_shortcut_possible(graph, u, v, w).then_some((u, w))
    }

    /// Whether a shortcut around `v` between `u` and `w` can exist.
    fn is_shortcut_possible<G: GraphStore>(graph: &G, u: VertexId, v: VertexId, w: VertexId) -> bool {
        match graph.kind() {
            // u - v - w
            GraphKind::Undirected => graph.has_edge(u, v) && graph.has_edge(v, w),
            // u -> v -> w  or  w -> v -> u
            GraphKind::Directed => {
                (graph.has_edge(u, v) && graph.has_edge(v, w))
                    || (graph.has_edge(w, v) && graph.has_edge(v, u))
            }
        }
    }
}

/// A shortcut `from -> via -> to` that has not been given an id yet.
struct Bypass {
    from: VertexId,
    to: VertexId,
    cost: f64,
    contracted: Identifiers<VertexId>,
}

impl Bypass {
    /// Plan the bypass from the cheapest edge of each hop. `None` when either
    /// hop is missing.
    fn cheapest<G: GraphStore>(graph: &G, from: VertexId, via: VertexId, to: VertexId) -> Option<Self> {
        let incoming = graph.min_cost_edge(from, via)?;
        let outgoing = graph.min_cost_edge(via, to)?;

        let mut contracted = Identifiers::new();
        contracted.insert(via);
        contracted.union_with(&incoming.contracted);
        contracted.union_with(&outgoing.contracted);

        Some(Self {
            from,
            to,
            cost: incoming.cost + outgoing.cost,
            contracted,
        })
    }

    fn into_shortcut(self, serial: u64) -> Edge {
        Edge::shortcut(serial, self.from, self.to, self.cost, self.contracted)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeRecord, Graph};

    fn graph(kind: GraphKind, edges: &[(i64, i64, i64, f64)]) -> Graph {
        let records: Vec<_> = edges
            .iter()
            .map(|&(id, s, t, c)| EdgeRecord::new(id, s, t, c))
            .collect();
        Graph::from_records(kind, &records).expect("load")
    }

    fn ids(values: &[i64]) -> Identifiers<VertexId> {
        values.iter().map(|&v| VertexId(v)).collect()
    }

    #[test]
    fn path_interior_is_linear() {
        let g = graph(GraphKind::Undirected, &[(1, 1, 2, 1.0), (2, 2, 3, 1.0)]);

        assert!(LinearContraction::is_linear(&g, VertexId(2)));
        assert!(!LinearContraction::is_linear(&g, VertexId(1)));
        assert!(!LinearContraction::is_linear(&g, VertexId(3)));
    }

    #[test]
    fn hub_is_not_linear() {
        let g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 2, 4, 1.0)],
        );
        assert!(!LinearContraction::is_linear(&g, VertexId(2)));
    }

    #[test]
    fn directed_sink_is_not_linear() {
        // 1 -> 2 <- 3: no through-path
        let g = graph(GraphKind::Directed, &[(1, 1, 2, 1.0), (2, 3, 2, 1.0)]);
        assert!(!LinearContraction::is_linear(&g, VertexId(2)));
    }

    #[test]
    fn directed_reverse_through_path_is_linear() {
        // 3 -> 2 -> 1
        let g = graph(GraphKind::Directed, &[(1, 2, 1, 1.0), (2, 3, 2, 1.0)]);
        assert!(LinearContraction::is_linear(&g, VertexId(2)));
    }

    #[test]
    fn self_loop_vertex_is_not_linear() {
        let g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 2, 2, 1.0)],
        );
        assert!(!LinearContraction::is_linear(&g, VertexId(2)));
    }

    #[test]
    fn undirected_chain_collapses_to_one_shortcut() {
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 2.0), (3, 3, 4, 4.0)],
        );

        let mut engine = LinearContraction::new();
        let stats = engine.contract(&mut g).expect("contract");

        assert_eq!(stats.contracted, 2);
        assert_eq!(g.vertex_ids(), vec![VertexId(1), VertexId(4)]);
        assert_eq!(g.edge_count(), 1);

        let shortcut = g.shortcut_edges().next().expect("shortcut");
        assert_eq!(shortcut.cost, 7.0);
        assert_eq!(shortcut.contracted, ids(&[2, 3]));
        assert_eq!(g.shortcuts().len(), 1);
    }

    #[test]
    fn shortcut_ids_are_minted_in_sequence() {
        let mut g = graph(GraphKind::Undirected, &[(1, 1, 2, 1.0), (2, 2, 3, 1.0)]);

        let mut engine = LinearContraction::new();
        engine.contract(&mut g).expect("contract");

        let shortcut = g.shortcut_edges().next().expect("shortcut");
        assert_eq!(shortcut.id, EdgeId::Shortcut(1));
        assert_eq!(shortcut.id.as_i64(), -1);
    }

    #[test]
    fn undirected_uses_cheapest_parallel_edges() {
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 5.0), (2, 1, 2, 1.0), (3, 2, 3, 3.0), (4, 3, 2, 2.0)],
        );

        LinearContraction::new().contract(&mut g).expect("contract");

        let shortcut = g.shortcut_edges().next().expect("shortcut");
        assert_eq!(shortcut.cost, 3.0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn directed_builds_both_directions_independently() {
        // 1 <-> 2 <-> 3 with different costs per direction
        let records = vec![
            EdgeRecord::new(1, 1, 2, 1.0).with_reverse_cost(10.0),
            EdgeRecord::new(2, 2, 3, 2.0).with_reverse_cost(20.0),
        ];
        let mut g = Graph::from_records(GraphKind::Directed, &records).expect("load");

        let stats = LinearContraction::new().contract(&mut g).expect("contract");
        assert_eq!(stats.shortcuts, 2);

        let forward = g.min_cost_edge(VertexId(1), VertexId(3)).expect("forward");
        let backward = g.min_cost_edge(VertexId(3), VertexId(1)).expect("backward");
        assert_eq!(forward.cost, 3.0);
        assert_eq!(backward.cost, 30.0);
    }

    #[test]
    fn directed_one_way_produces_single_shortcut() {
        let mut g = graph(GraphKind::Directed, &[(1, 1, 2, 1.0), (2, 2, 3, 1.0)]);

        let stats = LinearContraction::new().contract(&mut g).expect("contract");

        assert_eq!(stats.shortcuts, 1);
        assert!(g.has_edge(VertexId(1), VertexId(3)));
        assert!(!g.has_edge(VertexId(3), VertexId(1)));
    }

    #[test]
    fn forbidden_vertex_is_kept() {
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 4, 1.0)],
        );

        let mut engine = LinearContraction::new();
        engine.set_forbidden_vertices(ids(&[3]));
        engine.contract(&mut g).expect("contract");

        assert!(g.contains_vertex(VertexId(3)));
        assert!(!g.contains_vertex(VertexId(2)));
        assert!(g.has_edge(VertexId(3), VertexId(4)));
        assert!(g.has_edge(VertexId(1), VertexId(3)));
    }

    #[test]
    fn forbidden_set_after_calculation_prunes_queue() {
        let g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 4, 1.0)],
        );

        let mut engine = LinearContraction::new();
        engine.calculate_vertices(&g);
        assert_eq!(engine.linear_vertices(), &ids(&[2, 3]));

        engine.set_forbidden_vertices(ids(&[2]));
        assert_eq!(engine.linear_vertices(), &ids(&[3]));
    }

    #[test]
    fn calculate_vertices_is_idempotent() {
        let g = graph(GraphKind::Undirected, &[(1, 1, 2, 1.0), (2, 2, 3, 1.0)]);

        let mut engine = LinearContraction::new();
        engine.calculate_vertices(&g);
        let first = engine.linear_vertices().clone();
        engine.calculate_vertices(&g);

        assert_eq!(engine.linear_vertices(), &first);
    }

    #[test]
    fn cycle_reduces_without_self_loops() {
        // square 1-2-3-4-1: every vertex is linear
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 4, 1.0), (4, 4, 1, 1.0)],
        );

        LinearContraction::new().contract(&mut g).expect("contract");

        assert!(g.edges().all(|e| !e.is_loop()));
        // two vertices remain, joined by parallel edges
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges().map(|e| e.cost).sum::<f64>(), 4.0);
    }

    #[test]
    fn absorbed_shortcuts_leave_bookkeeping() {
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 4, 1.0), (4, 4, 5, 1.0)],
        );

        LinearContraction::new().contract(&mut g).expect("contract");

        assert_eq!(g.shortcuts().len(), 1);
        let live = g.shortcuts().front().expect("live shortcut");
        assert_eq!(g.edge(live).map(|e| e.contracted.len()), Some(3));
    }

    #[test]
    fn fresh_engine_continues_shortcut_numbering() {
        let mut g = graph(GraphKind::Undirected, &[(1, 1, 2, 1.0), (2, 2, 3, 1.0)]);
        LinearContraction::new().contract(&mut g).expect("first pass");

        // a second, separate path 7 - 8 - 9
        g.insert_edge(Edge::new(3, VertexId(7), VertexId(8), 1.0)).expect("edge");
        g.insert_edge(Edge::new(4, VertexId(8), VertexId(9), 1.0)).expect("edge");
        LinearContraction::new().contract(&mut g).expect("second pass");

        let ids: Vec<_> = g.shortcut_edges().map(|e| e.id).collect();
        assert_eq!(ids, vec![EdgeId::Shortcut(1), EdgeId::Shortcut(2)]);
        assert_eq!(g.shortcuts().len(), 2);
    }

    #[test]
    fn overflowing_shortcut_leaves_graph_untouched() {
        let mut g = graph(GraphKind::Undirected, &[(1, 1, 2, 1e308), (2, 2, 3, 1e308)]);

        let stats = LinearContraction::new().contract(&mut g).expect("contract");

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.contracted, 0);
        assert_eq!(stats.shortcuts, 0);
        assert_eq!(g.vertex_ids(), vec![VertexId(1), VertexId(2), VertexId(3)]);
        assert_eq!(g.edge_count(), 2);
        assert!(g.shortcuts().is_empty());
    }

    #[test]
    fn overflow_does_not_consume_shortcut_ids() {
        let mut g = graph(
            GraphKind::Undirected,
            &[(1, 1, 2, 1e308), (2, 2, 3, 1e308), (3, 7, 8, 1.0), (4, 8, 9, 1.0)],
        );

        LinearContraction::new().contract(&mut g).expect("contract");

        let ids: Vec<_> = g.shortcut_edges().map(|e| e.id).collect();
        assert_eq!(ids, vec![EdgeId::Shortcut(1)]);
        assert!(g.contains_vertex(VertexId(2)));
        assert!(!g.contains_vertex(VertexId(8)));
    }

    #[test]
    fn directed_keeps_edges_no_shortcut_replaces() {
        // 1 -> 2 -> 3 plus 3 -> 2; nothing pairs with 3 -> 2
        let mut g = graph(
            GraphKind::Directed,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 2, 1.0)],
        );

        let mut engine = LinearContraction::new();
        engine.set_forbidden_vertices(ids(&[3]));
        let stats = engine.contract(&mut g).expect("contract");

        assert_eq!(stats.shortcuts, 1);
        assert_eq!(stats.contracted, 0);
        assert!(g.has_edge(VertexId(1), VertexId(3)));
        assert!(g.has_edge(VertexId(3), VertexId(2)));
        assert!(!g.has_edge(VertexId(1), VertexId(2)));
        assert!(!g.has_edge(VertexId(2), VertexId(3)));
        assert_eq!(g.vertex_ids(), vec![VertexId(1), VertexId(2), VertexId(3)]);
        assert_eq!(g.edge_count(), 2);
        assert!(!LinearContraction::is_linear(&g, VertexId(2)));
    }

    #[test]
    fn directed_leftover_edge_is_reused_downstream() {
        // as above, but 3 is free: 1 -> 3 -> 2 collapses next
        let mut g = graph(
            GraphKind::Directed,
            &[(1, 1, 2, 1.0), (2, 2, 3, 1.0), (3, 3, 2, 1.0)],
        );

        let stats = LinearContraction::new().contract(&mut g).expect("contract");

        assert_eq!(stats.shortcuts, 2);
        assert_eq!(g.vertex_ids(), vec![VertexId(1), VertexId(2)]);
        let edge = g.min_cost_edge(VertexId(1), VertexId(2)).expect("1 reaches 2");
        assert_eq!(edge.cost, 3.0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn directed_two_way_vertex_is_removed() {
        let records = vec![
            EdgeRecord::new(1, 1, 2, 1.0).with_reverse_cost(1.0),
            EdgeRecord::new(2, 2, 3, 1.0).with_reverse_cost(1.0),
        ];
        let mut g = Graph::from_records(GraphKind::Directed, &records).expect("load");

        let stats = LinearContraction::new().contract(&mut g).expect("contract");

        assert_eq!(stats.contracted, 1);
        assert_eq!(g.vertex_ids(), vec![VertexId(1), VertexId(3)]);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn empty_graph_is_a_noop() {
        let mut g = Graph::new(GraphKind::Directed);
        let stats = LinearContraction::new().contract(&mut g).expect("contract");
        assert_eq!(stats, ContractionStats::default());
    }
}
