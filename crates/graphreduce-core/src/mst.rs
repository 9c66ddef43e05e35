//! # Minimum Spanning Forest
//!
//! Kruskal's algorithm over a [`GraphStore`], with optional component
//! labelling and three result orderings.
//!
//! - Edges are taken in non-decreasing cost order (stable, so equal costs
//!   keep insertion order) and accepted when they join two different
//!   union-find classes. Edge direction is ignored.
//! - Components are labelled by their smallest vertex id.
//! - `DepthFirst` and `BreadthFirst` re-walk the accepted edges only and add
//!   a running `agg_cost`: the cost of the tree path from the walk's root.
//!   A synthetic root row (no source, no edge) opens each walk.
//!
//! Every call builds its rows from scratch; nothing is kept between calls.

use crate::graph::GraphStore;
use crate::union_find::DisjointSet;
use crate::{Edge, EdgeId, GraphError, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ORDERING
// =============================================================================

/// How result rows are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Acceptance order, no aggregated cost.
    #[default]
    Unordered,
    /// Depth-first walk of the forest.
    DepthFirst,
    /// One breadth-first walk per component, rooted at its representative.
    BreadthFirst,
}

impl TryFrom<i64> for OrderBy {
    type Error = GraphError;

    fn try_from(selector: i64) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(Self::Unordered),
            1 => Ok(Self::DepthFirst),
            2 => Ok(Self::BreadthFirst),
            other => Err(GraphError::InvalidOrder(other)),
        }
    }
}

impl FromStr for OrderBy {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "unordered" => Ok(Self::Unordered),
            "dfs" | "depth" => Ok(Self::DepthFirst),
            "bfs" | "breadth" => Ok(Self::BreadthFirst),
            other => other
                .parse::<i64>()
                .map_err(|_| GraphError::InvalidInput(format!("Unknown order: {}", s)))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unordered => f.write_str("none"),
            Self::DepthFirst => f.write_str("dfs"),
            Self::BreadthFirst => f.write_str("bfs"),
        }
    }
}

// =============================================================================
// RESULT ROWS
// =============================================================================

/// One row of a spanning forest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MstRow {
    /// Component representative, `None` when labelling was not requested.
    pub component: Option<VertexId>,
    /// Tree parent, `None` on root rows.
    pub source: Option<VertexId>,
    pub target: VertexId,
    /// `None` on root rows.
    pub edge: Option<EdgeId>,
    pub cost: f64,
    pub agg_cost: f64,
}

impl MstRow {
    /// Sentinel used for missing ids in the flat form.
    pub const SENTINEL: i64 = -1;

    /// Whether this is a synthetic root row.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.edge.is_none()
    }

    /// Flat form: `(component, source, target, edge, cost, agg_cost)`.
    ///
    /// A missing component is `0`; a missing source or edge is `-1`.
    #[must_use]
    pub fn flat(&self) -> (i64, i64, i64, i64, f64, f64) {
        (
            self.component.map_or(0, VertexId::value),
            self.source.map_or(Self::SENTINEL, VertexId::value),
            self.target.value(),
            self.edge.map_or(Self::SENTINEL, EdgeId::as_i64),
            self.cost,
            self.agg_cost,
        )
    }
}

/// Sum of the edge costs in `rows` (root rows contribute nothing).
#[must_use]
pub fn total_cost(rows: &[MstRow]) -> f64 {
    rows.iter().map(|row| row.cost).sum()
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Connected components of a graph.
///
/// Component indices follow ascending representative id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Components {
    labels: BTreeMap<VertexId, usize>,
    representatives: Vec<VertexId>,
}

impl Components {
    /// Number of components.
    #[must_use]
    pub fn count(&self) -> usize {
        self.representatives.len()
    }

    /// Component index of `v`.
    #[must_use]
    pub fn component_of(&self, v: VertexId) -> Option<usize> {
        self.labels.get(&v).copied()
    }

    /// Smallest vertex id in `v`'s component.
    #[must_use]
    pub fn representative(&self, v: VertexId) -> Option<VertexId> {
        self.component_of(v)
            .and_then(|c| self.representatives.get(c).copied())
    }

    /// Representatives in component order.
    #[must_use]
    pub fn representatives(&self) -> &[VertexId] {
        &self.representatives
    }
}

// =============================================================================
// KRUSKAL
// =============================================================================

/// A tree edge as visited by a walk: `source` is the parent.
struct TreeEdge<'g> {
    source: VertexId,
    target: VertexId,
    edge: &'g Edge,
}

/// Dense view of a graph: vertices in ascending id order plus edges in
/// insertion order.
struct Dense<'g> {
    vertices: Vec<VertexId>,
    index: BTreeMap<VertexId, usize>,
    edges: Vec<&'g Edge>,
}

impl<'g> Dense<'g> {
    fn new<G: GraphStore>(graph: &'g G) -> Self {
        let vertices = graph.vertex_ids();
        let index = vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        Self {
            vertices,
            index,
            edges: graph.edges().collect(),
        }
    }

    fn endpoints(&self, edge: &Edge) -> Option<(usize, usize)> {
        Some((*self.index.get(&edge.source)?, *self.index.get(&edge.target)?))
    }

    /// Positions (into `edges`) of the accepted edges, in acceptance order.
    fn spanning_forest(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.edges.len()).collect();
        order.sort_by(|&a, &b| self.edges[a].cost.total_cmp(&self.edges[b].cost));

        let mut sets = DisjointSet::new(self.vertices.len());
        let mut tree = Vec::with_capacity(self.vertices.len().saturating_sub(1));
        for pos in order {
            let Some((s, t)) = self.endpoints(self.edges[pos]) else {
                continue;
            };
            if sets.union(s, t) {
                tree.push(pos);
            }
        }
        tree
    }

    fn components(&self) -> Components {
        let mut sets = DisjointSet::new(self.vertices.len());
        for edge in &self.edges {
            if let Some((s, t)) = self.endpoints(edge) {
                sets.union(s, t);
            }
        }

        // Ascending vertex order: the first member met is the smallest id.
        let mut by_root: BTreeMap<usize, usize> = BTreeMap::new();
        let mut components = Components::default();
        for (i, &v) in self.vertices.iter().enumerate() {
            let root = sets.find(i);
            let next = components.representatives.len();
            let label = *by_root.entry(root).or_insert(next);
            if label == next {
                components.representatives.push(v);
            }
            components.labels.insert(v, label);
        }
        components
    }

    /// Tree-only adjacency; neighbours follow edge insertion order.
    fn tree_adjacency(&self, tree: &[usize]) -> Vec<Vec<(usize, usize)>> {
        let mut in_tree = vec![false; self.edges.len()];
        for &pos in tree {
            in_tree[pos] = true;
        }

        let mut adjacency = vec![Vec::new(); self.vertices.len()];
        for (pos, edge) in self.edges.iter().enumerate() {
            if !in_tree[pos] {
                continue;
            }
            if let Some((s, t)) = self.endpoints(edge) {
                adjacency[s].push((t, pos));
                adjacency[t].push((s, pos));
            }
        }
        adjacency
    }

    fn tree_edge(&self, parent: usize, child: usize, pos: usize) -> TreeEdge<'g> {
        TreeEdge {
            source: self.vertices[parent],
            target: self.vertices[child],
            edge: self.edges[pos],
        }
    }

    /// Depth-first walk over the forest, restarting from every unvisited
    /// vertex in ascending id order.
    fn depth_first(&self, adjacency: &[Vec<(usize, usize)>]) -> Vec<TreeEdge<'g>> {
        let mut visited = vec![false; self.vertices.len()];
        let mut walk = Vec::new();

        for start in 0..self.vertices.len() {
            if visited[start] {
                continue;
            }
            visited[start] = true;

            // (vertex, next neighbour to look at)
            let mut stack = vec![(start, 0usize)];
            while let Some(top) = stack.last_mut() {
                let (u, cursor) = *top;
                let Some(&(w, pos)) = adjacency[u].get(cursor) else {
                    stack.pop();
                    continue;
                };
                top.1 = cursor.saturating_add(1);
                if !visited[w] {
                    visited[w] = true;
                    walk.push(self.tree_edge(u, w, pos));
                    stack.push((w, 0));
                }
            }
        }
        walk
    }

    /// One breadth-first walk per root, concatenated.
    fn breadth_first(
        &self,
        adjacency: &[Vec<(usize, usize)>],
        roots: &[VertexId],
    ) -> Vec<TreeEdge<'g>> {
        let mut visited = vec![false; self.vertices.len()];
        let mut walk = Vec::new();

        for root in roots {
            let Some(&start) = self.index.get(root) else {
                continue;
            };
            if visited[start] {
                continue;
            }
            visited[start] = true;

            let mut queue = VecDeque::from([start]);
            while let Some(u) = queue.pop_front() {
                for &(w, pos) in &adjacency[u] {
                    if !visited[w] {
                        visited[w] = true;
                        walk.push(self.tree_edge(u, w, pos));
                        queue.push_back(w);
                    }
                }
            }
        }
        walk
    }
}

/// Kruskal minimum spanning forest.
pub struct Kruskal;

impl Kruskal {
    /// Compute the minimum spanning forest of `graph` as result rows.
    ///
    /// `get_component` is forced on for [`OrderBy::BreadthFirst`], whose
    /// walks start at the component representatives.
    pub fn compute<G: GraphStore>(graph: &G, order_by: OrderBy, get_component: bool) -> Vec<MstRow> {
        let get_component = get_component || order_by == OrderBy::BreadthFirst;

        let dense = Dense::new(graph);
        let tree = dense.spanning_forest();
        let components = get_component.then(|| dense.components());

        tracing::debug!(
            vertices = dense.vertices.len(),
            edges = dense.edges.len(),
            tree_edges = tree.len(),
            components = components.as_ref().map(Components::count),
            %order_by,
            "spanning forest selected"
        );

        let label = |v: VertexId| {
            components
                .as_ref()
                .and_then(|components| components.representative(v))
        };

        let walk = match order_by {
            OrderBy::Unordered => {
                return tree
                    .iter()
                    .map(|&pos| {
                        let edge = dense.edges[pos];
                        MstRow {
                            component: label(edge.source),
                            source: Some(edge.source),
                            target: edge.target,
                            edge: Some(edge.id),
                            cost: edge.cost,
                            agg_cost: 0.0,
                        }
                    })
                    .collect();
            }
            OrderBy::DepthFirst => dense.depth_first(&dense.tree_adjacency(&tree)),
            OrderBy::BreadthFirst => {
                let roots = components
                    .as_ref()
                    .map(|c| c.representatives().to_vec())
                    .unwrap_or_default();
                dense.breadth_first(&dense.tree_adjacency(&tree), &roots)
            }
        };

        Self::with_agg_cost(&dense, &walk, label)
    }

    /// Accepted edges only, in acceptance order.
    pub fn spanning_forest<G: GraphStore>(graph: &G) -> Vec<&Edge> {
        let dense = Dense::new(graph);
        dense
            .spanning_forest()
            .into_iter()
            .map(|pos| dense.edges[pos])
            .collect()
    }

    /// Connected components of the full graph.
    pub fn components<G: GraphStore>(graph: &G) -> Components {
        Dense::new(graph).components()
    }

    /// Turn a walk into rows carrying the running distance from its root.
    fn with_agg_cost(
        dense: &Dense<'_>,
        walk: &[TreeEdge<'_>],
        label: impl Fn(VertexId) -> Option<VertexId>,
    ) -> Vec<MstRow> {
        let mut distance: Vec<Option<f64>> = vec![None; dense.vertices.len()];
        let mut rows = Vec::with_capacity(walk.len().saturating_mul(2));

        for step in walk {
            let (Some(&s), Some(&t)) = (dense.index.get(&step.source), dense.index.get(&step.target))
            else {
                continue;
            };
            let component = label(step.source);

            let from_root = match distance[s] {
                Some(d) => d,
                None => {
                    rows.push(MstRow {
                        component,
                        source: None,
                        target: step.source,
                        edge: None,
                        cost: 0.0,
                        agg_cost: 0.0,
                    });
                    distance[s] = Some(0.0);
                    0.0
                }
            };

            let agg_cost = from_root + step.edge.cost;
            distance[t] = Some(agg_cost);
            rows.push(MstRow {
                component,
                source: Some(step.source),
                target: step.target,
                edge: Some(step.edge.id),
                cost: step.edge.cost,
                agg_cost,
            });
        }
        rows
    }
}

// =============================================================================
// TESTS
// =============================================================================
