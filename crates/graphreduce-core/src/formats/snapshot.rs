//! # Snapshot Format
//!
//! Binary form of a graph, used to hand a contracted graph from one command
//! to the next.
//!
//! ```text
//! "GRDC" | version (u8) | postcard(SerializableGraph)
//! ```
//!
//! Decoding rejects oversized input, a foreign header, trailing bytes after
//! the payload, and payloads that do not describe a consistent graph (edge
//! endpoints missing from the vertex list, live shortcut ids with no edge,
//! costs that are negative or not finite).

use crate::graph::SerializableGraph;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_INPUT_FILE_SIZE};
use crate::{Graph, GraphError, GraphStore};

fn corrupt(reason: impl Into<String>) -> GraphError {
    GraphError::SerializationError(reason.into())
}

/// Encode `graph` with its kind, vertices in id order, edges in insertion
/// order and the live shortcut list.
pub fn graph_to_bytes(graph: &Graph) -> Result<Vec<u8>, GraphError> {
    let mut bytes = MAGIC_BYTES.to_vec();
    bytes.push(FORMAT_VERSION);

    postcard::to_extend(&SerializableGraph::from(graph), bytes)
        .map_err(|e| corrupt(format!("cannot encode graph: {e}")))
}

/// Decode a graph written by [`graph_to_bytes`].
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Graph, GraphError> {
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_INPUT_FILE_SIZE {
        return Err(corrupt(format!(
            "snapshot of {} bytes exceeds the {MAX_INPUT_FILE_SIZE} byte limit",
            bytes.len()
        )));
    }

    let payload = strip_header(bytes)?;
    let (graph, rest): (SerializableGraph, _) = postcard::take_from_bytes(payload)
        .map_err(|e| corrupt(format!("cannot decode graph: {e}")))?;
    if !rest.is_empty() {
        return Err(corrupt(format!("{} trailing bytes after graph", rest.len())));
    }

    let graph = Graph::try_from(graph)?;
    tracing::debug!(
        vertices = graph.vertex_count(),
        shortcuts = graph.shortcut_edges().count(),
        "snapshot decoded"
    );
    Ok(graph)
}

/// Check magic and version, returning the payload that follows them.
fn strip_header(bytes: &[u8]) -> Result<&[u8], GraphError> {
    let Some((magic, rest)) = bytes.split_first_chunk::<4>() else {
        return Err(corrupt("not a graph snapshot: too short"));
    };
    if magic != MAGIC_BYTES {
        return Err(corrupt("not a graph snapshot: bad magic"));
    }
    match rest.split_first() {
        Some((&FORMAT_VERSION, payload)) => Ok(payload),
        Some((version, _)) => Err(corrupt(format!(
            "snapshot version {version} is not supported (expected {FORMAT_VERSION})"
        ))),
        None => Err(corrupt("not a graph snapshot: missing version")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Edge, EdgeId, EdgeRecord, GraphKind, Identifiers, LinearContraction, VertexId,
    };

    fn contracted_chain(kind: GraphKind) -> Graph {
        let records = vec![
            EdgeRecord::new(1, 1, 2, 1.0),
            EdgeRecord::new(2, 2, 3, 2.0),
            EdgeRecord::new(3, 3, 4, 3.0),
            EdgeRecord::new(4, 3, 5, 3.0),
        ];
        let mut graph = Graph::from_records(kind, &records).expect("load");
        LinearContraction::new().contract(&mut graph).expect("contract");
        graph
    }

    /// Encode a hand-built payload behind a valid header.
    fn encode(graph: &SerializableGraph) -> Vec<u8> {
        let mut bytes = MAGIC_BYTES.to_vec();
        bytes.push(FORMAT_VERSION);
        postcard::to_extend(graph, bytes).expect("encode")
    }

    #[test]
    fn save_load_save_is_stable() {
        let graph = contracted_chain(GraphKind::Undirected);

        let first = graph_to_bytes(&graph).expect("save");
        let second = graph_to_bytes(&graph_from_bytes(&first).expect("load")).expect("save");

        assert_eq!(first, second);
        assert_eq!(&first[..4], MAGIC_BYTES);
        assert_eq!(first[4], FORMAT_VERSION);
    }

    #[test]
    fn shortcuts_and_kind_survive() {
        let graph = contracted_chain(GraphKind::Directed);
        let restored = graph_from_bytes(&graph_to_bytes(&graph).expect("save")).expect("load");

        assert_eq!(restored.kind(), GraphKind::Directed);
        assert_eq!(restored.shortcuts(), graph.shortcuts());
        let shortcut = restored.shortcut_edges().next().expect("shortcut");
        assert_eq!(shortcut.cost, 3.0);
        assert_eq!(shortcut.contracted.to_vec(), vec![VertexId(2)]);
    }

    #[test]
    fn foreign_header_rejected() {
        let mut bytes = graph_to_bytes(&contracted_chain(GraphKind::Undirected)).expect("save");
        bytes[..4].copy_from_slice(b"XXXX");

        assert!(matches!(
            graph_from_bytes(&bytes),
            Err(GraphError::SerializationError(_))
        ));
    }

    #[test]
    fn newer_version_rejected() {
        let mut bytes = graph_to_bytes(&contracted_chain(GraphKind::Undirected)).expect("save");
        bytes[4] = FORMAT_VERSION.wrapping_add(1);

        assert!(matches!(
            graph_from_bytes(&bytes),
            Err(GraphError::SerializationError(_))
        ));
    }

    #[test]
    fn short_input_rejected() {
        assert!(graph_from_bytes(b"GRD").is_err());
        assert!(graph_from_bytes(MAGIC_BYTES).is_err());
        assert!(graph_from_bytes(b"GRDC\x01").is_err());
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = graph_to_bytes(&contracted_chain(GraphKind::Undirected)).expect("save");
        bytes.push(0);

        assert!(matches!(
            graph_from_bytes(&bytes),
            Err(GraphError::SerializationError(_))
        ));
    }

    #[test]
    fn edge_to_unlisted_vertex_rejected() {
        let payload = SerializableGraph {
            kind: GraphKind::Undirected,
            vertices: vec![VertexId(1)],
            edges: vec![Edge::new(1, VertexId(1), VertexId(2), 1.0)],
            shortcuts: Vec::new(),
        };

        assert!(matches!(
            graph_from_bytes(&encode(&payload)),
            Err(GraphError::SerializationError(_))
        ));
    }

    #[test]
    fn live_shortcut_without_edge_rejected() {
        let payload = SerializableGraph {
            kind: GraphKind::Undirected,
            vertices: vec![VertexId(1), VertexId(2)],
            edges: vec![Edge::new(1, VertexId(1), VertexId(2), 1.0)],
            shortcuts: vec![EdgeId::Shortcut(3)],
        };

        assert!(matches!(
            graph_from_bytes(&encode(&payload)),
            Err(GraphError::SerializationError(_))
        ));
    }

    #[test]
    fn infinite_cost_rejected() {
        let payload = SerializableGraph {
            kind: GraphKind::Directed,
            vertices: vec![VertexId(1), VertexId(3)],
            edges: vec![Edge::shortcut(
                1,
                VertexId(1),
                VertexId(3),
                f64::INFINITY,
                Identifiers::new(),
            )],
            shortcuts: vec![EdgeId::Shortcut(1)],
        };

        assert!(matches!(
            graph_from_bytes(&encode(&payload)),
            Err(GraphError::InvalidCost { edge: -1, .. })
        ));
    }
}
