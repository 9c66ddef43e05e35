//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::GraphSource;
use crate::config::Settings;
use graphreduce_core::{
    ContractionStats, Edge, EdgeRecord, Graph, GraphError, GraphStore, Kruskal,
    LinearContraction, MstRow, graph_from_bytes, graph_to_bytes,
    primitives::{MAX_EDGE_RECORDS, MAX_INPUT_FILE_SIZE},
    total_cost,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GraphError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        GraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, GraphError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// LOADING
// =============================================================================

/// Read a JSON edge list.
pub fn load_records(path: &Path) -> Result<Vec<EdgeRecord>, GraphError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;

    let content = std::fs::read_to_string(&path)
        .map_err(|e| GraphError::IoError(format!("Failed to read file: {}", e)))?;
    let records: Vec<EdgeRecord> = serde_json::from_str(&content)
        .map_err(|e| GraphError::InvalidInput(format!("Invalid edge list: {}", e)))?;

    if records.len() > MAX_EDGE_RECORDS {
        return Err(GraphError::InvalidInput(format!(
            "Edge list has {} records, maximum is {}",
            records.len(),
            MAX_EDGE_RECORDS
        )));
    }

    tracing::info!(path = %path.display(), records = records.len(), "edge list read");
    Ok(records)
}

/// Read a snapshot written by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<Graph, GraphError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;

    let bytes = std::fs::read(&path)
        .map_err(|e| GraphError::IoError(format!("Failed to read file: {}", e)))?;
    let graph = graph_from_bytes(&bytes)?;

    tracing::info!(
        path = %path.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "snapshot read"
    );
    Ok(graph)
}

/// Write `graph` as a snapshot file.
pub fn save_snapshot(graph: &Graph, path: &Path) -> Result<(), GraphError> {
    let path = validate_output_path(path)?;
    let bytes = graph_to_bytes(graph)?;

    std::fs::write(&path, &bytes)
        .map_err(|e| GraphError::IoError(format!("Failed to write file: {}", e)))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

/// Load the graph named by `source`.
///
/// Edge lists are built with the configured kind; a snapshot keeps the kind
/// it was saved with.
pub fn load_graph(source: &GraphSource, settings: &Settings) -> Result<Graph, GraphError> {
    match (&source.input, &source.graph) {
        (Some(input), _) => Graph::from_records(settings.kind, &load_records(input)?),
        (None, Some(snapshot)) => {
            let graph = load_snapshot(snapshot)?;
            if graph.kind() != settings.kind {
                tracing::warn!(
                    snapshot = %graph.kind(),
                    requested = %settings.kind,
                    "snapshot kind differs from requested kind, keeping snapshot kind"
                );
            }
            Ok(graph)
        }
        (None, None) => Err(GraphError::InvalidInput(
            "Either --input or --graph is required".to_string(),
        )),
    }
}

// =============================================================================
// JSON RENDERING
// =============================================================================

fn edge_json(edge: &Edge) -> serde_json::Value {
    serde_json::json!({
        "id": edge.id.as_i64(),
        "source": edge.source.value(),
        "target": edge.target.value(),
        "cost": edge.cost,
        "contracted": edge.contracted.iter().map(|v| v.value()).collect::<Vec<_>>(),
    })
}

/// JSON document describing a contraction run.
pub fn contraction_json(graph: &Graph, stats: &ContractionStats) -> serde_json::Value {
    serde_json::json!({
        "kind": graph.kind().to_string(),
        "contracted_vertices": stats.contracted,
        "shortcuts_created": stats.shortcuts,
        "vertex_count": graph.vertex_count(),
        "edge_count": graph.edge_count(),
        "shortcuts": graph.shortcut_edges().map(edge_json).collect::<Vec<_>>(),
        "edges": graph.edges().map(edge_json).collect::<Vec<_>>(),
    })
}

/// JSON document for spanning forest rows, in their flat form.
pub fn mst_json(rows: &[MstRow], settings: &Settings) -> serde_json::Value {
    let rows_json: Vec<_> = rows
        .iter()
        .enumerate()
        .map(|(seq, row)| {
            let (component, source, target, edge, cost, agg_cost) = row.flat();
            serde_json::json!({
                "seq": seq + 1,
                "component": component,
                "source": source,
                "target": target,
                "edge": edge,
                "cost": cost,
                "agg_cost": agg_cost,
            })
        })
        .collect();

    serde_json::json!({
        "order": settings.order.to_string(),
        "total_cost": total_cost(rows),
        "rows": rows_json,
    })
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// CONTRACT COMMAND
// =============================================================================

/// Collapse linear vertices, print the result and optionally save it.
pub fn cmd_contract(
    source: &GraphSource,
    settings: &Settings,
    output: Option<&Path>,
    json_mode: bool,
) -> Result<(), GraphError> {
    let mut graph = load_graph(source, settings)?;
    let vertices_before = graph.vertex_count();

    let mut engine = LinearContraction::new();
    engine.set_forbidden_vertices(settings.forbidden.clone());
    let stats = engine.contract(&mut graph)?;

    if let Some(output) = output {
        save_snapshot(&graph, output)?;
    }

    if json_mode {
        print_json(&contraction_json(&graph, &stats));
        return Ok(());
    }

    println!("Linear Contraction");
    println!("==================");
    println!("Kind:        {}", graph.kind());
    println!("Forbidden:   {}", settings.forbidden);
    println!(
        "Vertices:    {} -> {}",
        vertices_before,
        graph.vertex_count()
    );
    println!("Contracted:  {}", stats.contracted);
    println!("Shortcuts:   {}", stats.shortcuts);
    println!();

    if graph.shortcuts().is_empty() {
        println!("No shortcuts.");
        return Ok(());
    }

    println!(
        "{:>8} {:>10} {:>10} {:>12}  contracted",
        "id", "source", "target", "cost"
    );
    for edge in graph.shortcut_edges() {
        println!(
            "{:>8} {:>10} {:>10} {:>12}  {}",
            edge.id.as_i64(),
            edge.source.value(),
            edge.target.value(),
            edge.cost,
            edge.contracted
        );
    }

    Ok(())
}

// =============================================================================
// MST COMMAND
// =============================================================================

/// Compute and print a minimum spanning forest.
pub fn cmd_mst(source: &GraphSource, settings: &Settings, json_mode: bool) -> Result<(), GraphError> {
    let graph = load_graph(source, settings)?;
    let rows = Kruskal::compute(&graph, settings.order, settings.component);

    if json_mode {
        print_json(&mst_json(&rows, settings));
        return Ok(());
    }

    println!(
        "{:>6} {:>10} {:>10} {:>10} {:>8} {:>12} {:>12}",
        "seq", "component", "source", "target", "edge", "cost", "agg_cost"
    );
    for (seq, row) in rows.iter().enumerate() {
        let (component, source, target, edge, cost, agg_cost) = row.flat();
        println!(
            "{:>6} {:>10} {:>10} {:>10} {:>8} {:>12} {:>12}",
            seq + 1,
            component,
            source,
            target,
            edge,
            cost,
            agg_cost
        );
    }
    println!();
    println!("Total cost: {}", total_cost(&rows));

    Ok(())
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Print graph statistics.
pub fn cmd_info(source: &GraphSource, settings: &Settings, json_mode: bool) -> Result<(), GraphError> {
    let graph = load_graph(source, settings)?;

    let components = Kruskal::components(&graph);
    let mut engine = LinearContraction::new();
    engine.set_forbidden_vertices(settings.forbidden.clone());
    engine.calculate_vertices(&graph);
    let linear = engine.linear_vertices().len();

    if json_mode {
        let output = serde_json::json!({
            "kind": graph.kind().to_string(),
            "vertex_count": graph.vertex_count(),
            "edge_count": graph.edge_count(),
            "shortcut_count": graph.shortcuts().len(),
            "component_count": components.count(),
            "linear_vertices": linear,
            "total_cost": graph.total_cost(),
        });
        print_json(&output);
        return Ok(());
    }

    println!("Graph Info");
    println!("==========");
    println!("Kind:            {}", graph.kind());
    println!("Vertices:        {}", graph.vertex_count());
    println!("Edges:           {}", graph.edge_count());
    println!("Shortcuts:       {}", graph.shortcuts().len());
    println!("Components:      {}", components.count());
    println!("Linear vertices: {}", linear);
    println!("Total cost:      {}", graph.total_cost());

    Ok(())
}
