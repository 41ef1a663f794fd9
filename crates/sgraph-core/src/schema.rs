//! JSON export/import and version handling for project graphs.

use crate::graph::ProjectGraph;
use anyhow::{Context, Result};

/// Validate a graph's schema version.
pub fn validate_version(graph: &ProjectGraph) -> Result<()> {
    if graph.version != ProjectGraph::SCHEMA_VERSION {
        anyhow::bail!(
            "graph schema version mismatch: expected {}, found {}",
            ProjectGraph::SCHEMA_VERSION,
            graph.version
        );
    }
    Ok(())
}

/// Serialize a graph to a pretty-printed JSON string.
pub fn to_json(graph: &ProjectGraph) -> Result<String> {
    serde_json::to_string_pretty(graph).context("failed to serialize project graph to JSON")
}

/// Deserialize a graph from a JSON string, rebuilding its lookup indexes.
pub fn from_json(json: &str) -> Result<ProjectGraph> {
    let mut graph: ProjectGraph =
        serde_json::from_str(json).context("failed to deserialize project graph from JSON")?;
    validate_version(&graph)?;
    graph.rebuild_indexes();
    Ok(graph)
}
