//! Read/write project graph files from disk.

use crate::graph::ProjectGraph;
use crate::schema;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SGRAPH_DIR: &str = ".sgraph";
const GRAPH_FILE: &str = "graph.json";

/// Get the path to the sgraph directory for a given project root.
pub fn sgraph_dir(project_root: &Path) -> PathBuf {
    project_root.join(SGRAPH_DIR)
}

/// Get the path to the graph file for a given project root.
pub fn graph_file(project_root: &Path) -> PathBuf {
    sgraph_dir(project_root).join(GRAPH_FILE)
}

/// Check if a saved graph exists for the given project root.
pub fn graph_exists(project_root: &Path) -> bool {
    graph_file(project_root).exists()
}

/// Load a graph from disk.
pub fn load(project_root: &Path) -> Result<ProjectGraph> {
    let path = graph_file(project_root);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read graph from {}", path.display()))?;
    schema::from_json(&json)
}

/// Save a graph to disk, creating the .sgraph directory if needed.
pub fn save(project_root: &Path, graph: &ProjectGraph) -> Result<()> {
    let dir = sgraph_dir(project_root);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create graph directory {}", dir.display()))?;

    let path = graph_file(project_root);
    let json = schema::to_json(graph)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write graph to {}", path.display()))?;

    Ok(())
}
