//! The ordered build pipeline.
//!
//! Phases run strictly in sequence: index the tree, register every script
//! by path, run every scene header pass, then every scene content pass,
//! then the resource header and content passes, and parse scripts last.
//! Completing all header passes before any content pass is what makes
//! cross-references independent of file-discovery order. Scene and
//! resource grammar failures abort the run; script parsing and reference
//! resolution never do.

use crate::indexer::{self, DiscoveredFile, FileIndex};
use sgraph_core::config::SgraphConfig;
use sgraph_core::entity::{ResourceFile, ResourceId, SceneFile, SceneId, ScriptFile};
use sgraph_core::error::{BuildError, Phase};
use sgraph_core::graph::ProjectGraph;
use sgraph_parser::{ParseError, resource, scene, script};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Build the project graph for the tree rooted at `root`.
pub fn build(root: &Path, config: &SgraphConfig) -> Result<ProjectGraph, BuildError> {
    if !root.is_dir() {
        return Err(BuildError::InvalidRoot(root.to_path_buf()));
    }

    let index = indexer::index(root, &config.index);
    info!(files = index.total(), "building project graph");

    let mut graph = ProjectGraph::new();
    register_scripts(&mut graph, &index);
    let scenes = scene_header_pass(&mut graph, &index)?;
    scene_content_pass(&mut graph, &scenes)?;
    let resources = resource_header_pass(&mut graph, &index)?;
    resource_content_pass(&mut graph, &resources)?;
    script_pass(&mut graph, &index);

    graph.refresh_metadata();
    info!(
        scenes = graph.metadata.total_scenes,
        resources = graph.metadata.total_resources,
        scripts = graph.metadata.total_scripts,
        unresolved = graph.metadata.unresolved_references,
        "project graph complete"
    );
    Ok(graph)
}

/// A file that survived its header pass and is awaiting its content pass.
struct Pending<Id> {
    id: Id,
    source: String,
    rel: PathBuf,
}

fn malformed(file: &DiscoveredFile, phase: Phase, err: ParseError) -> BuildError {
    BuildError::MalformedFile {
        file: file.rel.clone(),
        phase,
        line: err.line,
        reason: err.kind.to_string(),
    }
}

fn read(file: &DiscoveredFile) -> Result<String, BuildError> {
    std::fs::read_to_string(&file.abs).map_err(|source| BuildError::Io {
        file: file.rel.clone(),
        source,
    })
}

/// Scripts are registered before anything else so scene and resource
/// passes can bind strong script references by path.
fn register_scripts(graph: &mut ProjectGraph, index: &FileIndex) {
    for file in &index.scripts {
        graph.insert_script(ScriptFile::new(file.rel.clone()));
    }
}

/// Header pass over every scene: each file is read once here and its
/// source retained for the content pass. A uid collision keeps the first
/// registration and drops the newcomer entirely.
fn scene_header_pass(
    graph: &mut ProjectGraph,
    index: &FileIndex,
) -> Result<Vec<Pending<SceneId>>, BuildError> {
    let mut pending = Vec::with_capacity(index.scenes.len());
    for file in &index.scenes {
        let source = read(file)?;
        let uid = scene::parse_header(&source)
            .map_err(|e| malformed(file, Phase::SceneHeader, e))?;
        let mut entity = SceneFile::new(file.rel.clone());
        entity.uid = uid;
        let registered = graph.insert_scene(entity);
        if registered.is_duplicate() {
            let kept = graph.scene(registered.id());
            warn!(
                uid = %kept.uid,
                kept = %kept.path.display(),
                dropped = %file.rel.display(),
                "duplicate scene uid, keeping first registration"
            );
            continue;
        }
        pending.push(Pending {
            id: registered.id(),
            source,
            rel: file.rel.clone(),
        });
    }
    Ok(pending)
}

fn scene_content_pass(
    graph: &mut ProjectGraph,
    scenes: &[Pending<SceneId>],
) -> Result<(), BuildError> {
    for pending in scenes {
        let content =
            scene::parse_content(&pending.source, graph).map_err(|e| BuildError::MalformedFile {
                file: pending.rel.clone(),
                phase: Phase::SceneContent,
                line: e.line,
                reason: e.kind.to_string(),
            })?;
        content.apply(graph.scene_mut(pending.id));
    }
    Ok(())
}

/// Header pass over every resource. Script bindings resolve here because
/// the script arena is already complete.
fn resource_header_pass(
    graph: &mut ProjectGraph,
    index: &FileIndex,
) -> Result<Vec<Pending<ResourceId>>, BuildError> {
    let mut pending = Vec::with_capacity(index.resources.len());
    for file in &index.resources {
        let source = read(file)?;
        let header = resource::parse_header(&source, graph)
            .map_err(|e| malformed(file, Phase::ResourceHeader, e))?;
        let mut entity = ResourceFile::new(file.rel.clone());
        header.apply(&mut entity);
        let registered = graph.insert_resource(entity);
        if registered.is_duplicate() {
            let kept = graph.resource(registered.id());
            warn!(
                uid = %kept.uid,
                kept = %kept.path.display(),
                dropped = %file.rel.display(),
                "duplicate resource uid, keeping first registration"
            );
            continue;
        }
        pending.push(Pending {
            id: registered.id(),
            source,
            rel: file.rel.clone(),
        });
    }
    Ok(pending)
}

fn resource_content_pass(
    graph: &mut ProjectGraph,
    resources: &[Pending<ResourceId>],
) -> Result<(), BuildError> {
    for pending in resources {
        let content =
            resource::parse_content(&pending.source).map_err(|e| BuildError::MalformedFile {
                file: pending.rel.clone(),
                phase: Phase::ResourceContent,
                line: e.line,
                reason: e.kind.to_string(),
            })?;
        content.apply(graph.resource_mut(pending.id));
    }
    Ok(())
}

/// Scripts are parsed last and best-effort: an unreadable file is logged
/// and its entity stays empty, never failing the run.
fn script_pass(graph: &mut ProjectGraph, index: &FileIndex) {
    let ids: Vec<_> = graph.script_ids().collect();
    for (id, file) in ids.into_iter().zip(&index.scripts) {
        let source = match std::fs::read_to_string(&file.abs) {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %file.rel.display(), "skipping unreadable script: {err}");
                continue;
            }
        };
        let (snippets, class) = script::parse(&source);
        let entity = graph.script_mut(id);
        entity.snippets = snippets;
        entity.class = class;
    }
}
