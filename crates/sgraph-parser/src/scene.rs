//! Two-pass scene file parser.
//!
//! The header pass extracts only the scene's own uid so it can be
//! registered before any content pass runs anywhere; the content pass
//! re-scans the file and resolves every outbound reference against the
//! graph. Running all header passes before any content pass makes forward
//! references independent of file-discovery order.

use crate::section::{
    Event, ParseError, ParseErrorKind, SectionHeader, SectionReader, Value,
};
use sgraph_core::entity::{
    FieldBinding, OtherResource, ResourceRef, SceneFile, SceneNode, SceneRef, ScriptRef,
};
use sgraph_core::graph::ProjectGraph;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub(crate) const SCENE_HEADER_TAG: &str = "gd_scene";

/// Turn a declared `res://` path into a project-relative one.
pub(crate) fn project_relative(raw: &str) -> PathBuf {
    PathBuf::from(raw.strip_prefix("res://").unwrap_or(raw))
}

/// Display name for an external declaration: the file stem of its path,
/// falling back to the local id.
pub(crate) fn display_name(header: &SectionHeader, id: &str) -> String {
    header
        .attr("path")
        .map(project_relative)
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| id.to_string())
}

/// Depth of a node from its declared parent path: no parent means root
/// (depth 0), the root designator `.` means depth 1, otherwise each
/// dot-separated segment adds one level.
pub fn node_depth(parent: Option<&str>) -> usize {
    match parent {
        None => 0,
        Some(".") => 1,
        Some(path) => path.split('.').count(),
    }
}

/// Header pass: extract the scene's uid. Fails if the `gd_scene` section
/// or its uid is missing or malformed.
pub fn parse_header(source: &str) -> Result<String, ParseError> {
    let mut reader = SectionReader::new(source);
    while let Some(event) = reader.next_event()? {
        if let Event::Section(header) = event
            && header.tag == SCENE_HEADER_TAG
        {
            return Ok(header.require_attr("uid")?.to_string());
        }
    }
    Err(ParseError {
        line: 1,
        kind: ParseErrorKind::MissingHeader(SCENE_HEADER_TAG),
    })
}

/// Everything the content pass produces, applied onto the graph-owned
/// scene entity once parsing succeeds.
#[derive(Debug, Default)]
pub struct SceneContent {
    pub packed_scenes: BTreeMap<String, SceneRef>,
    pub scripts: BTreeMap<String, ScriptRef>,
    pub ext_resources: BTreeMap<String, ResourceRef>,
    pub ext_others: BTreeMap<String, OtherResource>,
    pub sub_resources: BTreeMap<String, String>,
    pub nodes: Vec<SceneNode>,
}

impl SceneContent {
    pub fn apply(self, scene: &mut SceneFile) {
        scene.packed_scenes = self.packed_scenes;
        scene.scripts = self.scripts;
        scene.ext_resources = self.ext_resources;
        scene.ext_others = self.ext_others;
        scene.sub_resources = self.sub_resources;
        scene.nodes = self.nodes;
    }
}

/// Which section the reader is currently inside.
enum Cursor {
    Other,
    Node(usize),
}

/// Content pass: resolve every external-resource declaration against the
/// graph and record the node tree. Scene and script targets become shared
/// handles; resource targets stay weak by uid; unknown types stay opaque.
pub fn parse_content(source: &str, graph: &ProjectGraph) -> Result<SceneContent, ParseError> {
    let mut content = SceneContent::default();
    let mut cursor = Cursor::Other;

    let mut reader = SectionReader::new(source);
    while let Some(event) = reader.next_event()? {
        match event {
            Event::Section(header) => {
                cursor = Cursor::Other;
                match header.tag.as_str() {
                    "ext_resource" => declare_ext_resource(&header, graph, &mut content)?,
                    "sub_resource" => {
                        let id = header.require_attr("id")?.to_string();
                        let type_name = header.require_attr("type")?.to_string();
                        content.sub_resources.insert(id, type_name);
                    }
                    "node" => {
                        let name = header.require_attr("name")?.to_string();
                        let depth = node_depth(header.attr("parent"));
                        content.nodes.push(SceneNode {
                            name,
                            depth,
                            fields: BTreeMap::new(),
                        });
                        cursor = Cursor::Node(content.nodes.len() - 1);
                    }
                    // gd_scene, connection, editable: nothing to record.
                    _ => {}
                }
            }
            Event::Assignment(assignment) => {
                if let Cursor::Node(index) = cursor {
                    let binding = match assignment.value {
                        Value::ExtResource(id) => Some(FieldBinding::ExtResource(id)),
                        Value::SubResource(id) => Some(FieldBinding::SubResource(id)),
                        Value::Scalar(_) => None,
                    };
                    if let Some(binding) = binding {
                        content.nodes[index].fields.insert(assignment.key, binding);
                    }
                }
            }
        }
    }

    Ok(content)
}

fn declare_ext_resource(
    header: &SectionHeader,
    graph: &ProjectGraph,
    content: &mut SceneContent,
) -> Result<(), ParseError> {
    let id = header.require_attr("id")?.to_string();
    let type_name = header.require_attr("type")?;

    match type_name {
        "PackedScene" => {
            let uid = header.require_attr("uid")?.to_string();
            let target = graph.scene_by_uid(&uid);
            content.packed_scenes.insert(id, SceneRef { uid, target });
        }
        "Script" => {
            let path = project_relative(header.require_attr("path")?);
            let target = graph.script_by_path(&path);
            content.scripts.insert(id, ScriptRef { path, target });
        }
        _ => {
            let name = display_name(header, &id);
            // A uid marks a resource file the graph may model; anything
            // else stays opaque.
            if let Some(uid) = header.attr("uid") {
                content.ext_resources.insert(
                    id,
                    ResourceRef {
                        uid: uid.to_string(),
                        name,
                    },
                );
            } else {
                let path = header
                    .attr("path")
                    .map(project_relative)
                    .unwrap_or_default();
                content.ext_others.insert(
                    id,
                    OtherResource {
                        name,
                        type_name: type_name.to_string(),
                        path,
                    },
                );
            }
        }
    }
    Ok(())
}
