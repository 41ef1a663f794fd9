//! Graph data model: the shared registry that owns every parsed entity.
//!
//! One arena per file kind, keyed by unique identifier (uid for scenes and
//! resources, project-relative path for scripts). Handles are stable for
//! the lifetime of a run; the graph only grows, there is no removal. All
//! cross-references resolve through the arenas on demand, which makes
//! "unresolved" a normal graph state instead of a nullable pointer.

use crate::entity::{
    FieldBinding, FieldValue, FileKind, OtherResource, ResourceFile, ResourceId, ResourceRecord,
    SceneFile, SceneId, ScriptFile, ScriptId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The fully cross-referenced project graph handed to the doc generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGraph {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: GraphMetadata,
    /// Arenas in insertion order. Iteration per kind is stable.
    scenes: Vec<SceneFile>,
    resources: Vec<ResourceFile>,
    scripts: Vec<ScriptFile>,
    /// uid → scene handle. Rebuilt on load via `rebuild_indexes()`.
    #[serde(skip)]
    scene_index: HashMap<String, SceneId>,
    /// uid → resource handle. Separate identifier space from scenes.
    #[serde(skip)]
    resource_index: HashMap<String, ResourceId>,
    /// project-relative path → script handle.
    #[serde(skip)]
    script_index: HashMap<PathBuf, ScriptId>,
}

/// Aggregate counts, recomputed by [`ProjectGraph::refresh_metadata`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_scenes: usize,
    pub total_resources: usize,
    pub total_scripts: usize,
    pub total_nodes: usize,
    /// References whose target identifier never appeared in any header pass.
    pub unresolved_references: usize,
}

/// Outcome of an insert-if-absent during a header pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered<Id> {
    /// The identifier was new; the entity now lives in the arena.
    Fresh(Id),
    /// The identifier was already taken. First writer wins: the existing
    /// entity is kept untouched and the new one is dropped.
    Duplicate { kept: Id },
}

impl<Id: Copy> Registered<Id> {
    pub fn id(&self) -> Id {
        match *self {
            Self::Fresh(id) | Self::Duplicate { kept: id } => id,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Resolution outcome for a scene-node field binding.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedField<'g> {
    Scene(&'g SceneFile),
    Script(&'g ScriptFile),
    Resource(&'g ResourceFile),
    Other(&'g OtherResource),
    /// Local sub-resource: id and declared type name.
    SubResource { id: &'g str, type_name: &'g str },
    Unresolved,
}

/// Resolution outcome for a resource-record field value.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedValue<'g> {
    Scene(&'g SceneFile),
    Resource(&'g ResourceFile),
    /// A sub-resource record from the same file.
    Record(&'g ResourceRecord),
    Other { name: &'g str, type_name: &'g str },
    Scalar(&'g str),
    Unresolved,
}

impl ResolvedField<'_> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

impl Default for ProjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectGraph {
    pub const SCHEMA_VERSION: &'static str = "1.0.0";

    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: Self::SCHEMA_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            metadata: GraphMetadata::default(),
            scenes: Vec::new(),
            resources: Vec::new(),
            scripts: Vec::new(),
            scene_index: HashMap::new(),
            resource_index: HashMap::new(),
            script_index: HashMap::new(),
        }
    }

    /// Register a scene under its uid. Insert-if-absent: on collision the
    /// first-registered entity is kept and the caller is told so.
    pub fn insert_scene(&mut self, scene: SceneFile) -> Registered<SceneId> {
        if let Some(&kept) = self.scene_index.get(&scene.uid) {
            return Registered::Duplicate { kept };
        }
        let id = SceneId(self.scenes.len());
        self.scene_index.insert(scene.uid.clone(), id);
        self.scenes.push(scene);
        Registered::Fresh(id)
    }

    /// Register a resource under its uid, same policy as scenes.
    pub fn insert_resource(&mut self, resource: ResourceFile) -> Registered<ResourceId> {
        if let Some(&kept) = self.resource_index.get(&resource.uid) {
            return Registered::Duplicate { kept };
        }
        let id = ResourceId(self.resources.len());
        self.resource_index.insert(resource.uid.clone(), id);
        self.resources.push(resource);
        Registered::Fresh(id)
    }

    /// Register a script under its project-relative path. Paths are unique
    /// within a walk, so scripts cannot collide.
    pub fn insert_script(&mut self, script: ScriptFile) -> ScriptId {
        let id = ScriptId(self.scripts.len());
        self.script_index.insert(script.path.clone(), id);
        self.scripts.push(script);
        id
    }

    pub fn scene(&self, id: SceneId) -> &SceneFile {
        &self.scenes[id.0]
    }

    pub fn scene_mut(&mut self, id: SceneId) -> &mut SceneFile {
        &mut self.scenes[id.0]
    }

    pub fn resource(&self, id: ResourceId) -> &ResourceFile {
        &self.resources[id.0]
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> &mut ResourceFile {
        &mut self.resources[id.0]
    }

    pub fn script(&self, id: ScriptId) -> &ScriptFile {
        &self.scripts[id.0]
    }

    pub fn script_mut(&mut self, id: ScriptId) -> &mut ScriptFile {
        &mut self.scripts[id.0]
    }

    /// Look up a scene by uid. "Not found" is a normal outcome that callers
    /// turn into an unresolved reference, never a parse error.
    pub fn scene_by_uid(&self, uid: &str) -> Option<SceneId> {
        self.scene_index.get(uid).copied()
    }

    pub fn resource_by_uid(&self, uid: &str) -> Option<ResourceId> {
        self.resource_index.get(uid).copied()
    }

    pub fn script_by_path(&self, path: &Path) -> Option<ScriptId> {
        self.script_index.get(path).copied()
    }

    /// All scenes in insertion order.
    pub fn scenes(&self) -> impl Iterator<Item = (SceneId, &SceneFile)> {
        self.scenes.iter().enumerate().map(|(i, s)| (SceneId(i), s))
    }

    /// All resources in insertion order.
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceFile)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    /// All scripts in insertion order.
    pub fn scripts(&self) -> impl Iterator<Item = (ScriptId, &ScriptFile)> {
        self.scripts
            .iter()
            .enumerate()
            .map(|(i, s)| (ScriptId(i), s))
    }

    pub fn script_ids(&self) -> impl Iterator<Item = ScriptId> {
        (0..self.scripts.len()).map(ScriptId)
    }

    /// Resolve a node field binding against the owning scene's declaration
    /// tables and, for weak resource references, against this graph.
    pub fn resolve_scene_field<'g>(
        &'g self,
        scene: &'g SceneFile,
        binding: &FieldBinding,
    ) -> ResolvedField<'g> {
        match binding {
            FieldBinding::ExtResource(id) => {
                if let Some(scene_ref) = scene.packed_scenes.get(id) {
                    return match scene_ref.target {
                        Some(target) => ResolvedField::Scene(self.scene(target)),
                        None => ResolvedField::Unresolved,
                    };
                }
                if let Some(script_ref) = scene.scripts.get(id) {
                    return match script_ref.target {
                        Some(target) => ResolvedField::Script(self.script(target)),
                        None => ResolvedField::Unresolved,
                    };
                }
                if let Some(res_ref) = scene.ext_resources.get(id) {
                    return match self.resource_by_uid(&res_ref.uid) {
                        Some(target) => ResolvedField::Resource(self.resource(target)),
                        None => ResolvedField::Unresolved,
                    };
                }
                if let Some(other) = scene.ext_others.get(id) {
                    return ResolvedField::Other(other);
                }
                ResolvedField::Unresolved
            }
            FieldBinding::SubResource(id) => match scene.sub_resources.get_key_value(id) {
                Some((id, type_name)) => ResolvedField::SubResource { id, type_name },
                None => ResolvedField::Unresolved,
            },
        }
    }

    /// Resolve a resource-record field value. Sub-resource ids resolve only
    /// within the owning file; external uids resolve against the graph.
    pub fn resolve_record_value<'g>(
        &'g self,
        owner: &'g ResourceFile,
        value: &'g FieldValue,
    ) -> ResolvedValue<'g> {
        match value {
            FieldValue::ExtFile { uid, target } => match target {
                FileKind::Scene => match self.scene_by_uid(uid) {
                    Some(id) => ResolvedValue::Scene(self.scene(id)),
                    None => ResolvedValue::Unresolved,
                },
                _ => match self.resource_by_uid(uid) {
                    Some(id) => ResolvedValue::Resource(self.resource(id)),
                    None => ResolvedValue::Unresolved,
                },
            },
            FieldValue::SubResource { id } => match owner.sub_resource(id) {
                Some(record) => ResolvedValue::Record(record),
                None => ResolvedValue::Unresolved,
            },
            FieldValue::Other { name, type_name } => ResolvedValue::Other { name, type_name },
            FieldValue::Scalar { text } => ResolvedValue::Scalar(text),
        }
    }

    /// Recompute aggregate counts, including how many references across the
    /// whole graph remain unresolved. Each dangling identifier counts once:
    /// declaration-table misses are counted per declaration, and node fields
    /// count only when they name an id no declaration table holds, so a
    /// declared-and-bound dangling reference is not counted twice.
    pub fn refresh_metadata(&mut self) {
        let mut unresolved = 0usize;
        let mut total_nodes = 0usize;

        for scene in &self.scenes {
            total_nodes += scene.nodes.len();
            unresolved += scene
                .packed_scenes
                .values()
                .filter(|r| r.target.is_none())
                .count();
            unresolved += scene.scripts.values().filter(|r| r.target.is_none()).count();
            unresolved += scene
                .ext_resources
                .values()
                .filter(|r| !self.resource_index.contains_key(&r.uid))
                .count();
            for node in &scene.nodes {
                for binding in node.fields.values() {
                    let undeclared = match binding {
                        FieldBinding::ExtResource(id) => !scene.declares_ext_resource(id),
                        FieldBinding::SubResource(id) => !scene.sub_resources.contains_key(id),
                    };
                    if undeclared {
                        unresolved += 1;
                    }
                }
            }
        }

        for resource in &self.resources {
            if resource.script.as_ref().is_some_and(|s| s.target.is_none()) {
                unresolved += 1;
            }
            let records = std::iter::once(&resource.record).chain(resource.sub_resources.values());
            for record in records {
                for field in &record.fields {
                    let miss = match &field.value {
                        FieldValue::ExtFile {
                            uid,
                            target: FileKind::Scene,
                        } => !self.scene_index.contains_key(uid),
                        FieldValue::ExtFile { uid, .. } => !self.resource_index.contains_key(uid),
                        FieldValue::SubResource { id } => !resource.sub_resources.contains_key(id),
                        _ => false,
                    };
                    if miss {
                        unresolved += 1;
                    }
                }
            }
        }

        self.metadata = GraphMetadata {
            total_scenes: self.scenes.len(),
            total_resources: self.resources.len(),
            total_scripts: self.scripts.len(),
            total_nodes,
            unresolved_references: unresolved,
        };
        self.updated_at = Utc::now();
    }

    /// Rebuild the uid/path indexes from the arenas. Indexes are not
    /// serialized; call this after deserializing a graph.
    pub fn rebuild_indexes(&mut self) {
        self.scene_index = self
            .scenes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.uid.clone(), SceneId(i)))
            .collect();
        self.resource_index = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.uid.clone(), ResourceId(i)))
            .collect();
        self.script_index = self
            .scripts
            .iter()
            .enumerate()
            .map(|(i, s)| (s.path.clone(), ScriptId(i)))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scene(path: &str, uid: &str) -> SceneFile {
        let mut s = SceneFile::new(PathBuf::from(path));
        s.uid = uid.to_string();
        s
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut graph = ProjectGraph::new();
        let a = graph.insert_scene(scene("a.tscn", "uid://a"));
        assert!(matches!(a, Registered::Fresh(SceneId(0))));
        assert_eq!(graph.scene_by_uid("uid://a"), Some(SceneId(0)));
        assert_eq!(graph.scene_by_uid("uid://missing"), None);
    }

    #[test]
    fn test_collision_keeps_first_writer() {
        let mut graph = ProjectGraph::new();
        graph.insert_scene(scene("first.tscn", "uid://dup"));
        let second = graph.insert_scene(scene("second.tscn", "uid://dup"));
        assert!(second.is_duplicate());
        assert_eq!(second.id(), SceneId(0));
        assert_eq!(graph.scene(SceneId(0)).title, "first");
        assert_eq!(graph.scenes().count(), 1);
    }

    #[test]
    fn test_separate_identifier_spaces() {
        let mut graph = ProjectGraph::new();
        graph.insert_scene(scene("a.tscn", "uid://shared"));
        let mut r = ResourceFile::new(PathBuf::from("a.tres"));
        r.uid = "uid://shared".to_string();
        let reg = graph.insert_resource(r);
        assert!(matches!(reg, Registered::Fresh(ResourceId(0))));
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut graph = ProjectGraph::new();
        for n in ["c", "a", "b"] {
            graph.insert_scene(scene(&format!("{n}.tscn"), &format!("uid://{n}")));
        }
        let titles: Vec<&str> = graph.scenes().map(|(_, s)| s.title.as_str()).collect();
        assert_eq!(titles, ["c", "a", "b"]);
    }
}
