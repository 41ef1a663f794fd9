//! File entity model: the closed set of parsed file kinds and their records.
//!
//! Three kinds of files exist in a project: scenes, resources, and scripts.
//! Each is a concrete struct sharing the [`FileEntity`] capability (path +
//! display title) rather than a class hierarchy. Cross-references between
//! entities are stored as identifier strings plus an optional arena handle;
//! a missing handle is the explicit "unresolved" state, never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Stable handle into the scene arena, assigned at header-pass time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub usize);

/// Stable handle into the resource arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

/// Stable handle into the script arena, assigned at indexing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptId(pub usize);

/// The kind of file a classified path or reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Script,
    Resource,
    Scene,
}

impl FileKind {
    /// Classify a file by extension. Unrecognized extensions return `None`
    /// and are skipped by the indexer.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gd" | "cs" | "gdshader" => Some(Self::Script),
            "tscn" => Some(Self::Scene),
            "tres" => Some(Self::Resource),
            _ => None,
        }
    }
}

/// Shared capability of every parsed file: a project-relative path and a
/// display title derived from the file stem.
pub trait FileEntity {
    fn path(&self) -> &Path;
    fn title(&self) -> &str;
}

fn title_from(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

/// A by-uid reference to a graph-owned scene. `target` is filled during the
/// content pass when the uid was already registered; `None` means the uid
/// never appeared in any header pass (dangling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRef {
    pub uid: String,
    pub target: Option<SceneId>,
}

/// A by-path reference to a graph-owned script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRef {
    pub path: PathBuf,
    pub target: Option<ScriptId>,
}

/// A weak by-uid reference to a resource file, resolved lazily through the
/// graph on demand. Resources are parsed after scenes, so a scene can only
/// hold this deferred form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub uid: String,
    /// Display name (file stem of the declared path).
    pub name: String,
}

/// An external resource the graph does not model: name, type string, and
/// the declared file it points at, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherResource {
    pub name: String,
    pub type_name: String,
    /// Project-relative path of the declared file.
    pub path: PathBuf,
}

/// A field on a scene node bound to a reference expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ref", content = "id", rename_all = "snake_case")]
pub enum FieldBinding {
    /// `ExtResource("id")`, resolved against the scene declaration table.
    ExtResource(String),
    /// `SubResource("id")`, resolved within the same file only.
    SubResource(String),
}

/// One node of a scene's ordered node tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// 0 for the root; otherwise the dot-segment count of the parent path.
    pub depth: usize,
    /// Field name → reference binding. Scalar node properties are not modeled.
    pub fields: BTreeMap<String, FieldBinding>,
}

/// A parsed scene file (`.tscn`).
///
/// Constructed empty at indexing time, given its uid by the header pass,
/// and populated by the content pass. External-resource declarations are
/// split by target kind: packed scenes and scripts carry strong handles,
/// resource references stay weak (by uid), everything else is opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub path: PathBuf,
    pub title: String,
    pub uid: String,
    /// ext id → packed child scene (shared, may repeat across scenes).
    pub packed_scenes: BTreeMap<String, SceneRef>,
    /// ext id → referenced script.
    pub scripts: BTreeMap<String, ScriptRef>,
    /// ext id → weak resource-file reference.
    pub ext_resources: BTreeMap<String, ResourceRef>,
    /// ext id → unmodeled external resource.
    pub ext_others: BTreeMap<String, OtherResource>,
    /// local sub-resource id → type name.
    pub sub_resources: BTreeMap<String, String>,
    /// Node tree in file order.
    pub nodes: Vec<SceneNode>,
}

impl SceneFile {
    pub fn new(path: PathBuf) -> Self {
        let title = title_from(&path);
        Self {
            path,
            title,
            uid: String::new(),
            packed_scenes: BTreeMap::new(),
            scripts: BTreeMap::new(),
            ext_resources: BTreeMap::new(),
            ext_others: BTreeMap::new(),
            sub_resources: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    /// True if the given ext id was declared in this file, in any of the
    /// four declaration tables.
    pub fn declares_ext_resource(&self, id: &str) -> bool {
        self.packed_scenes.contains_key(id)
            || self.scripts.contains_key(id)
            || self.ext_resources.contains_key(id)
            || self.ext_others.contains_key(id)
    }
}

impl FileEntity for SceneFile {
    fn path(&self) -> &Path {
        &self.path
    }
    fn title(&self) -> &str {
        &self.title
    }
}

/// One field of a resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceField {
    pub name: String,
    pub value: FieldValue,
}

/// The value of a resource-record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    /// Reference to an external scene or resource file by uid. Weak:
    /// resolved through the graph on demand, renders as unresolved when
    /// the uid is absent.
    ExtFile { uid: String, target: FileKind },
    /// Reference to a sub-resource declared in the same file.
    SubResource { id: String },
    /// Opaque external resource (name + type string), not further resolved.
    Other { name: String, type_name: String },
    /// Plain scalar literal, stored as written.
    Scalar { text: String },
}

/// A typed record: the primary body of a resource file or one of its
/// nested sub-resources. Fields keep file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub type_name: String,
    pub fields: Vec<ResourceField>,
}

impl ResourceRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// A parsed resource file (`.tres`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub title: String,
    pub uid: String,
    /// Declared script class, if the header names one.
    pub script_class: Option<String>,
    /// Strong reference to the backing script; many resources may share one.
    pub script: Option<ScriptRef>,
    /// The primary record (the `[resource]` section).
    pub record: ResourceRecord,
    /// local id → owned nested record.
    pub sub_resources: BTreeMap<String, ResourceRecord>,
}

impl ResourceFile {
    pub fn new(path: PathBuf) -> Self {
        let title = title_from(&path);
        Self {
            path,
            title,
            uid: String::new(),
            script_class: None,
            script: None,
            record: ResourceRecord::default(),
            sub_resources: BTreeMap::new(),
        }
    }

    /// Resolve a local sub-resource id within this file.
    pub fn sub_resource(&self, id: &str) -> Option<&ResourceRecord> {
        self.sub_resources.get(id)
    }
}

impl FileEntity for ResourceFile {
    fn path(&self) -> &Path {
        &self.path
    }
    fn title(&self) -> &str {
        &self.title
    }
}

/// A (doc comment, declaration) pair as byte ranges into the original
/// source. Ranges avoid duplicating source text; an empty doc range means
/// the declaration had no doc comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub doc: Range<usize>,
    pub code: Range<usize>,
}

/// A function argument: name plus declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub type_name: String,
}

/// A declared function signature with its doc description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub name: String,
    pub args: Vec<Argument>,
    pub return_type: String,
    pub brief: Option<String>,
}

/// A declared variable with its doc description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub type_name: String,
    pub brief: Option<String>,
}

/// An ordered group of variables. The implicit default category has no
/// name and collects variables declared before any category marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCategory {
    pub name: Option<String>,
    pub variables: Vec<Variable>,
}

/// Class metadata derived from a script's declarations and doc comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptClass {
    pub name: Option<String>,
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub brief: Option<String>,
    pub categories: Vec<VariableCategory>,
    pub functions: Vec<FunctionSig>,
}

/// A parsed script file. Scripts are leaves of the cross-reference graph:
/// their metadata is self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub title: String,
    pub snippets: Vec<CodeSnippet>,
    pub class: ScriptClass,
}

impl ScriptFile {
    pub fn new(path: PathBuf) -> Self {
        let title = title_from(&path);
        Self {
            path,
            title,
            snippets: Vec::new(),
            class: ScriptClass::default(),
        }
    }
}

impl FileEntity for ScriptFile {
    fn path(&self) -> &Path {
        &self.path
    }
    fn title(&self) -> &str {
        &self.title
    }
}
