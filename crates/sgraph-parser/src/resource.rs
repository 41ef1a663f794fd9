//! Two-pass resource file parser, symmetric with the scene parser.
//!
//! The header pass extracts the file's uid, declared type, and script
//! class, and binds the backing script (the script map is complete by the
//! time resources are parsed). The content pass populates the primary
//! record and any sub-resource records, classifying each field value.

use crate::scene::{display_name, project_relative};
use crate::section::{Event, ParseError, ParseErrorKind, SectionHeader, SectionReader, Value};
use sgraph_core::entity::{
    FieldValue, FileKind, ResourceFile, ResourceField, ResourceRecord, ScriptRef,
};
use sgraph_core::graph::ProjectGraph;
use std::collections::BTreeMap;

const RESOURCE_HEADER_TAG: &str = "gd_resource";

/// Identity extracted by the header pass.
#[derive(Debug)]
pub struct ResourceHeader {
    pub uid: String,
    pub type_name: String,
    pub script_class: Option<String>,
    /// Strong reference to the backing script, when the file declares one.
    pub script: Option<ScriptRef>,
}

impl ResourceHeader {
    pub fn apply(self, resource: &mut ResourceFile) {
        resource.uid = self.uid;
        resource.record.type_name = self.type_name;
        resource.script_class = self.script_class;
        resource.script = self.script;
    }
}

/// Header pass: uid, declared type, script class, script binding. Fails if
/// the `gd_resource` section or its uid is missing or malformed.
pub fn parse_header(source: &str, graph: &ProjectGraph) -> Result<ResourceHeader, ParseError> {
    let mut identity: Option<ResourceHeader> = None;

    let mut reader = SectionReader::new(source);
    while let Some(event) = reader.next_event()? {
        let Event::Section(header) = event else {
            continue;
        };
        match header.tag.as_str() {
            RESOURCE_HEADER_TAG if identity.is_none() => {
                identity = Some(ResourceHeader {
                    uid: header.require_attr("uid")?.to_string(),
                    type_name: header.require_attr("type")?.to_string(),
                    script_class: header.attr("script_class").map(String::from),
                    script: None,
                });
            }
            "ext_resource" if header.attr("type") == Some("Script") => {
                if let Some(identity) = identity.as_mut()
                    && identity.script.is_none()
                {
                    let path = project_relative(header.require_attr("path")?);
                    let target = graph.script_by_path(&path);
                    identity.script = Some(ScriptRef { path, target });
                }
            }
            _ => {}
        }
    }

    identity.ok_or(ParseError {
        line: 1,
        kind: ParseErrorKind::MissingHeader(RESOURCE_HEADER_TAG),
    })
}

/// Everything the content pass produces.
#[derive(Debug, Default)]
pub struct ResourceContent {
    pub fields: Vec<ResourceField>,
    pub sub_resources: BTreeMap<String, ResourceRecord>,
}

impl ResourceContent {
    pub fn apply(self, resource: &mut ResourceFile) {
        resource.record.fields = self.fields;
        resource.sub_resources = self.sub_resources;
    }
}

/// Local classification of an `ext_resource` declaration.
enum ExtDecl {
    Scene { uid: String },
    Resource { uid: String },
    Script { name: String },
    Other { name: String, type_name: String },
}

/// Which record the reader is currently filling.
enum Cursor {
    None,
    Primary,
    Sub(String),
}

/// Content pass: primary record and sub-resource records. External ids are
/// classified through the file's declaration table; sub-resource ids stay
/// local; everything else is opaque scalar or "other" data.
pub fn parse_content(source: &str) -> Result<ResourceContent, ParseError> {
    let mut content = ResourceContent::default();
    let mut ext_decls: BTreeMap<String, ExtDecl> = BTreeMap::new();
    let mut cursor = Cursor::None;

    let mut reader = SectionReader::new(source);
    while let Some(event) = reader.next_event()? {
        match event {
            Event::Section(header) => {
                cursor = Cursor::None;
                match header.tag.as_str() {
                    "ext_resource" => {
                        let id = header.require_attr("id")?.to_string();
                        ext_decls.insert(id.clone(), classify_ext(&header, &id)?);
                    }
                    "sub_resource" => {
                        let id = header.require_attr("id")?.to_string();
                        let type_name = header.require_attr("type")?.to_string();
                        content.sub_resources.insert(
                            id.clone(),
                            ResourceRecord {
                                type_name,
                                fields: Vec::new(),
                            },
                        );
                        cursor = Cursor::Sub(id);
                    }
                    "resource" => cursor = Cursor::Primary,
                    _ => {}
                }
            }
            Event::Assignment(assignment) => {
                let value = field_value(assignment.value, &ext_decls);
                let field = ResourceField {
                    name: assignment.key,
                    value,
                };
                match &cursor {
                    Cursor::Primary => content.fields.push(field),
                    Cursor::Sub(id) => {
                        if let Some(record) = content.sub_resources.get_mut(id) {
                            record.fields.push(field);
                        }
                    }
                    Cursor::None => {}
                }
            }
        }
    }

    Ok(content)
}

fn classify_ext(header: &SectionHeader, id: &str) -> Result<ExtDecl, ParseError> {
    let type_name = header.require_attr("type")?;
    let name = display_name(header, id);
    Ok(match type_name {
        "PackedScene" => ExtDecl::Scene {
            uid: header.require_attr("uid")?.to_string(),
        },
        "Script" => ExtDecl::Script { name },
        _ => match header.attr("uid") {
            Some(uid) => ExtDecl::Resource {
                uid: uid.to_string(),
            },
            None => ExtDecl::Other {
                name,
                type_name: type_name.to_string(),
            },
        },
    })
}

fn field_value(value: Value, ext_decls: &BTreeMap<String, ExtDecl>) -> FieldValue {
    match value {
        Value::Scalar(text) => FieldValue::Scalar { text },
        Value::SubResource(id) => FieldValue::SubResource { id },
        Value::ExtResource(id) => match ext_decls.get(&id) {
            Some(ExtDecl::Scene { uid }) => FieldValue::ExtFile {
                uid: uid.clone(),
                target: FileKind::Scene,
            },
            Some(ExtDecl::Resource { uid }) => FieldValue::ExtFile {
                uid: uid.clone(),
                target: FileKind::Resource,
            },
            Some(ExtDecl::Script { name }) => FieldValue::Other {
                name: name.clone(),
                type_name: "Script".to_string(),
            },
            Some(ExtDecl::Other { name, type_name }) => FieldValue::Other {
                name: name.clone(),
                type_name: type_name.clone(),
            },
            // Undeclared local id: keep the id as the identifier. It was
            // never registered anywhere, so it stays permanently
            // unresolved, which is the representable state the model wants.
            None => FieldValue::ExtFile {
                uid: id,
                target: FileKind::Resource,
            },
        },
    }
}
