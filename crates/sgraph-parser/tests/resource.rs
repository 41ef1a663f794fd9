//! Resource parser integration tests.

use sgraph_core::entity::{FieldValue, FileKind, ResourceFile, ScriptFile};
use sgraph_core::graph::{ProjectGraph, ResolvedValue};
use sgraph_parser::resource;
use std::path::PathBuf;

const ENEMY_RESOURCE: &str = r#"
[gd_resource type="Resource" script_class="EnemyStats" load_steps=4 format=3 uid="uid://enemy_stats"]

[ext_resource type="Script" path="res://enemy_stats.gd" id="1_s"]
[ext_resource type="Resource" uid="uid://base_stats" path="res://base_stats.tres" id="2_b"]
[ext_resource type="AudioStream" path="res://sfx/growl.ogg" id="3_a"]

[sub_resource type="CircleShape2D" id="1"]
radius = 6.0

[sub_resource type="RectangleShape2D" id="2"]
size = Vector2(8, 8)

[resource]
script = ExtResource("1_s")
base = ExtResource("2_b")
growl = ExtResource("3_a")
hitbox = SubResource("2")
max_health = 40
"#;

fn graph_with_script() -> ProjectGraph {
    let mut graph = ProjectGraph::new();
    graph.insert_script(ScriptFile::new(PathBuf::from("enemy_stats.gd")));
    graph
}

#[test]
fn test_header_pass_binds_script() {
    let graph = graph_with_script();
    let header = resource::parse_header(ENEMY_RESOURCE, &graph).unwrap();
    assert_eq!(header.uid, "uid://enemy_stats");
    assert_eq!(header.type_name, "Resource");
    assert_eq!(header.script_class.as_deref(), Some("EnemyStats"));

    let script = header.script.expect("script declaration must bind");
    assert_eq!(script.path, PathBuf::from("enemy_stats.gd"));
    assert!(script.target.is_some(), "indexed script must resolve");
}

#[test]
fn test_content_pass_classifies_fields() {
    let content = resource::parse_content(ENEMY_RESOURCE).unwrap();

    assert_eq!(content.sub_resources.len(), 2);
    assert_eq!(content.sub_resources["1"].type_name, "CircleShape2D");
    assert_eq!(
        content.sub_resources["1"].field("radius"),
        Some(&FieldValue::Scalar { text: "6.0".to_string() })
    );

    let by_name = |name: &str| {
        content
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
            .unwrap()
    };
    assert_eq!(
        by_name("base"),
        &FieldValue::ExtFile {
            uid: "uid://base_stats".to_string(),
            target: FileKind::Resource,
        }
    );
    assert_eq!(
        by_name("growl"),
        &FieldValue::Other {
            name: "growl".to_string(),
            type_name: "AudioStream".to_string(),
        }
    );
    assert_eq!(
        by_name("hitbox"),
        &FieldValue::SubResource { id: "2".to_string() }
    );
    assert_eq!(
        by_name("max_health"),
        &FieldValue::Scalar { text: "40".to_string() }
    );
    // The script handle lives on the entity; the field stays opaque.
    assert_eq!(
        by_name("script"),
        &FieldValue::Other {
            name: "enemy_stats".to_string(),
            type_name: "Script".to_string(),
        }
    );
}

#[test]
fn test_sub_resource_reference_picks_declared_record() {
    // Two sub-resources, the primary record references the
    // second; resolution must yield the second record, not the first.
    let graph = graph_with_script();
    let mut entity = ResourceFile::new(PathBuf::from("enemy_stats.tres"));
    resource::parse_header(ENEMY_RESOURCE, &graph)
        .unwrap()
        .apply(&mut entity);
    resource::parse_content(ENEMY_RESOURCE)
        .unwrap()
        .apply(&mut entity);

    let mut graph = graph;
    let id = graph.insert_resource(entity).id();
    let owner = graph.resource(id);
    match graph.resolve_record_value(owner, owner.record.field("hitbox").unwrap()) {
        ResolvedValue::Record(rec) => assert_eq!(rec.type_name, "RectangleShape2D"),
        other => panic!("expected sub-resource record, got {other:?}"),
    }
}

#[test]
fn test_missing_sub_resource_is_unresolved() {
    let src = r#"
[gd_resource type="Resource" format=3 uid="uid://r"]
[resource]
shape = SubResource("404")
"#;
    let mut entity = ResourceFile::new(PathBuf::from("r.tres"));
    resource::parse_content(src).unwrap().apply(&mut entity);
    entity.uid = "uid://r".to_string();

    let mut graph = ProjectGraph::new();
    let id = graph.insert_resource(entity).id();
    let owner = graph.resource(id);
    assert!(matches!(
        graph.resolve_record_value(owner, owner.record.field("shape").unwrap()),
        ResolvedValue::Unresolved
    ));
}

#[test]
fn test_dangling_external_uid_is_unresolved() {
    let src = r#"
[gd_resource type="Resource" format=3 uid="uid://r"]
[ext_resource type="Resource" uid="uid://gone" path="res://gone.tres" id="1"]
[resource]
base = ExtResource("1")
"#;
    let mut entity = ResourceFile::new(PathBuf::from("r.tres"));
    resource::parse_content(src).unwrap().apply(&mut entity);
    entity.uid = "uid://r".to_string();

    let mut graph = ProjectGraph::new();
    let id = graph.insert_resource(entity).id();
    let owner = graph.resource(id);
    assert!(matches!(
        graph.resolve_record_value(owner, owner.record.field("base").unwrap()),
        ResolvedValue::Unresolved
    ));
}

#[test]
fn test_unbound_script_reference_stays_weak() {
    // Script file absent from the index: the declaration still records the
    // path, with no live target.
    let graph = ProjectGraph::new();
    let header = resource::parse_header(ENEMY_RESOURCE, &graph).unwrap();
    let script = header.script.expect("declaration is still recorded");
    assert!(script.target.is_none());
}
