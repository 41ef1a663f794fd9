//! Markdown vault generation from a project graph.
//!
//! One page per scene and script, mirroring the source tree under the docs
//! output directory. Every page opens with a kind tag so the Obsidian
//! graph view can color nodes through the generated `.obsidian/graph.json`.
//! The output directory is removed and recreated on each run; stale pages
//! never survive.

use anyhow::{Context, Result};
use sgraph_core::config::DocsConfig;
use sgraph_core::entity::{FunctionSig, SceneFile, ScriptFile, Variable};
use sgraph_core::graph::ProjectGraph;
use std::fs;
use std::path::{Path, PathBuf};

const OBSIDIAN_GRAPH: &str = r#"{"colorGroups":[{"query":"tag:#scene","color":{"a":1,"rgb":14048348}},{"query":"tag:#script","color":{"a":1,"rgb":6577366}},{"query":"tag:#resource","color":{"a":1,"rgb":4521728}}]}"#;

/// Render the whole vault. Returns the docs directory that was written.
pub fn generate(
    project_root: &Path,
    graph: &ProjectGraph,
    config: &DocsConfig,
) -> Result<PathBuf> {
    let docs_dir = project_root.join(&config.output_dir);
    if docs_dir.exists() {
        fs::remove_dir_all(&docs_dir)
            .with_context(|| format!("failed to clear docs directory {}", docs_dir.display()))?;
    }
    fs::create_dir_all(&docs_dir)
        .with_context(|| format!("failed to create docs directory {}", docs_dir.display()))?;

    for (_, scene) in graph.scenes() {
        let page = docs_dir.join(&scene.path).with_extension("md");
        write_page(&page, &scene_page(graph, scene))?;
    }

    for (_, script) in graph.scripts() {
        let page = script_page_path(&docs_dir, &script.path);
        write_page(&page, &script_page(script))?;
    }

    let obsidian_dir = docs_dir.join(".obsidian");
    fs::create_dir_all(&obsidian_dir)
        .with_context(|| format!("failed to create {}", obsidian_dir.display()))?;
    fs::write(obsidian_dir.join("graph.json"), OBSIDIAN_GRAPH)
        .context("failed to write .obsidian/graph.json")?;

    Ok(docs_dir)
}

fn write_page(page: &Path, content: &str) -> Result<()> {
    if let Some(parent) = page.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(page, content).with_context(|| format!("failed to write {}", page.display()))
}

/// Script pages keep the full source file name, so `player.gd` becomes
/// `player.gd.md` and its link stem stays distinct from a `player.tscn`
/// scene page.
fn script_page_path(docs_dir: &Path, rel: &Path) -> PathBuf {
    let mut page = docs_dir.join(rel);
    let name = page
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    page.set_file_name(format!("{name}.md"));
    page
}

/// `[[file.md|stem]]` wiki link for a scene's page.
fn scene_link(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("[[{stem}.md|{stem}]]")
}

fn script_link(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("[[{name}.md|{name}]]")
}

fn scene_page(graph: &ProjectGraph, scene: &SceneFile) -> String {
    let mut out = String::from("#scene\n\n");

    out.push_str("# External Resources\n");
    out.push_str("## Scenes\n");
    for scene_ref in scene.packed_scenes.values() {
        match scene_ref.target {
            Some(target) => {
                out.push_str(&scene_link(&graph.scene(target).path));
                out.push('\n');
            }
            None => {
                out.push_str(&format!("{} (unresolved)\n", scene_ref.uid));
            }
        }
    }

    out.push_str("## Scripts\n");
    for script_ref in scene.scripts.values() {
        match script_ref.target {
            Some(target) => {
                out.push_str(&script_link(&graph.script(target).path));
                out.push('\n');
            }
            None => {
                out.push_str(&format!("{} (unresolved)\n", script_ref.path.display()));
            }
        }
    }

    out.push_str("## Resources\n");
    for res_ref in scene.ext_resources.values() {
        match graph.resource_by_uid(&res_ref.uid) {
            Some(target) => {
                let resource = graph.resource(target);
                out.push_str(&format!("{} ({})\n", resource.title, resource.uid));
            }
            None => {
                out.push_str(&format!("{} ({}, unresolved)\n", res_ref.name, res_ref.uid));
            }
        }
    }
    for other in scene.ext_others.values() {
        out.push_str(&format!("{} ({})\n", other.name, other.type_name));
    }

    out
}

fn script_page(script: &ScriptFile) -> String {
    let mut out = String::from("#script\n\n");
    let class = &script.class;

    out.push_str(&format!(
        "# {}\n",
        class.name.as_deref().unwrap_or(&script.title)
    ));
    if let Some(parent) = &class.parent {
        out.push_str(&format!("extends {parent}\n"));
    }
    if !class.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", class.tags.join(", ")));
    }
    if let Some(brief) = &class.brief {
        out.push('\n');
        out.push_str(brief);
        out.push('\n');
    }

    if !class.categories.is_empty() {
        out.push_str("\n## Variables\n");
        for category in &class.categories {
            if let Some(name) = &category.name {
                out.push_str(&format!("### {name}\n"));
            }
            for variable in &category.variables {
                out.push_str(&variable_line(variable));
            }
        }
    }

    if !class.functions.is_empty() {
        out.push_str("\n## Functions\n");
        for function in &class.functions {
            out.push_str(&function_line(function));
        }
    }

    out
}

fn variable_line(variable: &Variable) -> String {
    let mut line = format!("- `{}: {}`", variable.name, variable.type_name);
    if let Some(brief) = &variable.brief {
        line.push(' ');
        line.push_str(brief);
    }
    line.push('\n');
    line
}

fn function_line(function: &FunctionSig) -> String {
    let args = function
        .args
        .iter()
        .map(|a| format!("{}: {}", a.name, a.type_name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = format!(
        "- `{}({}) -> {}`",
        function.name, args, function.return_type
    );
    if let Some(brief) = &function.brief {
        line.push(' ');
        line.push_str(brief);
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgraph_core::entity::{SceneRef, ScriptRef};
    use std::collections::BTreeMap;

    fn sample_graph() -> ProjectGraph {
        let mut graph = ProjectGraph::new();

        let script_id = graph.insert_script(ScriptFile::new(PathBuf::from("player.gd")));
        graph.script_mut(script_id).class.name = Some("Player".to_string());
        graph.script_mut(script_id).class.parent = Some("CharacterBody2D".to_string());

        let mut weapon = SceneFile::new(PathBuf::from("weapon.tscn"));
        weapon.uid = "uid://weapon".to_string();
        let weapon_id = graph.insert_scene(weapon).id();

        let mut player = SceneFile::new(PathBuf::from("player.tscn"));
        player.uid = "uid://player".to_string();
        player.packed_scenes = BTreeMap::from([(
            "1_w".to_string(),
            SceneRef {
                uid: "uid://weapon".to_string(),
                target: Some(weapon_id),
            },
        )]);
        player.scripts = BTreeMap::from([(
            "2_s".to_string(),
            ScriptRef {
                path: PathBuf::from("player.gd"),
                target: Some(script_id),
            },
        )]);
        graph.insert_scene(player);
        graph
    }

    #[test]
    fn test_generates_tagged_pages_and_links() {
        let tmp = tempfile::tempdir().unwrap();
        let graph = sample_graph();
        let docs_dir = generate(tmp.path(), &graph, &DocsConfig::default()).unwrap();

        let scene_page = fs::read_to_string(docs_dir.join("player.md")).unwrap();
        assert!(scene_page.starts_with("#scene\n"));
        assert!(scene_page.contains("[[weapon.md|weapon]]"));
        assert!(scene_page.contains("[[player.gd.md|player.gd]]"));

        let script_page = fs::read_to_string(docs_dir.join("player.gd.md")).unwrap();
        assert!(script_page.starts_with("#script\n"));
        assert!(script_page.contains("# Player"));
        assert!(script_page.contains("extends CharacterBody2D"));

        let obsidian = fs::read_to_string(docs_dir.join(".obsidian/graph.json")).unwrap();
        assert!(obsidian.contains("tag:#scene"));
        assert!(obsidian.contains("tag:#resource"));
    }

    #[test]
    fn test_regeneration_wipes_stale_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let graph = sample_graph();
        let docs_dir = generate(tmp.path(), &graph, &DocsConfig::default()).unwrap();
        fs::write(docs_dir.join("stale.md"), "#scene\n").unwrap();

        generate(tmp.path(), &graph, &DocsConfig::default()).unwrap();
        assert!(!docs_dir.join("stale.md").exists());
        assert!(docs_dir.join("player.md").exists());
    }

    #[test]
    fn test_unresolved_references_render_as_plain_text() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ProjectGraph::new();
        let mut scene = SceneFile::new(PathBuf::from("orphan.tscn"));
        scene.uid = "uid://orphan".to_string();
        scene.packed_scenes = BTreeMap::from([(
            "1".to_string(),
            SceneRef {
                uid: "uid://gone".to_string(),
                target: None,
            },
        )]);
        graph.insert_scene(scene);

        let docs_dir = generate(tmp.path(), &graph, &DocsConfig::default()).unwrap();
        let page = fs::read_to_string(docs_dir.join("orphan.md")).unwrap();
        assert!(page.contains("uid://gone (unresolved)"));
        assert!(!page.contains("[[uid://gone"));
    }
}
