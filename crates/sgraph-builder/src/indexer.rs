//! Directory indexer: one sequential walk of the project tree, classifying
//! files by extension into the three modeled kinds.
//!
//! Ignored folders are pruned before descent, so nothing inside them is
//! ever visited. The configured name set is the only exclusion mechanism:
//! hidden-file and gitignore filtering are switched off, and dot-named
//! engine folders are excluded through the default ignored set instead.
//! Unreadable entries are logged and skipped; the walk keeps going.

use sgraph_core::config::IndexConfig;
use sgraph_core::entity::FileKind;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One indexed file: where it lives on disk and its project-relative path,
/// which is the identity every parsed entity carries.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub abs: PathBuf,
    pub rel: PathBuf,
}

/// Classified walk output, each kind sorted by project-relative path so the
/// parse passes run in a deterministic order.
#[derive(Debug, Default)]
pub struct FileIndex {
    pub scripts: Vec<DiscoveredFile>,
    pub scenes: Vec<DiscoveredFile>,
    pub resources: Vec<DiscoveredFile>,
}

impl FileIndex {
    pub fn total(&self) -> usize {
        self.scripts.len() + self.scenes.len() + self.resources.len()
    }
}

/// Walk the project tree rooted at `root` and classify every file with a
/// recognized extension.
pub fn index(root: &Path, config: &IndexConfig) -> FileIndex {
    let ignored: HashSet<OsString> = config
        .ignored_folders
        .iter()
        .map(OsString::from)
        .collect();

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && ignored.contains(entry.file_name()))
        })
        .build();

    let mut out = FileIndex::default();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(kind) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileKind::from_extension)
        else {
            continue;
        };
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let file = DiscoveredFile {
            abs: path.to_path_buf(),
            rel: rel.to_path_buf(),
        };
        match kind {
            FileKind::Script => out.scripts.push(file),
            FileKind::Scene => out.scenes.push(file),
            FileKind::Resource => out.resources.push(file),
        }
    }

    for list in [&mut out.scripts, &mut out.scenes, &mut out.resources] {
        list.sort_by(|a, b| a.rel.cmp(&b.rel));
    }
    debug!(
        scripts = out.scripts.len(),
        scenes = out.scenes.len(),
        resources = out.resources.len(),
        "indexed project tree"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_classifies_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "player.gd", "");
        write(tmp.path(), "weapon.cs", "");
        write(tmp.path(), "glow.gdshader", "");
        write(tmp.path(), "main.tscn", "");
        write(tmp.path(), "stats.tres", "");
        write(tmp.path(), "notes.txt", "");

        let index = index(tmp.path(), &IndexConfig::default());
        assert_eq!(index.scripts.len(), 3);
        assert_eq!(index.scenes.len(), 1);
        assert_eq!(index.resources.len(), 1);
        assert_eq!(index.total(), 5);
    }

    #[test]
    fn test_ignored_folder_pruned_at_any_depth() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "keep.tscn", "");
        write(tmp.path(), "addons/plugin/tool.gd", "");
        write(tmp.path(), "levels/addons/extra.tscn", "");

        let index = index(tmp.path(), &IndexConfig::default());
        assert_eq!(index.scripts.len(), 0);
        assert_eq!(index.scenes.len(), 1);
        assert_eq!(index.scenes[0].rel, PathBuf::from("keep.tscn"));
    }

    #[test]
    fn test_only_the_configured_name_set_excludes() {
        // A dot-named folder outside the ignored set is still traversed;
        // the configured names are the sole exclusion mechanism.
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".levels/hidden.tscn", "");
        write(tmp.path(), ".godot/cache.tscn", "");

        let index = index(tmp.path(), &IndexConfig::default());
        assert_eq!(index.scenes.len(), 1);
        assert_eq!(index.scenes[0].rel, PathBuf::from(".levels/hidden.tscn"));
    }

    #[test]
    fn test_order_is_sorted_by_relative_path() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "z.tscn", "");
        write(tmp.path(), "a/b.tscn", "");
        write(tmp.path(), "a.tscn", "");

        let index = index(tmp.path(), &IndexConfig::default());
        let rels: Vec<&Path> = index.scenes.iter().map(|f| f.rel.as_path()).collect();
        // Path ordering is component-wise, so "a/b.tscn" precedes "a.tscn".
        assert_eq!(
            rels,
            [
                Path::new("a/b.tscn"),
                Path::new("a.tscn"),
                Path::new("z.tscn"),
            ]
        );
    }
}
