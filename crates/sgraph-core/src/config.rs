//! Configuration for indexing and docs output.
//!
//! Load order: `sgraph.toml` in the project root → environment variables →
//! defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level sgraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SgraphConfig {
    pub index: IndexConfig,
    pub docs: DocsConfig,
}

/// Directory-indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Literal directory names excluded from traversal entirely, at any
    /// depth. Exact name match, not patterns.
    pub ignored_folders: Vec<String>,
}

/// Docs-generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Output directory for generated pages, relative to the project root.
    pub output_dir: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ignored_folders: vec![".git".to_string(), ".godot".to_string(), "addons".to_string()],
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            output_dir: "docs".to_string(),
        }
    }
}

/// Helper to apply an env var override to a config field.
fn env_override(var: &str, target: &mut String) {
    if let Ok(v) = std::env::var(var)
        && !v.is_empty()
    {
        *target = v;
    }
}

impl SgraphConfig {
    /// Load config from `sgraph.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("sgraph.toml");

        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("SGRAPH_DOCS_DIR", &mut config.docs.output_dir);

        // Extra ignored folders as a colon-separated list, appended to the
        // configured set.
        if let Ok(extra) = std::env::var("SGRAPH_IGNORED_FOLDERS") {
            config
                .index
                .ignored_folders
                .extend(extra.split(':').filter(|s| !s.is_empty()).map(String::from));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SgraphConfig::default();
        assert!(config.index.ignored_folders.contains(&".godot".to_string()));
        assert_eq!(config.docs.output_dir, "docs");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[index]
ignored_folders = ["build", "export"]

[docs]
output_dir = "wiki"
"#;
        let config: SgraphConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.index.ignored_folders, ["build", "export"]);
        assert_eq!(config.docs.output_dir, "wiki");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = SgraphConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.docs.output_dir, "docs");
    }

    #[test]
    fn test_config_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("sgraph.toml"),
            "[index]\nignored_folders = [\"tmp\"]\n",
        )
        .unwrap();
        let config = SgraphConfig::load(tmp.path()).unwrap();
        assert_eq!(config.index.ignored_folders, ["tmp"]);
    }
}
