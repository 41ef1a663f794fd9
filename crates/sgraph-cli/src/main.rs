//! CLI binary for sgraph: build, inspect, and document Godot project graphs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sgraph_core::config::SgraphConfig;
use sgraph_core::{schema, storage};
use std::path::{Path, PathBuf};

mod docs;

#[derive(Parser)]
#[command(name = "sgraph", about = "Godot project graph builder")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project graph and save it under .sgraph/
    Build {
        /// Extra folder names to exclude from the walk (repeatable)
        #[arg(long)]
        ignore: Vec<String>,

        /// Print the full graph as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Show statistics for the saved graph
    Info,

    /// Generate the Markdown documentation vault
    Docs {
        /// Output directory, overriding configuration
        #[arg(short, long)]
        out: Option<String>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Build { ignore, json } => cmd_build(&project_root, ignore, json),
        Commands::Info => cmd_info(&project_root),
        Commands::Docs { out } => cmd_docs(&project_root, out),
    }
}

fn load_config(project_root: &Path) -> Result<SgraphConfig> {
    SgraphConfig::load(project_root)
        .with_context(|| format!("failed to load config for {}", project_root.display()))
}

fn print_summary(graph: &sgraph_core::graph::ProjectGraph) {
    let m = &graph.metadata;
    eprintln!(
        "  {} scenes, {} resources, {} scripts ({} nodes)",
        m.total_scenes, m.total_resources, m.total_scripts, m.total_nodes
    );
    if m.unresolved_references > 0 {
        eprintln!("  {} unresolved references", m.unresolved_references);
    }
}

fn cmd_build(project_root: &Path, ignore: Vec<String>, json: bool) -> Result<()> {
    let mut config = load_config(project_root)?;
    config.index.ignored_folders.extend(ignore);

    let graph = sgraph_builder::build(project_root, &config)?;
    storage::save(project_root, &graph)?;

    if json {
        println!("{}", schema::to_json(&graph)?);
    } else {
        eprintln!("Graph saved to {}", storage::graph_file(project_root).display());
        print_summary(&graph);
    }
    Ok(())
}

fn cmd_info(project_root: &Path) -> Result<()> {
    if !storage::graph_exists(project_root) {
        anyhow::bail!(
            "no graph found at {}. Run `sgraph build` first.",
            storage::graph_file(project_root).display()
        );
    }
    let graph = storage::load(project_root)?;
    eprintln!("Graph schema {}", graph.version);
    eprintln!("  created {}", graph.created_at.to_rfc3339());
    eprintln!("  updated {}", graph.updated_at.to_rfc3339());
    print_summary(&graph);
    Ok(())
}

fn cmd_docs(project_root: &Path, out: Option<String>) -> Result<()> {
    let mut config = load_config(project_root)?;
    if let Some(out) = out {
        config.docs.output_dir = out;
    }

    // Docs always reflect the tree on disk, so rebuild rather than load.
    let graph = sgraph_builder::build(project_root, &config)?;
    storage::save(project_root, &graph)?;

    let docs_dir = docs::generate(project_root, &graph, &config.docs)?;
    eprintln!("Docs written to {}", docs_dir.display());
    print_summary(&graph);
    Ok(())
}
