//! Graph construction: directory walk plus the ordered parse passes that
//! turn a Godot project tree into a [`sgraph_core::graph::ProjectGraph`].

pub mod indexer;
pub mod pipeline;

pub use pipeline::build;
