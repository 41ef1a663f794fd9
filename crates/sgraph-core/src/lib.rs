//! Core types for the sgraph project graph.
//!
//! Provides the entity model for scene, resource, and script files
//! ([`entity`]), the identifier-keyed registry that owns them and resolves
//! cross-references ([`graph::ProjectGraph`]), structured build errors,
//! configuration loading, and JSON export.

pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod schema;
pub mod storage;
