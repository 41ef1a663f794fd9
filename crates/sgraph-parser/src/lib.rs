//! Text parsers for the three project file grammars.
//!
//! Scenes and resources share the bracketed-section syntax handled by
//! [`section`]; both are parsed in two passes (header, then content) and
//! fail fast on structural errors. Scripts ([`script`]) are parsed in a
//! single best-effort pass that never fails the run.

pub mod resource;
pub mod scene;
pub mod script;
pub mod section;

pub use section::{ParseError, ParseErrorKind};
