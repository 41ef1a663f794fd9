//! Structured errors for graph construction.
//!
//! Scene and resource grammar failures are fatal to the whole run: the
//! error unwinds to the top level and no partial graph is handed out.
//! Reference-resolution misses and script declaration failures are *not*
//! errors; they are represented in the data model instead.

use std::path::PathBuf;
use thiserror::Error;

/// The parse phase a failure occurred in, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SceneHeader,
    SceneContent,
    ResourceHeader,
    ResourceContent,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SceneHeader => "scene header pass",
            Self::SceneContent => "scene content pass",
            Self::ResourceHeader => "resource header pass",
            Self::ResourceContent => "resource content pass",
        };
        f.write_str(s)
    }
}

/// A fatal build error. Carries enough context to name the file and phase
/// that failed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("project root {0} does not exist")]
    InvalidRoot(PathBuf),

    #[error("{file}: {phase} failed at line {line}: {reason}")]
    MalformedFile {
        file: PathBuf,
        phase: Phase,
        line: usize,
        reason: String,
    },

    #[error("failed to read {file}")]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
