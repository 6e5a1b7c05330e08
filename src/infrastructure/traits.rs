//! I/O boundary traits for testability
//!
//! These traits abstract external collaborators (filesystem, language models),
//! allowing services to be tested with scripted implementations.

use std::io;
use std::path::Path;

/// Error raised by an external collaborator. Propagated unmodified.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Text-completion model behind the LLM-backed agents.
///
/// Calls are blocking and fail fast; the harness never retries them.
pub trait LanguageModel: Send + Sync {
    /// Complete a fully rendered prompt.
    fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}
