//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Which side of the world a mismatched preference entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// A preference key that is not an item of any offer category
    OfferItem,
    /// A preference value that is not an item of any context category
    ContextItem,
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchKind::OfferItem => write!(f, "offer categories"),
            MismatchKind::ContextItem => write!(f, "context categories"),
        }
    }
}

/// Domain errors represent violations of the world's rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no category lists given")]
    EmptyCategories,

    #[error("category {0} has no items")]
    EmptyCategory(String),

    #[error("there are unsatisfiable contexts: {}", format_paths(.paths))]
    UnsatisfiablePreferences { paths: Vec<Vec<String>> },

    #[error("dataset exhausted: index {index} out of range for {len} contexts")]
    DatasetExhausted { index: usize, len: usize },

    #[error("dataset field {field} has {actual} entries, expected {expected}")]
    DatasetMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{item} not in {kind}")]
    ConfigMismatch { kind: MismatchKind, item: String },

    #[error("template expects {expected} values, got {actual}")]
    TemplateArity { expected: usize, actual: usize },
}

fn format_paths(paths: &[Vec<String>]) -> String {
    paths
        .iter()
        .map(|p| format!("[{}]", p.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
