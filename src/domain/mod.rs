//! Domain layer: entities and the combination-tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod render;
pub mod validator;

pub use arena::{ComboNode, ComboTree};
pub use entities::*;
pub use error::{DomainError, DomainResult, MismatchKind};
pub use render::ToTermTree;
pub use validator::{ensure_satisfiable, validate, ValidationReport};
