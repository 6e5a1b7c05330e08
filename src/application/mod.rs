//! Application layer: dungeon masters, agents and the simulation loop
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod dungeon_master;
pub mod error;
pub mod error_ext;
pub mod services;

pub use dungeon_master::DungeonMaster;
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
