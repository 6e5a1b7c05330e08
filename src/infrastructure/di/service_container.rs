//! Service container for dependency injection
//!
//! Wires up services with their dependencies.

use std::sync::Arc;

use crate::application::services::{CategoricalDungeonMaster, WorldLoader};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::World;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding settings and the I/O seams services are built from.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    pub fn world_loader(&self) -> WorldLoader {
        WorldLoader::new(Arc::clone(&self.fs))
    }

    /// Load the configured world file.
    pub fn load_world(&self) -> ApplicationResult<World> {
        let world_file = self
            .settings
            .world_file
            .as_deref()
            .ok_or_else(|| ApplicationError::Config {
                message: "no world file configured (use --world or set world_file)".into(),
            })?;
        self.world_loader()
            .load(world_file, self.settings.preferences_file.as_deref())
    }

    /// Dungeon master over the configured world, seed and validation mode.
    pub fn dungeon_master(&self) -> ApplicationResult<CategoricalDungeonMaster> {
        CategoricalDungeonMaster::new(
            self.load_world()?,
            self.settings.seed,
            self.settings.allow_unsatisfiable,
        )
    }
}
