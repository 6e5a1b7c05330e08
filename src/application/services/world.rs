//! World loader
//!
//! Reads a categorical world (templates, categories, preferences) from TOML,
//! optionally with the preferences kept in a file of their own.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{PreferenceMap, World};
use crate::infrastructure::traits::FileSystem;

/// Loads and cross-checks world files.
pub struct WorldLoader {
    fs: Arc<dyn FileSystem>,
}

impl WorldLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load a world file, replacing its `[preferences]` table with the contents of
    /// `preferences_path` when given.
    ///
    /// The result has passed [`World::check`].
    #[instrument(level = "debug", skip(self))]
    pub fn load(
        &self,
        world_path: &Path,
        preferences_path: Option<&Path>,
    ) -> ApplicationResult<World> {
        let mut world: World = self.read_toml(world_path, "world")?;

        if let Some(path) = preferences_path {
            world.preferences = self.load_preferences(path)?;
        }
        debug!(
            contexts = world.context_categories.len(),
            offers = world.offer_categories.len(),
            preferences = world.preferences.len(),
            "world loaded"
        );

        world.check()?;
        Ok(world)
    }

    /// Load a standalone preferences file: a table of offer item → context items.
    pub fn load_preferences(&self, path: &Path) -> ApplicationResult<PreferenceMap> {
        self.read_toml(path, "preferences")
    }

    fn read_toml<T: DeserializeOwned>(&self, path: &Path, what: &str) -> ApplicationResult<T> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::Config {
                message: format!("{} file not found: {}", what, path.display()),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context(&format!("read {} file", what), path)?;

        toml::from_str(&content).map_err(|e| ApplicationError::Config {
            message: format!("invalid {} file {}: {}", what, path.display(), e),
        })
    }
}
