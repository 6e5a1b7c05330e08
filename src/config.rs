//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/prefdungeon/prefdungeon.toml`
//! 3. Local config: `<dir>/.prefdungeon.toml` (current directory unless given)
//! 4. Environment variables: `PDUNGEON_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::services::DEFAULT_SEED;
use crate::application::ApplicationError;

/// Rounds played per simulation when none is configured.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Unified configuration for prefdungeon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Seed of the dungeon master's random stream
    pub seed: u64,
    /// Rounds per simulation
    pub iterations: usize,
    /// Skip the satisfiability check at setup
    pub allow_unsatisfiable: bool,
    /// Log every round
    pub trace: bool,
    /// World file (templates, categories, optional preferences)
    pub world_file: Option<PathBuf>,
    /// Preferences kept apart from the world file
    pub preferences_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
            allow_unsatisfiable: false,
            trace: false,
            world_file: None,
            preferences_file: None,
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub allow_unsatisfiable: Option<bool>,
    pub trace: Option<bool>,
    pub world_file: Option<PathBuf>,
    pub preferences_file: Option<PathBuf>,
}

/// Get the XDG config directory for prefdungeon.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "prefdungeon").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("prefdungeon.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".prefdungeon.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is kept as is.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.world_file = self.world_file.as_deref().map(expand_path);
        self.preferences_file = self.preferences_file.as_deref().map(expand_path);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            seed: overlay.seed.unwrap_or(self.seed),
            iterations: overlay.iterations.unwrap_or(self.iterations),
            allow_unsatisfiable: overlay
                .allow_unsatisfiable
                .unwrap_or(self.allow_unsatisfiable),
            trace: overlay.trace.unwrap_or(self.trace),
            world_file: overlay
                .world_file
                .clone()
                .or_else(|| self.world_file.clone()),
            preferences_file: overlay
                .preferences_file
                .clone()
                .or_else(|| self.preferences_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory holding `.prefdungeon.toml`; the current directory when None
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        let local_path = local_config_path(local_dir.unwrap_or_else(|| Path::new(".")));
        if local_path.exists() {
            current = current.merge_with(&load_raw_settings(&local_path)?);
        }

        current = Self::apply_env_overrides(current, env_source())?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply PDUNGEON_* environment variables as explicit overrides.
    ///
    /// Unset variables keep the current value; a set variable that does not
    /// parse is an error.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<u64>(&config, "seed")? {
            settings.seed = val;
        }
        if let Some(val) = env_value::<usize>(&config, "iterations")? {
            settings.iterations = val;
        }
        if let Some(val) = env_value::<bool>(&config, "allow_unsatisfiable")? {
            settings.allow_unsatisfiable = val;
        }
        if let Some(val) = env_value::<bool>(&config, "trace")? {
            settings.trace = val;
        }
        if let Some(val) = env_value::<String>(&config, "world_file")? {
            settings.world_file = Some(PathBuf::from(val));
        }
        if let Some(val) = env_value::<String>(&config, "preferences_file")? {
            settings.preferences_file = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# prefdungeon configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/prefdungeon/prefdungeon.toml
#   Local:  ./.prefdungeon.toml
#   Env:    PDUNGEON_* environment variables (e.g. PDUNGEON_SEED=7)

# Seed of the dungeon master's random stream
# seed = 256

# Rounds per simulation
# iterations = 50

# Skip the check that every context can satisfy some preference
# allow_unsatisfiable = false

# Log every round as "<context> <offer> <RESULT>"
# trace = false

# World file: templates, categories and (optionally) preferences
# world_file = "~/dungeons/lunch.toml"

# Preferences kept in a separate file; replaces [preferences] of the world file
# preferences_file = "~/dungeons/lunch-prefs.toml"
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("PDUNGEON")
        .prefix_separator("_")
        .separator("__")
}

fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
