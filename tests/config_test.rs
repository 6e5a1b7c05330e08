//! Settings layering and world loading through the service container.
//!
//! These tests run without a global config (temp directories only).

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use common::WORLD_TOML;
use prefdungeon::application::services::simulate;
use prefdungeon::application::ApplicationError;
use prefdungeon::config::{local_config_path, Settings};
use prefdungeon::domain::{DomainError, MismatchKind};
use prefdungeon::infrastructure::di::ServiceContainer;
use prefdungeon::infrastructure::traits::RealFileSystem;

fn write_world(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("lunch.toml");
    fs::write(&path, WORLD_TOML).unwrap();
    path
}

#[test]
fn given_local_config_with_world_when_loading_then_container_builds_dungeon_master() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let world = write_world(&dir);
    fs::write(
        local_config_path(dir.path()),
        format!("seed = 7\niterations = 5\nworld_file = {:?}\n", world.display().to_string()),
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");
    let container = ServiceContainer::with_deps(settings, Arc::new(RealFileSystem));
    let mut dm = container.dungeon_master().expect("dungeon master");
    let report = simulate(&mut dm, container.settings.iterations, false).unwrap();

    // Assert
    assert_eq!(dm.seed(), 7);
    assert_eq!(report.len(), 5);
    let names: Vec<_> = dm.offer_categories().names().collect();
    assert_eq!(names, vec!["temperature", "food"]);
}

#[test]
fn given_no_world_configured_when_loading_then_config_error() {
    let container = ServiceContainer::new(Settings::default());

    let err = container.load_world().unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_preference_value_outside_contexts_when_loading_then_config_mismatch() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let world = write_world(&dir);
    let prefs = dir.path().join("prefs.toml");
    fs::write(&prefs, "hot = [\"noon\"]\ncold = [\"dawn\"]\n").unwrap();
    let settings = Settings {
        world_file: Some(world),
        preferences_file: Some(prefs),
        ..Settings::default()
    };

    // Act
    let err = ServiceContainer::new(settings).load_world().unwrap_err();

    // Assert
    match err {
        ApplicationError::Domain(DomainError::ConfigMismatch { kind, item }) => {
            assert_eq!(kind, MismatchKind::ContextItem);
            assert_eq!(item, "dawn");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn given_unsatisfiable_preferences_file_when_opted_out_then_dungeon_master_is_built() {
    let dir = TempDir::new().unwrap();
    let world = write_world(&dir);
    let prefs = dir.path().join("prefs.toml");
    fs::write(&prefs, "hot = [\"noon\"]\n").unwrap();
    let settings = Settings {
        world_file: Some(world.clone()),
        preferences_file: Some(prefs.clone()),
        ..Settings::default()
    };
    assert!(ServiceContainer::new(settings).dungeon_master().is_err());

    let settings = Settings {
        world_file: Some(world),
        preferences_file: Some(prefs),
        allow_unsatisfiable: true,
        ..Settings::default()
    };

    assert!(ServiceContainer::new(settings).dungeon_master().is_ok());
}

#[test]
fn given_template_when_written_as_local_config_then_loads_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), Settings::template()).unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.seed, 256);
    assert_eq!(settings.iterations, 50);
}
