//! Shared fixtures for integration tests

#![allow(dead_code)]

use prefdungeon::domain::{CategoryList, PreferenceMap, World};

pub const WORLD_TOML: &str = r#"
context_format = "You find {} at {}."
offer_format = "You offer a {} {}."

[context_categories]
person = ["Tom", "Cam"]
time = ["noon", "midnight"]

[offer_categories]
temperature = ["hot", "cold"]
food = ["soup", "sandwich"]

[preferences]
hot = ["noon"]
cold = ["midnight"]
"#;

pub fn lists(raw: &[&[&str]]) -> Vec<CategoryList> {
    raw.iter()
        .map(|items| CategoryList::from_iter(items.iter().copied()))
        .collect()
}

/// Two people at two times; hot food at noon, cold food at midnight.
pub fn lunch_world() -> World {
    World::from_lists(
        lists(&[&["Tom", "Cam"], &["noon", "midnight"]]),
        lists(&[&["hot", "cold"], &["soup", "sandwich"]]),
        "You find {} at {}.",
        "You offer a {} {}.",
        PreferenceMap::from_iter([("hot", ["noon"]), ("cold", ["midnight"])]),
    )
}
