//! Preference dungeon
//!
//! Simulates rounds in which an offer-maker proposes offers and a dungeon
//! master accepts or rejects them against hidden preferences tied to a
//! changing context. Before play, a combination tree over the context
//! categories checks that every context can satisfy some preference.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
