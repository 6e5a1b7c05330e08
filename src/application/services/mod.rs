//! Application services
//!
//! Dungeon masters, the agents that play against them and the drivers that
//! run the rounds. Services depend on boundary traits (FileSystem,
//! LanguageModel, SimilarityScorer) but are themselves concrete types.

mod agents;
mod categorical;
mod open_ended;
mod simulation;
mod stats;
mod world;

pub use agents::{
    render_named, EntireHistoryAgent, NoHistoryAgent, OfferGenerator, OpenEndedAgent,
    PeriodicSummaryAgent, ProfileEntry, ProfileHistoryAgent, RandomAgent, RandomProfileAgent,
    DEFAULT_SUMMARY_TEMPLATE, NO_SUMMARY, RANDOM_JUSTIFICATION,
};
pub use categorical::{CategoricalDungeonMaster, DEFAULT_SEED};
pub use open_ended::{OpenEndedDungeonMaster, SimilarityScore, SimilarityScorer};
pub use simulation::{
    play, play_open_ended, simulate, simulate_batch, simulate_with_agent, SimulationReport,
};
pub use stats::{moving_mean_std, outcome_value};
pub use world::WorldLoader;
