//! Simulation runs: determinism, agents and the open-ended loop.

mod common;

use std::sync::Mutex;

use common::lunch_world;
use prefdungeon::application::services::{
    moving_mean_std, play_open_ended, simulate, simulate_batch, simulate_with_agent,
    CategoricalDungeonMaster, EntireHistoryAgent, NoHistoryAgent, OfferGenerator,
    OpenEndedDungeonMaster, RandomAgent, SimilarityScore, SimilarityScorer,
};
use prefdungeon::application::ApplicationError;
use prefdungeon::domain::{CategorySet, EvaluationOutcome};
use prefdungeon::infrastructure::traits::{CollaboratorError, LanguageModel};
use prefdungeon::util::testing;

#[test]
fn given_fixed_seed_when_simulating_fifty_rounds_then_runs_are_identical() {
    testing::init_test_setup();
    // Arrange
    let mut first = CategoricalDungeonMaster::new(lunch_world(), 256, false).unwrap();
    let mut second = CategoricalDungeonMaster::new(lunch_world(), 256, false).unwrap();

    // Act
    let a = simulate(&mut first, 50, true).unwrap();
    let b = simulate(&mut second, 50, false).unwrap();

    // Assert
    assert_eq!(a.contexts, b.contexts);
    assert_eq!(a.offers, b.offers);
    assert_eq!(a.results, b.results);
    assert_eq!(a.len(), 50);
}

#[test]
fn given_simulation_when_done_then_results_agree_with_preferences() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 17, false).unwrap();

    let report = simulate(&mut dm, 40, false).unwrap();

    for record in report.records() {
        let time = &record.context.values()[1];
        let temperature = record.offer.values()[0];
        let expected = match (temperature, time.as_str()) {
            ("hot", "noon") | ("cold", "midnight") => EvaluationOutcome::Accepted,
            _ => EvaluationOutcome::Rejected,
        };
        assert_eq!(record.outcome, expected, "round {record:?}");
    }
}

#[test]
fn given_batch_when_simulating_then_each_seed_is_reproducible() {
    let seeds = [4, 8, 15, 16];

    let first = simulate_batch(&lunch_world(), &seeds, 25, false).unwrap();
    let second = simulate_batch(&lunch_world(), &seeds, 25, false).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|(seed, _)| *seed).collect::<Vec<_>>(),
        seeds.to_vec()
    );
}

#[test]
fn given_report_when_windowing_then_one_point_per_full_window() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 2, false).unwrap();
    let report = simulate(&mut dm, 20, false).unwrap();

    let (means, stds) = moving_mean_std(&report.outcome_values(), 5);

    assert_eq!(means.len(), 16);
    assert_eq!(stds.len(), 16);
    assert!(means.iter().all(|m| (0.0..=1.0).contains(m)));
}

// ============================================================
// Agents
// ============================================================

/// Always offers the same thing and keeps the memory it was fed.
struct StubbornAgent {
    offer: String,
    memory: Vec<String>,
}

impl OfferGenerator for StubbornAgent {
    fn name(&self) -> &str {
        "StubbornAgent"
    }

    fn make_offer(&mut self, _: &CategorySet, _: &str) -> Result<String, ApplicationError> {
        Ok(self.offer.clone())
    }

    fn update_memory(&mut self, memory: &str, replace: bool) {
        if replace {
            self.memory.clear();
        }
        self.memory.push(memory.to_string());
    }
}

#[test]
fn given_agent_when_simulating_then_each_round_is_fed_back_to_memory() {
    // Arrange
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 6, false).unwrap();
    let mut agent = StubbornAgent {
        offer: "You offer a hot soup".into(),
        memory: Vec::new(),
    };

    // Act
    let report = simulate_with_agent(&mut dm, &mut agent, 10, false).unwrap();

    // Assert
    assert_eq!(agent.memory.len(), 10);
    for (line, outcome) in agent.memory.iter().zip(&report.results) {
        assert!(line.starts_with("You find "));
        assert!(line.ends_with(&outcome.to_string()));
    }
}

#[test]
fn given_random_agent_with_justification_when_simulating_then_offers_are_valid() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 6, false).unwrap();
    let mut agent = RandomAgent::new("You offer a {} {} because {}", 6);

    let report = simulate_with_agent(&mut dm, &mut agent, 20, false).unwrap();

    assert!(report
        .results
        .iter()
        .all(|r| *r != EvaluationOutcome::InvalidOffer));
}

struct FailingModel;

impl LanguageModel for FailingModel {
    fn complete(&self, _: &str) -> Result<String, CollaboratorError> {
        Err("rate limited".into())
    }
}

#[test]
fn given_failing_model_when_simulating_then_error_propagates() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 6, false).unwrap();
    let mut agent = EntireHistoryAgent::new(FailingModel, "init", "{context}{prompt}");

    let err = simulate_with_agent(&mut dm, &mut agent, 3, false).unwrap_err();

    assert!(matches!(err, ApplicationError::Collaborator { .. }));
    assert!(err.to_string().contains("rate limited"));
    assert!(dm.context_history().is_empty());
}

// ============================================================
// Open-ended loop
// ============================================================

/// Answers every prompt with a fixed title line.
struct TitleModel;

impl LanguageModel for TitleModel {
    fn complete(&self, _: &str) -> Result<String, CollaboratorError> {
        Ok("Sure.\nTitle: Big News".to_string())
    }
}

#[derive(Default)]
struct RecordingScorer {
    seen: Mutex<Vec<(Vec<String>, String)>>,
}

impl SimilarityScorer for RecordingScorer {
    fn score(&self, candidates: &[String], reference: &str) -> Result<SimilarityScore, CollaboratorError> {
        self.seen
            .lock()
            .unwrap()
            .push((candidates.to_vec(), reference.to_string()));
        Ok(SimilarityScore::from([("rouge1_fmeasure".to_string(), 0.25)]))
    }
}

#[test]
fn given_more_rounds_than_contexts_when_playing_then_stops_at_dataset_end() {
    // Arrange
    let mut dm = OpenEndedDungeonMaster::new(
        vec!["a".into(), "b".into(), "c".into()],
        vec!["A".into(), "B".into(), "C".into()],
        None,
        RecordingScorer::default(),
    )
    .unwrap()
    .with_answer_prefix("Title");
    let mut agent = NoHistoryAgent::new(TitleModel, "Write titles.", "{context}\n{prompt}");

    // Act
    let scores = play_open_ended(&mut dm, &mut agent, 10).unwrap();

    // Assert
    assert_eq!(scores.len(), 3);
    assert_eq!(dm.index(), 2);
    assert_eq!(dm.context_history().len(), 2);
}
