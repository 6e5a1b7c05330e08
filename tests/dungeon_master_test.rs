//! Offer evaluation by the categorical and open-ended dungeon masters.

mod common;

use std::sync::Mutex;

use common::lunch_world;
use prefdungeon::application::services::{
    CategoricalDungeonMaster, OpenEndedDungeonMaster, SimilarityScore, SimilarityScorer,
};
use prefdungeon::application::{ApplicationError, DungeonMaster};
use prefdungeon::domain::{Context, DomainError, EvaluationOutcome};
use prefdungeon::infrastructure::traits::CollaboratorError;

fn context(values: &[&str]) -> Context {
    values.iter().copied().collect()
}

// ============================================================
// Categorical
// ============================================================

#[test]
fn given_hot_soup_when_tom_at_noon_then_accepted() {
    // Arrange
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 1, false).unwrap();

    // Act
    let outcome = dm.evaluate_offer("You offer a hot soup", Some(&context(&["Tom", "noon"])));

    // Assert
    assert_eq!(outcome, EvaluationOutcome::Accepted);
    assert_eq!(outcome.to_string(), "ACCEPTED");
}

#[test]
fn given_hot_soup_when_tom_at_midnight_then_rejected() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 1, false).unwrap();

    let outcome = dm.evaluate_offer("You offer a hot soup", Some(&context(&["Tom", "midnight"])));

    assert_eq!(outcome, EvaluationOutcome::Rejected);
}

#[test]
fn given_unknown_temperature_when_evaluating_then_invalid_offer() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 1, false).unwrap();

    let outcome = dm.evaluate_offer("You offer a lukewarm soup", None);

    assert_eq!(outcome, EvaluationOutcome::InvalidOffer);
    assert_eq!(dm.current_offer_text(), "You offer a  soup.");
}

#[test]
fn given_item_only_in_justification_when_evaluating_then_invalid_offer() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 1, false).unwrap();

    let outcome = dm.evaluate_offer("You offer a soup because hot is nice", None);

    assert_eq!(outcome, EvaluationOutcome::InvalidOffer);
}

/// Substring matching: "hot" is found inside "photograph".
#[test]
fn given_item_inside_another_word_when_evaluating_then_matches_anyway() {
    let mut dm = CategoricalDungeonMaster::new(lunch_world(), 1, false).unwrap();

    let outcome = dm.evaluate_offer(
        "You offer a photograph of soup",
        Some(&context(&["Cam", "noon"])),
    );

    assert_eq!(outcome, EvaluationOutcome::Accepted);
}

#[test]
fn given_same_seed_when_advancing_fifty_times_then_same_contexts() {
    let run = |seed| {
        let mut dm = CategoricalDungeonMaster::new(lunch_world(), seed, false).unwrap();
        for _ in 0..50 {
            dm.advance_context().unwrap();
        }
        dm.context_history().to_vec()
    };

    assert_eq!(run(256), run(256));
    assert_eq!(run(256).len(), 50);
}

#[test]
fn given_context_when_rendered_then_uses_context_template() {
    let dm = CategoricalDungeonMaster::new(lunch_world(), 3, false).unwrap();

    let text = dm.current_context_text();
    let values = dm.current_context().values();

    assert_eq!(text, format!("You find {} at {}.", values[0], values[1]));
}

// ============================================================
// Open-ended
// ============================================================

/// Scores by exact match and records the references it was given.
#[derive(Default)]
struct ExactMatchScorer {
    references: Mutex<Vec<String>>,
}

impl SimilarityScorer for ExactMatchScorer {
    fn score(
        &self,
        candidates: &[String],
        reference: &str,
    ) -> Result<SimilarityScore, CollaboratorError> {
        self.references.lock().unwrap().push(reference.to_string());
        let hits = candidates.iter().filter(|c| c.as_str() == reference).count();
        Ok(SimilarityScore::from([(
            "exact".to_string(),
            hits as f64 / candidates.len().max(1) as f64,
        )]))
    }
}

fn dataset() -> (Vec<String>, Vec<String>) {
    (
        vec!["first article".into(), "second article".into()],
        vec!["First".into(), "Second".into()],
    )
}

#[test]
fn given_prefixed_answer_when_evaluating_then_scorer_sees_extracted_text() {
    // Arrange
    let (contexts, truths) = dataset();
    let mut dm = OpenEndedDungeonMaster::new(contexts, truths, None, ExactMatchScorer::default())
        .unwrap()
        .with_answer_prefix("Title");

    // Act
    let score = dm
        .evaluate(&["Here you go.\nTitle: \"First\"".to_string()])
        .unwrap();

    // Assert
    assert_eq!(score.get("exact"), Some(&1.0));
    assert_eq!(dm.current_offer_text(), "First");
}

#[test]
fn given_end_of_dataset_when_advancing_then_dataset_exhausted() {
    let (contexts, truths) = dataset();
    let mut dm =
        OpenEndedDungeonMaster::new(contexts, truths, None, ExactMatchScorer::default()).unwrap();
    dm.advance_context().unwrap();

    let err = dm.advance_context().unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DatasetExhausted { .. })
    ));
    assert_eq!(dm.current_context(), "second article");
    assert_eq!(dm.context_history(), ["first article".to_string()]);
}

#[test]
fn given_empty_dataset_when_creating_then_dataset_exhausted() {
    let result = OpenEndedDungeonMaster::new(vec![], vec![], None, ExactMatchScorer::default());

    assert!(matches!(result, Err(DomainError::DatasetExhausted { .. })));
}
