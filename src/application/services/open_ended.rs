//! Open-ended dungeon master
//!
//! Walks a fixed dataset of contexts and ground truths. Offers are free text and
//! are scored against the ground truth by an external similarity scorer.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, instrument};

use crate::application::dungeon_master::DungeonMaster;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::traits::CollaboratorError;

/// Named similarity metrics, e.g. `rougeL_fmeasure`.
pub type SimilarityScore = BTreeMap<String, f64>;

/// Text similarity between candidate offers and a reference.
pub trait SimilarityScorer {
    fn score(&self, candidates: &[String], reference: &str)
        -> Result<SimilarityScore, CollaboratorError>;
}

/// Dungeon master over a fixed dataset.
///
/// `contexts`, `ground_truths` and the optional `preferences` are parallel arrays.
pub struct OpenEndedDungeonMaster<S: SimilarityScorer> {
    scorer: S,
    contexts: Vec<String>,
    ground_truths: Vec<String>,
    preferences: Option<Vec<String>>,
    answer_prefix: Option<String>,
    index: usize,
    current_offer: Vec<String>,
    context_history: Vec<String>,
}

impl<S: SimilarityScorer> OpenEndedDungeonMaster<S> {
    pub fn new(
        contexts: Vec<String>,
        ground_truths: Vec<String>,
        preferences: Option<Vec<String>>,
        scorer: S,
    ) -> DomainResult<Self> {
        if contexts.is_empty() {
            return Err(DomainError::DatasetExhausted { index: 0, len: 0 });
        }
        check_len("ground_truths", contexts.len(), ground_truths.len())?;
        if let Some(prefs) = &preferences {
            check_len("preferences", contexts.len(), prefs.len())?;
        }

        Ok(Self {
            scorer,
            contexts,
            ground_truths,
            preferences,
            answer_prefix: None,
            index: 0,
            current_offer: Vec::new(),
            context_history: Vec::new(),
        })
    }

    /// Extract answers following `"<prefix>: "` in candidate offers.
    pub fn with_answer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.answer_prefix = Some(prefix.into());
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn current_context(&self) -> &str {
        &self.contexts[self.index]
    }

    pub fn current_ground_truth(&self) -> &str {
        &self.ground_truths[self.index]
    }

    /// Preference attached to the current context, empty when the dataset has none.
    pub fn current_preference(&self) -> &str {
        self.preferences
            .as_ref()
            .map(|p| p[self.index].as_str())
            .unwrap_or("")
    }

    pub fn context_history(&self) -> &[String] {
        &self.context_history
    }

    /// Clean the candidates and delegate scoring against `ground_truth`.
    ///
    /// With an `answer_prefix`, each candidate is reduced to the text after
    /// `"<prefix>: "` up to the end of that line; candidates without the marker
    /// are kept whole. One pair of wrapping double quotes is stripped.
    #[instrument(level = "debug", skip(self, candidates, ground_truth))]
    pub fn evaluate_offer(
        &mut self,
        candidates: &[String],
        ground_truth: &str,
        answer_prefix: Option<&str>,
    ) -> ApplicationResult<SimilarityScore> {
        let marker = answer_prefix
            .map(|prefix| Regex::new(&format!("{}: ([^\n]*)", regex::escape(prefix))))
            .transpose()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "compile answer prefix".into(),
                source: Box::new(e),
            })?;

        let cleaned: Vec<String> = candidates
            .iter()
            .map(|candidate| {
                let extracted = marker
                    .as_ref()
                    .and_then(|re| re.captures(candidate))
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or(candidate);
                strip_quotes(extracted).to_string()
            })
            .collect();
        debug!(candidates = cleaned.len(), "scoring offer");

        let score = self
            .scorer
            .score(&cleaned, ground_truth)
            .map_err(|e| ApplicationError::collaborator("similarity scoring", e))?;
        self.current_offer = cleaned;
        Ok(score)
    }
}

impl<S: SimilarityScorer> DungeonMaster for OpenEndedDungeonMaster<S> {
    type Offer = [String];
    type Verdict = SimilarityScore;

    fn current_context_text(&self) -> String {
        self.current_context().to_string()
    }

    fn current_offer_text(&self) -> String {
        self.current_offer.join("\n")
    }

    /// Fails with [`DomainError::DatasetExhausted`] past the last context; state is unchanged then.
    fn advance_context(&mut self) -> ApplicationResult<()> {
        let next = self.index + 1;
        if next >= self.contexts.len() {
            return Err(DomainError::DatasetExhausted {
                index: next,
                len: self.contexts.len(),
            }
            .into());
        }
        self.context_history.push(self.contexts[self.index].clone());
        self.index = next;
        Ok(())
    }

    fn evaluate(&mut self, offer: &[String]) -> ApplicationResult<SimilarityScore> {
        let ground_truth = self.current_ground_truth().to_string();
        let prefix = self.answer_prefix.clone();
        self.evaluate_offer(offer, &ground_truth, prefix.as_deref())
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> DomainResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DomainError::DatasetMismatch {
            field,
            expected,
            actual,
        })
    }
}

fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}
