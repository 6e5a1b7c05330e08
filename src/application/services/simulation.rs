//! Simulation driver
//!
//! Plays rounds against a dungeon master: capture the context, make an offer,
//! evaluate it, record the round and advance.

use std::borrow::Borrow;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::application::dungeon_master::DungeonMaster;
use crate::application::services::agents::{OfferGenerator, OpenEndedAgent};
use crate::application::services::categorical::CategoricalDungeonMaster;
use crate::application::services::open_ended::{
    OpenEndedDungeonMaster, SimilarityScore, SimilarityScorer,
};
use crate::application::services::stats::outcome_value;
use crate::application::ApplicationResult;
use crate::domain::{Context, EvaluationOutcome, EvaluationRecord, Offer, World};

/// Position-aligned history of a categorical simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub contexts: Vec<Context>,
    pub offers: Vec<Offer>,
    pub results: Vec<EvaluationOutcome>,
}

impl SimulationReport {
    fn with_capacity(rounds: usize) -> Self {
        Self {
            contexts: Vec::with_capacity(rounds),
            offers: Vec::with_capacity(rounds),
            results: Vec::with_capacity(rounds),
        }
    }

    fn push(&mut self, context: Context, offer: Offer, outcome: EvaluationOutcome) {
        self.contexts.push(context);
        self.offers.push(offer);
        self.results.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rounds as records, in play order.
    pub fn records(&self) -> impl Iterator<Item = EvaluationRecord> + '_ {
        self.contexts
            .iter()
            .zip(&self.offers)
            .zip(&self.results)
            .map(|((context, offer), outcome)| EvaluationRecord {
                context: context.clone(),
                offer: offer.clone(),
                outcome: *outcome,
            })
    }

    /// 1.0 per accepted round, 0.0 otherwise.
    pub fn outcome_values(&self) -> Vec<f64> {
        self.results.iter().copied().map(outcome_value).collect()
    }

    /// Fraction of accepted rounds; 0 for an empty report.
    pub fn acceptance_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let accepted = self.results.iter().filter(|r| r.is_accepted()).count();
        accepted as f64 / self.results.len() as f64
    }
}

/// Run `iterations` rounds with uniformly drawn offers.
///
/// Offers come from the dungeon master's own random stream, so a seed fixes
/// contexts, offers and results together. With `record_trace` each round is
/// logged as `"<context> <offer> <RESULT>"`.
#[instrument(level = "debug", skip(dm), fields(seed = dm.seed()))]
pub fn simulate(
    dm: &mut CategoricalDungeonMaster,
    iterations: usize,
    record_trace: bool,
) -> ApplicationResult<SimulationReport> {
    let mut report = SimulationReport::with_capacity(iterations);

    for _ in 0..iterations {
        let context = dm.current_context().clone();
        let items = dm.draw_offer();
        let offer_text = dm.offer_text(&items);
        let outcome = dm.evaluate_offer(&offer_text, None);

        if record_trace {
            info!(
                "{} {} {}",
                dm.current_context_text(),
                dm.current_offer_text(),
                outcome
            );
        }
        report.push(context, items.into_iter().collect(), outcome);
        dm.advance_context()?;
    }

    debug!(rounds = report.len(), rate = report.acceptance_rate(), "simulation done");
    Ok(report)
}

/// Run `iterations` rounds with offers from `agent`.
///
/// The agent sees the rendered context as its prompt. After each round the
/// line `"<context> <offer> <RESULT>"` is appended to its memory.
#[instrument(level = "debug", skip(dm, agent), fields(agent = agent.name()))]
pub fn simulate_with_agent<A: OfferGenerator + ?Sized>(
    dm: &mut CategoricalDungeonMaster,
    agent: &mut A,
    iterations: usize,
    record_trace: bool,
) -> ApplicationResult<SimulationReport> {
    let mut report = SimulationReport::with_capacity(iterations);

    for _ in 0..iterations {
        let context = dm.current_context().clone();
        let prompt = dm.current_context_text();
        let offer_text = agent.make_offer(dm.offer_categories(), &prompt)?;
        let outcome = dm.evaluate_offer(&offer_text, None);

        let line = format!("{} {} {}", prompt, offer_text.trim(), outcome);
        if record_trace {
            info!("{}", line);
        }
        agent.update_memory(&line, false);
        report.push(context, dm.current_offer().clone(), outcome);
        dm.advance_context()?;
    }

    Ok(report)
}

/// Independent simulations, one dungeon master per seed, run in parallel.
///
/// Each report equals what [`simulate`] returns for that seed alone.
#[instrument(level = "debug", skip(world))]
pub fn simulate_batch(
    world: &World,
    seeds: &[u64],
    iterations: usize,
    allow_unsatisfiable: bool,
) -> ApplicationResult<Vec<(u64, SimulationReport)>> {
    seeds
        .par_iter()
        .map(|&seed| -> ApplicationResult<(u64, SimulationReport)> {
            let mut dm = CategoricalDungeonMaster::new(world.clone(), seed, allow_unsatisfiable)?;
            let report = simulate(&mut dm, iterations, false)?;
            Ok((seed, report))
        })
        .collect()
}

/// Play `rounds` rounds against any dungeon master.
///
/// `make_offer` receives the rendered context. The dungeon master advances
/// between rounds, not after the last one.
pub fn play<D, O, F>(dm: &mut D, rounds: usize, mut make_offer: F) -> ApplicationResult<Vec<D::Verdict>>
where
    D: DungeonMaster,
    O: Borrow<D::Offer>,
    F: FnMut(&str) -> ApplicationResult<O>,
{
    let mut verdicts = Vec::with_capacity(rounds);
    for round in 0..rounds {
        if round > 0 {
            dm.advance_context()?;
        }
        let context = dm.current_context_text();
        let offer = make_offer(context.as_str())?;
        verdicts.push(dm.evaluate(offer.borrow())?);
    }
    Ok(verdicts)
}

/// Play an open-ended agent through the rest of the dataset, or `max_rounds`
/// contexts if fewer remain.
pub fn play_open_ended<S, A>(
    dm: &mut OpenEndedDungeonMaster<S>,
    agent: &mut A,
    max_rounds: usize,
) -> ApplicationResult<Vec<SimilarityScore>>
where
    S: SimilarityScorer,
    A: OpenEndedAgent + ?Sized,
{
    let rounds = max_rounds.min(dm.len() - dm.index());
    play(dm, rounds, |prompt| agent.make_offer(prompt).map(|offer| vec![offer]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::agents::RandomAgent;
    use crate::domain::{CategoryList, PreferenceMap};

    fn world() -> World {
        World::from_lists(
            vec![
                CategoryList::from_iter(["Tom", "Cam"]),
                CategoryList::from_iter(["noon", "midnight"]),
            ],
            vec![
                CategoryList::from_iter(["hot", "cold"]),
                CategoryList::from_iter(["soup", "sandwich"]),
            ],
            "You find {} at {}.",
            "You offer a {} {}.",
            PreferenceMap::from_iter([("hot", ["noon"]), ("cold", ["midnight"])]),
        )
    }

    #[test]
    fn given_iterations_when_simulating_then_vectors_are_aligned() {
        let mut dm = CategoricalDungeonMaster::new(world(), 5, false).unwrap();

        let report = simulate(&mut dm, 12, false).unwrap();

        assert_eq!(report.len(), 12);
        assert_eq!(report.contexts.len(), 12);
        assert_eq!(report.offers.len(), 12);
        assert_eq!(report.records().count(), 12);
        assert_eq!(dm.context_history(), &report.contexts[..]);
    }

    #[test]
    fn given_drawn_offers_when_simulating_then_never_invalid() {
        let mut dm = CategoricalDungeonMaster::new(world(), 11, false).unwrap();

        let report = simulate(&mut dm, 30, false).unwrap();

        assert!(report
            .results
            .iter()
            .all(|r| *r != EvaluationOutcome::InvalidOffer));
    }

    #[test]
    fn given_seeds_when_batching_then_matches_sequential_runs() {
        let seeds = [1, 2, 3];

        let batch = simulate_batch(&world(), &seeds, 20, false).unwrap();

        for (seed, report) in batch {
            let mut dm = CategoricalDungeonMaster::new(world(), seed, false).unwrap();
            assert_eq!(report, simulate(&mut dm, 20, false).unwrap());
        }
    }

    #[test]
    fn given_random_agent_when_simulating_then_offers_are_recorded() {
        let mut dm = CategoricalDungeonMaster::new(world(), 5, false).unwrap();
        let mut agent = RandomAgent::new("I offer a {} {}", 5);

        let report = simulate_with_agent(&mut dm, &mut agent, 8, false).unwrap();

        assert_eq!(report.len(), 8);
        assert!(report.offers.iter().all(Offer::is_complete));
    }

    #[test]
    fn given_zero_rounds_when_playing_then_no_verdicts_and_no_advance() {
        let mut dm = CategoricalDungeonMaster::new(world(), 5, false).unwrap();

        let verdicts = play(&mut dm, 0, |_| Ok(String::from("hot soup"))).unwrap();

        assert!(verdicts.is_empty());
        assert!(dm.context_history().is_empty());
    }

    #[test]
    fn given_empty_report_when_rating_then_zero() {
        assert_eq!(SimulationReport::default().acceptance_rate(), 0.0);
    }
}
