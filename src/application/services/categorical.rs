//! Categorical dungeon master
//!
//! Contexts and offers are drawn from fixed category lists. An offer is
//! accepted when it names a preferred item and the active context holds one of
//! the context items that preference applies to.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, trace};

use crate::application::dungeon_master::DungeonMaster;
use crate::application::ApplicationResult;
use crate::domain::{
    ensure_satisfiable, extract_properties, fill_positional, strip_justification, CategoryList,
    CategorySet, Context, EvaluationOutcome, Offer, PreferenceMap, World,
};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 256;

/// Dungeon master over fixed context and offer categories.
///
/// All randomness comes from one seeded stream, so the sequence of contexts
/// (and of offers drawn with [`CategoricalDungeonMaster::draw_offer`]) is
/// reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct CategoricalDungeonMaster {
    world: World,
    possible_contexts: Vec<CategoryList>,
    possible_offers: Vec<CategoryList>,
    seed: u64,
    rng: ChaCha8Rng,
    current_context: Context,
    current_offer: Offer,
    context_history: Vec<Context>,
}

impl CategoricalDungeonMaster {
    /// Create a dungeon master and draw its first context.
    ///
    /// The world is cross-checked, and unless `allow_unsatisfiable` is set,
    /// every context combination must be satisfiable by some preference.
    #[instrument(level = "debug", skip(world))]
    pub fn new(world: World, seed: u64, allow_unsatisfiable: bool) -> ApplicationResult<Self> {
        world.check()?;
        let possible_contexts = world.context_categories.lists();
        let possible_offers = world.offer_categories.lists();
        ensure_satisfiable(&possible_contexts, &world.preferences, allow_unsatisfiable)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let current_context: Context = draw(&possible_contexts, &mut rng).into_iter().collect();
        debug!(%current_context, "initial context");

        Ok(Self {
            world,
            possible_contexts,
            possible_offers,
            seed,
            rng,
            current_context,
            current_offer: Offer::default(),
            context_history: Vec::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn possible_contexts(&self) -> &[CategoryList] {
        &self.possible_contexts
    }

    pub fn possible_offers(&self) -> &[CategoryList] {
        &self.possible_offers
    }

    pub fn offer_categories(&self) -> &CategorySet {
        &self.world.offer_categories
    }

    pub fn preferences(&self) -> &PreferenceMap {
        &self.world.preferences
    }

    pub fn current_context(&self) -> &Context {
        &self.current_context
    }

    pub fn current_offer(&self) -> &Offer {
        &self.current_offer
    }

    /// Contexts already played, oldest first.
    pub fn context_history(&self) -> &[Context] {
        &self.context_history
    }

    /// Draw one uniform item per offer category from the dungeon's random stream.
    pub fn draw_offer(&mut self) -> Vec<String> {
        draw(&self.possible_offers, &mut self.rng)
    }

    /// Render offer items with the offer template.
    pub fn offer_text(&self, items: &[String]) -> String {
        fill_positional(&self.world.offer_format, items)
    }

    /// Evaluate offer text against `specific_context`, or the current context when None.
    ///
    /// Any justification after "because" is ignored when extracting offer items.
    /// Text missing an item for some offer category is an invalid offer.
    /// Preference keys are matched as substrings of the full text.
    #[instrument(level = "debug", skip(self, specific_context))]
    pub fn evaluate_offer(
        &mut self,
        offer_text: &str,
        specific_context: Option<&Context>,
    ) -> EvaluationOutcome {
        self.current_offer = extract_properties(
            strip_justification(offer_text),
            &self.possible_offers,
        );
        if !self.current_offer.is_complete() {
            debug!(offer = %self.current_offer, "invalid offer");
            return EvaluationOutcome::InvalidOffer;
        }

        let context = specific_context.unwrap_or(&self.current_context);
        let accepted = self.world.preferences.iter().any(|(offer_item, context_items)| {
            offer_text.contains(offer_item)
                && context
                    .values()
                    .iter()
                    .any(|value| context_items.contains(value))
        });

        if accepted {
            EvaluationOutcome::Accepted
        } else {
            EvaluationOutcome::Rejected
        }
    }
}

impl DungeonMaster for CategoricalDungeonMaster {
    type Offer = str;
    type Verdict = EvaluationOutcome;

    fn current_context_text(&self) -> String {
        fill_positional(&self.world.context_format, self.current_context.values())
    }

    fn current_offer_text(&self) -> String {
        fill_positional(&self.world.offer_format, &self.current_offer.values()[..])
    }

    fn advance_context(&mut self) -> ApplicationResult<()> {
        let next: Context = draw(&self.possible_contexts, &mut self.rng)
            .into_iter()
            .collect();
        trace!(%next, "advancing context");
        let previous = std::mem::replace(&mut self.current_context, next);
        self.context_history.push(previous);
        Ok(())
    }

    fn evaluate(&mut self, offer: &str) -> ApplicationResult<EvaluationOutcome> {
        Ok(self.evaluate_offer(offer, None))
    }
}

/// One independent uniform choice per list.
fn draw(lists: &[CategoryList], rng: &mut ChaCha8Rng) -> Vec<String> {
    lists
        .iter()
        .map(|list| list.choose(&mut *rng).cloned().unwrap_or_default())
        .collect()
}
