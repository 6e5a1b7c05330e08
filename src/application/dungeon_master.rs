//! The dungeon master role.
//!
//! A dungeon master holds the current context, judges offers made in it and
//! advances to the next context. The categorical and open-ended variants
//! implement it with their own offer and verdict types.

use crate::application::ApplicationResult;

pub trait DungeonMaster {
    /// What an offer looks like to this dungeon master.
    type Offer: ?Sized;
    /// What evaluating an offer produces.
    type Verdict;

    /// Current context rendered for the offer-maker.
    fn current_context_text(&self) -> String;

    /// Most recently evaluated offer rendered as text.
    fn current_offer_text(&self) -> String;

    /// Record the current context and move to the next one.
    fn advance_context(&mut self) -> ApplicationResult<()>;

    /// Judge an offer against the current context.
    fn evaluate(&mut self, offer: &Self::Offer) -> ApplicationResult<Self::Verdict>;
}
