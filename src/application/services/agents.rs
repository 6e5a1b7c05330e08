//! Offer-making agents
//!
//! Categorical agents answer a rendered context with offer text; open-ended
//! agents answer a free-text prompt. LLM-backed agents render a prompt
//! template with named `{var}` slots and hand it to a [`LanguageModel`].

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{fill_template, CategorySet, JUSTIFICATION_DELIMITER};
use crate::infrastructure::traits::LanguageModel;

/// Justification appended by [`RandomAgent`].
pub const RANDOM_JUSTIFICATION: &str = "I chose randomly";

/// Summary an agent starts with before its first summarization.
pub const NO_SUMMARY: &str = "No summary available.";

/// Prompt used by [`PeriodicSummaryAgent`] to condense its history.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "Summarize the following set of encounters, \
creating a brief synopsis of what you have learned about the game.
Be logical about what information you are summarizing, and be as specific as you can \
about the correlations that you find.

Here is the set of encounters:
{context}
";

/// Makes offers in a categorical dungeon.
pub trait OfferGenerator {
    fn name(&self) -> &str;

    /// Produce offer text for the rendered context in `prompt`.
    fn make_offer(
        &mut self,
        offer_categories: &CategorySet,
        prompt: &str,
    ) -> ApplicationResult<String>;

    /// Append to (or with `replace`, overwrite) the agent's interaction memory.
    fn update_memory(&mut self, memory: &str, replace: bool);
}

/// Picks one uniform item per offer category and fills its response template.
pub struct RandomAgent {
    response_template: String,
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(response_template: impl Into<String>, seed: u64) -> Self {
        Self {
            response_template: response_template.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl OfferGenerator for RandomAgent {
    fn name(&self) -> &str {
        "RandomAgent"
    }

    /// Ignores the prompt. Fails when the template's placeholders do not match
    /// the number of categories (plus one for a `because` clause).
    fn make_offer(&mut self, offer_categories: &CategorySet, _prompt: &str) -> ApplicationResult<String> {
        let mut selections: Vec<String> = offer_categories
            .iter()
            .map(|(_, items)| items.choose(&mut self.rng).cloned().unwrap_or_default())
            .collect();
        if self.response_template.contains(JUSTIFICATION_DELIMITER) {
            selections.push(RANDOM_JUSTIFICATION.to_string());
        }
        Ok(fill_template(&self.response_template, &selections)?)
    }

    fn update_memory(&mut self, _memory: &str, _replace: bool) {}
}

/// Prompts a model with the initial prompt followed by the whole interaction history.
pub struct EntireHistoryAgent<M: LanguageModel> {
    model: M,
    initial_prompt: String,
    offer_template: String,
    chat_history: String,
}

impl<M: LanguageModel> EntireHistoryAgent<M> {
    pub fn new(model: M, initial_prompt: impl Into<String>, offer_template: impl Into<String>) -> Self {
        Self {
            model,
            initial_prompt: initial_prompt.into(),
            offer_template: offer_template.into(),
            chat_history: String::new(),
        }
    }

    pub fn chat_history(&self) -> &str {
        &self.chat_history
    }
}

impl<M: LanguageModel> OfferGenerator for EntireHistoryAgent<M> {
    fn name(&self) -> &str {
        "EntireHistoryAgent"
    }

    #[instrument(level = "debug", skip_all)]
    fn make_offer(&mut self, offer_categories: &CategorySet, prompt: &str) -> ApplicationResult<String> {
        let context = format!("{}\n{}", self.initial_prompt, self.chat_history);
        let rendered = render_offer_prompt(&self.offer_template, offer_categories, &context, prompt);
        complete(&self.model, &rendered)
    }

    fn update_memory(&mut self, memory: &str, replace: bool) {
        append_memory(&mut self.chat_history, memory, replace);
    }
}

/// Prompts a model with the initial prompt and a summary of the history that is
/// refreshed every `period` offers.
pub struct PeriodicSummaryAgent<M: LanguageModel> {
    model: M,
    initial_prompt: String,
    offer_template: String,
    summary_template: String,
    period: usize,
    chat_history: String,
    summary: String,
    offers_made: usize,
}

impl<M: LanguageModel> PeriodicSummaryAgent<M> {
    /// A `period` of 0 is treated as 1.
    pub fn new(
        model: M,
        initial_prompt: impl Into<String>,
        offer_template: impl Into<String>,
        period: usize,
    ) -> Self {
        Self {
            model,
            initial_prompt: initial_prompt.into(),
            offer_template: offer_template.into(),
            summary_template: DEFAULT_SUMMARY_TEMPLATE.to_string(),
            period: period.max(1),
            chat_history: String::new(),
            summary: NO_SUMMARY.to_string(),
            offers_made: 0,
        }
    }

    pub fn with_summary_template(mut self, template: impl Into<String>) -> Self {
        self.summary_template = template.into();
        self
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }
}

impl<M: LanguageModel> OfferGenerator for PeriodicSummaryAgent<M> {
    fn name(&self) -> &str {
        "PeriodicSummaryAgent"
    }

    #[instrument(level = "debug", skip_all, fields(offers_made = self.offers_made))]
    fn make_offer(&mut self, offer_categories: &CategorySet, prompt: &str) -> ApplicationResult<String> {
        let context = format!("{}\n{}", self.initial_prompt, self.summary);
        let rendered = render_offer_prompt(&self.offer_template, offer_categories, &context, prompt);
        let offer = complete(&self.model, &rendered)?;

        self.offers_made += 1;
        if self.offers_made % self.period == 0 {
            let request = render_named(&self.summary_template, &[("context", &self.chat_history)]);
            self.summary = complete(&self.model, &request)?;
            debug!(offers_made = self.offers_made, "summary refreshed");
        }
        Ok(offer)
    }

    fn update_memory(&mut self, memory: &str, replace: bool) {
        append_memory(&mut self.chat_history, memory, replace);
    }
}

/// One document of a user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileEntry {
    pub text: String,
    pub title: String,
}

impl ProfileEntry {
    fn render(&self) -> String {
        format!("article text: {}\narticle title: {}\n\n", self.text, self.title)
    }
}

/// Makes free-text offers in an open-ended dungeon.
pub trait OpenEndedAgent {
    fn name(&self) -> &str;

    fn make_offer(&mut self, prompt: &str) -> ApplicationResult<String>;

    /// Conversation memory placed after the initial prompt.
    fn update_internal_memory(&mut self, memory: &str, replace: bool);

    /// Reference documents for the current context. Agents that do not use
    /// them ignore the call.
    fn update_external_memory(&mut self, entries: Vec<ProfileEntry>, replace: bool);
}

/// Shared state of the LLM-backed open-ended agents.
struct PromptedModel<M> {
    model: M,
    initial_prompt: String,
    offer_template: String,
    chat_history: String,
}

impl<M: LanguageModel> PromptedModel<M> {
    fn new(model: M, initial_prompt: String, offer_template: String) -> Self {
        Self {
            model,
            initial_prompt,
            offer_template,
            chat_history: String::new(),
        }
    }

    fn offer(&self, vars: &[(&str, &str)]) -> ApplicationResult<String> {
        let context = format!("{}\n{}", self.initial_prompt, self.chat_history);
        let mut all = vec![("context", context.as_str())];
        all.extend_from_slice(vars);
        complete(&self.model, &render_named(&self.offer_template, &all))
    }

    fn remember(&mut self, memory: &str, replace: bool) {
        append_memory(&mut self.chat_history, memory, replace);
    }
}

/// Prompts a model without any reference documents.
pub struct NoHistoryAgent<M: LanguageModel> {
    inner: PromptedModel<M>,
}

impl<M: LanguageModel> NoHistoryAgent<M> {
    pub fn new(model: M, initial_prompt: impl Into<String>, offer_template: impl Into<String>) -> Self {
        Self {
            inner: PromptedModel::new(model, initial_prompt.into(), offer_template.into()),
        }
    }
}

impl<M: LanguageModel> OpenEndedAgent for NoHistoryAgent<M> {
    fn name(&self) -> &str {
        "NoHistoryAgent"
    }

    fn make_offer(&mut self, prompt: &str) -> ApplicationResult<String> {
        self.inner.offer(&[("prompt", prompt)])
    }

    fn update_internal_memory(&mut self, memory: &str, replace: bool) {
        self.inner.remember(memory, replace);
    }

    fn update_external_memory(&mut self, _entries: Vec<ProfileEntry>, _replace: bool) {}
}

/// Appends the first `k` profile documents to the prompt.
pub struct ProfileHistoryAgent<M: LanguageModel> {
    inner: PromptedModel<M>,
    profile: Vec<ProfileEntry>,
    k: usize,
}

impl<M: LanguageModel> ProfileHistoryAgent<M> {
    pub const DEFAULT_K: usize = 50;

    pub fn new(model: M, initial_prompt: impl Into<String>, offer_template: impl Into<String>) -> Self {
        Self {
            inner: PromptedModel::new(model, initial_prompt.into(), offer_template.into()),
            profile: Vec::new(),
            k: Self::DEFAULT_K,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl<M: LanguageModel> OpenEndedAgent for ProfileHistoryAgent<M> {
    fn name(&self) -> &str {
        "ProfileHistoryAgent"
    }

    fn make_offer(&mut self, prompt: &str) -> ApplicationResult<String> {
        let mut full = format!(
            "{}\n\nHere is the history of accepted texts and their corresponding titles:\n",
            prompt
        );
        for entry in self.profile.iter().take(self.k) {
            full.push_str(&entry.render());
        }
        self.inner.offer(&[("prompt", &full)])
    }

    fn update_internal_memory(&mut self, memory: &str, replace: bool) {
        self.inner.remember(memory, replace);
    }

    fn update_external_memory(&mut self, entries: Vec<ProfileEntry>, replace: bool) {
        if replace {
            self.profile = entries;
        } else {
            self.profile.extend(entries);
        }
    }
}

/// Fills `{retrieved_data}` with `k` documents drawn at random from all profiles.
///
/// Draws pick a profile uniformly, then a document within it.
pub struct RandomProfileAgent<M: LanguageModel> {
    inner: PromptedModel<M>,
    profiles: Vec<Vec<ProfileEntry>>,
    k: usize,
    rng: ChaCha8Rng,
}

impl<M: LanguageModel> RandomProfileAgent<M> {
    pub const DEFAULT_K: usize = 5;

    pub fn new(
        model: M,
        initial_prompt: impl Into<String>,
        offer_template: impl Into<String>,
        profiles: Vec<Vec<ProfileEntry>>,
        seed: u64,
    ) -> Self {
        Self {
            inner: PromptedModel::new(model, initial_prompt.into(), offer_template.into()),
            profiles,
            k: Self::DEFAULT_K,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl<M: LanguageModel> OpenEndedAgent for RandomProfileAgent<M> {
    fn name(&self) -> &str {
        "RandomProfileAgent"
    }

    fn make_offer(&mut self, prompt: &str) -> ApplicationResult<String> {
        let mut retrieved = String::new();
        for _ in 0..self.k {
            let entry = self
                .profiles
                .choose(&mut self.rng)
                .and_then(|profile| profile.choose(&mut self.rng));
            if let Some(entry) = entry {
                retrieved.push_str(&entry.render());
            }
        }
        self.inner
            .offer(&[("prompt", prompt), ("retrieved_data", &retrieved)])
    }

    fn update_internal_memory(&mut self, memory: &str, replace: bool) {
        self.inner.remember(memory, replace);
    }

    /// Profiles are fixed at construction.
    fn update_external_memory(&mut self, _entries: Vec<ProfileEntry>, _replace: bool) {}
}

/// Replace each `{name}` slot with its value. Unknown slots are left in place.
///
/// Slots are resolved in one pass over the template; substituted values are
/// never scanned again.
pub fn render_named(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Offer prompt with one slot per offer category (items joined by ", ") plus
/// `{context}` and `{prompt}`.
fn render_offer_prompt(
    template: &str,
    offer_categories: &CategorySet,
    context: &str,
    prompt: &str,
) -> String {
    let joined: Vec<(String, String)> = offer_categories
        .iter()
        .map(|(name, items)| (name.to_string(), items.join(", ")))
        .collect();
    let mut vars: Vec<(&str, &str)> = joined
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();
    vars.push(("context", context));
    vars.push(("prompt", prompt));
    render_named(template, &vars)
}

fn complete<M: LanguageModel>(model: &M, prompt: &str) -> ApplicationResult<String> {
    model
        .complete(prompt)
        .map_err(|e| ApplicationError::collaborator("language model", e))
}

fn append_memory(history: &mut String, memory: &str, replace: bool) {
    if replace {
        *history = memory.to_string();
    } else {
        history.push('\n');
        history.push_str(memory);
    }
}
