//! Preference satisfiability check.
//!
//! Prunes the context combination tree with every context item a preference
//! covers. When the tree collapses to the root, or a whole category level has
//! been eliminated, every context is considered satisfiable.
//!
//! This is a heuristic: pruning stops at the first collapse, so an elimination
//! order can end the check while an uncovered combination still exists.

use tracing::{debug, info, instrument, warn};

use crate::domain::arena::ComboTree;
use crate::domain::entities::{CategoryList, PreferenceMap};
use crate::domain::error::{DomainError, DomainResult};

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// No unsatisfiable context combination remains
    pub satisfiable: bool,
    /// Context combinations left after pruning (unsatisfiable ones when `satisfiable` is false)
    pub remaining: Vec<Vec<String>>,
    /// The check was skipped on request
    pub skipped: bool,
}

impl ValidationReport {
    fn skipped() -> Self {
        Self {
            satisfiable: true,
            remaining: Vec::new(),
            skipped: true,
        }
    }
}

/// Check that every context combination has at least one satisfying preference.
#[instrument(level = "debug", skip_all, fields(preferences = preferences.len()))]
pub fn validate(
    possible_contexts: &[CategoryList],
    preferences: &PreferenceMap,
    allow_unsatisfiable: bool,
) -> DomainResult<ValidationReport> {
    if allow_unsatisfiable {
        debug!("validation skipped");
        return Ok(ValidationReport::skipped());
    }

    let mut tree = ComboTree::build(possible_contexts)?;
    let initial_depth = tree.depth();
    let mut depth = initial_depth;
    let mut leaf_count = tree.leaf_count();

    'prune: for (offer_item, context_items) in preferences.iter() {
        for context_item in context_items {
            tree = tree.without_value(context_item);
            leaf_count = tree.leaf_count();
            debug!(offer_item, context_item, leaf_count, "pruned");
            if leaf_count <= 1 {
                break 'prune;
            }
            depth = tree.depth();
            if depth < initial_depth {
                // a whole category level is gone
                break 'prune;
            }
        }
    }

    let satisfiable = leaf_count == 1 || depth < initial_depth;
    let remaining = tree.paths();
    if satisfiable {
        info!("All contexts can be satisfied by the given preferences.");
    } else {
        warn!(unsatisfiable = remaining.len(), "there are unsatisfiable contexts");
    }

    Ok(ValidationReport {
        satisfiable,
        remaining,
        skipped: false,
    })
}

/// Like [`validate`], but an unsatisfiable preference set is an error carrying the
/// unreachable combinations.
pub fn ensure_satisfiable(
    possible_contexts: &[CategoryList],
    preferences: &PreferenceMap,
    allow_unsatisfiable: bool,
) -> DomainResult<ValidationReport> {
    let report = validate(possible_contexts, preferences, allow_unsatisfiable)?;
    if report.satisfiable {
        Ok(report)
    } else {
        Err(DomainError::UnsatisfiablePreferences {
            paths: report.remaining,
        })
    }
}
