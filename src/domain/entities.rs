//! Domain entities: core data structures

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::{DomainError, DomainResult, MismatchKind};

/// Word that separates an offer from its free-text justification.
pub const JUSTIFICATION_DELIMITER: &str = "because";

/// Template placeholder filled positionally.
pub const PLACEHOLDER: &str = "{}";

/// Mutually exclusive options for one slot of a context or an offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryList(Vec<String>);

impl CategoryList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }
}

impl Deref for CategoryList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for CategoryList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Named category lists in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    entries: Vec<(String, CategoryList)>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category, replacing an existing one of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, list: CategoryList) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = list,
            None => self.entries.push((name, list)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CategoryList> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryList)> {
        self.entries.iter().map(|(n, l)| (n.as_str(), l))
    }

    /// Positional lists, as consumed by the tree and the dungeon masters.
    pub fn lists(&self) -> Vec<CategoryList> {
        self.entries.iter().map(|(_, l)| l.clone()).collect()
    }

    /// True if any category holds `item`.
    pub fn contains_item(&self, item: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, l)| l.iter().any(|i| i == item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for CategorySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let OrderedEntries(entries) = OrderedEntries::deserialize(deserializer)?;
        Ok(Self { entries })
    }
}

/// Situational tuple presented to the offer-maker, one value per context category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context(Vec<String>);

impl Context {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Context {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Offer slots as extracted from offer text; a slot is None when no item matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Offer(Vec<Option<String>>);

impl Offer {
    pub fn new(slots: Vec<Option<String>>) -> Self {
        Self(slots)
    }

    pub fn slots(&self) -> &[Option<String>] {
        &self.0
    }

    /// Every slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Slot values, absent slots rendered empty.
    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.as_deref().unwrap_or("")).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Offer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| Some(s.into())).collect())
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values().join(", "))
    }
}

/// Offer item → context items under which the offer is accepted.
///
/// Keeps insertion order; validation prunes in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceMap {
    entries: Vec<(String, Vec<String>)>,
}

impl PreferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preference, replacing an existing key in place.
    pub fn insert(&mut self, offer_item: impl Into<String>, context_items: Vec<String>) {
        let key = offer_item.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = context_items,
            None => self.entries.push((key, context_items)),
        }
    }

    pub fn get(&self, offer_item: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == offer_item)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V, S> FromIterator<(K, V)> for PreferenceMap
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v.into_iter().map(Into::into).collect());
        }
        map
    }
}

impl<'de> Deserialize<'de> for PreferenceMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let OrderedEntries(entries) = OrderedEntries::deserialize(deserializer)?;
        Ok(Self { entries })
    }
}

/// Map entries in document order.
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of named string lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// The rules of a categorical dungeon: what contexts and offers look like and
/// which offers each context accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct World {
    pub context_format: String,
    pub offer_format: String,
    pub context_categories: CategorySet,
    pub offer_categories: CategorySet,
    #[serde(default)]
    pub preferences: PreferenceMap,
}

impl World {
    /// Build a world from positional lists; categories are named by position.
    pub fn from_lists(
        context_lists: Vec<CategoryList>,
        offer_lists: Vec<CategoryList>,
        context_format: impl Into<String>,
        offer_format: impl Into<String>,
        preferences: PreferenceMap,
    ) -> Self {
        fn named(prefix: &str, lists: Vec<CategoryList>) -> CategorySet {
            let mut set = CategorySet::new();
            for (i, list) in lists.into_iter().enumerate() {
                set.insert(format!("{prefix}_{i}"), list);
            }
            set
        }

        Self {
            context_format: context_format.into(),
            offer_format: offer_format.into(),
            context_categories: named("context", context_lists),
            offer_categories: named("offer", offer_lists),
            preferences,
        }
    }

    /// Cross-check categories, templates and preferences.
    ///
    /// Every preference key must be an item of some offer category and every
    /// preference value an item of some context category.
    pub fn check(&self) -> DomainResult<()> {
        for (categories, format) in [
            (&self.context_categories, &self.context_format),
            (&self.offer_categories, &self.offer_format),
        ] {
            if categories.is_empty() {
                return Err(DomainError::EmptyCategories);
            }
            if let Some((name, _)) = categories.iter().find(|(_, l)| l.is_empty()) {
                return Err(DomainError::EmptyCategory(name.to_string()));
            }
            let expected = format.matches(PLACEHOLDER).count();
            if expected != categories.len() {
                return Err(DomainError::TemplateArity {
                    expected,
                    actual: categories.len(),
                });
            }
        }

        for (offer_item, context_items) in self.preferences.iter() {
            if !self.offer_categories.contains_item(offer_item) {
                return Err(DomainError::ConfigMismatch {
                    kind: MismatchKind::OfferItem,
                    item: offer_item.to_string(),
                });
            }
            if let Some(missing) = context_items
                .iter()
                .find(|v| !self.context_categories.contains_item(v))
            {
                return Err(DomainError::ConfigMismatch {
                    kind: MismatchKind::ContextItem,
                    item: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Result of evaluating one categorical offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationOutcome {
    Accepted,
    Rejected,
    /// The offer text lacked an item for at least one offer category
    InvalidOffer,
}

impl EvaluationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EvaluationOutcome::Accepted)
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationOutcome::Accepted => write!(f, "ACCEPTED"),
            EvaluationOutcome::Rejected => write!(f, "REJECTED"),
            EvaluationOutcome::InvalidOffer => write!(f, "INVALID OFFER"),
        }
    }
}

/// One simulation round. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRecord {
    pub context: Context,
    pub offer: Offer,
    pub outcome: EvaluationOutcome,
}

/// Fill `{}` placeholders positionally.
///
/// The number of values must match the number of placeholders.
pub fn fill_template<S: AsRef<str>>(template: &str, values: &[S]) -> DomainResult<String> {
    let expected = template.matches(PLACEHOLDER).count();
    if expected != values.len() {
        return Err(DomainError::TemplateArity {
            expected,
            actual: values.len(),
        });
    }

    let mut filled = template.to_string();
    for value in values {
        filled = filled.replacen(PLACEHOLDER, value.as_ref(), 1);
    }
    Ok(filled)
}

/// Fill `{}` placeholders positionally without checking arity.
///
/// Surplus placeholders stay in place, surplus values are ignored.
pub fn fill_positional<S: AsRef<str>>(template: &str, values: &[S]) -> String {
    let mut filled = template.to_string();
    for value in values {
        if !filled.contains(PLACEHOLDER) {
            break;
        }
        filled = filled.replacen(PLACEHOLDER, value.as_ref(), 1);
    }
    filled
}

/// Text before the first justification delimiter.
pub fn strip_justification(offer_text: &str) -> &str {
    offer_text
        .split(JUSTIFICATION_DELIMITER)
        .next()
        .unwrap_or(offer_text)
}

/// For each category, the first of its items that occurs anywhere in `statement`.
pub fn extract_properties(statement: &str, categories: &[CategoryList]) -> Offer {
    Offer::new(
        categories
            .iter()
            .map(|category| {
                category
                    .iter()
                    .find(|item| statement.contains(item.as_str()))
                    .cloned()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn offer_categories() -> Vec<CategoryList> {
        vec![
            CategoryList::from_iter(["hot", "cold"]),
            CategoryList::from_iter(["soup", "sandwich"]),
        ]
    }

    #[rstest]
    #[case("You find {} at {}.", &["Tom", "noon"], "You find Tom at noon.")]
    #[case("no blanks", &[], "no blanks")]
    fn given_matching_arity_when_filling_then_replaces_in_order(
        #[case] template: &str,
        #[case] values: &[&str],
        #[case] expected: &str,
    ) {
        assert_eq!(fill_template(template, values).unwrap(), expected);
    }

    #[test]
    fn given_wrong_arity_when_filling_then_errors() {
        let result = fill_template("You offer a {} {}.", &["hot"]);
        assert_eq!(
            result,
            Err(DomainError::TemplateArity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn given_short_value_list_when_filling_positionally_then_keeps_blanks() {
        assert_eq!(fill_positional("a {} {}", &["hot"]), "a hot {}");
        assert_eq!(fill_positional("a {}", &["hot", "soup"]), "a hot");
    }

    fn world() -> World {
        World::from_lists(
            vec![
                CategoryList::from_iter(["Tom", "Cam"]),
                CategoryList::from_iter(["noon", "midnight"]),
            ],
            offer_categories(),
            "You find {} at {}.",
            "You offer a {} {}.",
            PreferenceMap::from_iter([("hot", ["noon"]), ("cold", ["midnight"])]),
        )
    }

    #[test]
    fn given_consistent_world_when_checking_then_ok() {
        assert_eq!(world().check(), Ok(()));
    }

    #[test]
    fn given_unknown_preference_key_when_checking_then_reports_it() {
        let mut world = world();
        world.preferences.insert("lukewarm", vec!["noon".into()]);

        assert_eq!(
            world.check(),
            Err(DomainError::ConfigMismatch {
                kind: MismatchKind::OfferItem,
                item: "lukewarm".into()
            })
        );
    }

    #[test]
    fn given_unknown_preference_value_when_checking_then_reports_it() {
        let mut world = world();
        world.preferences.insert("hot", vec!["dawn".into()]);

        let err = world.check().unwrap_err();
        assert_eq!(err.to_string(), "dawn not in context categories");
    }

    #[test]
    fn given_template_arity_mismatch_when_checking_then_errors() {
        let mut world = world();
        world.context_format = "You find {}.".into();

        assert_eq!(
            world.check(),
            Err(DomainError::TemplateArity {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn given_empty_category_when_checking_then_names_it() {
        let mut world = world();
        world.offer_categories.insert("offer_1", CategoryList::default());

        assert_eq!(
            world.check(),
            Err(DomainError::EmptyCategory("offer_1".into()))
        );
    }

    #[test]
    fn given_justification_when_stripping_then_keeps_prefix() {
        assert_eq!(
            strip_justification("a hot soup because it is noon"),
            "a hot soup "
        );
        assert_eq!(strip_justification("a hot soup"), "a hot soup");
    }

    #[test]
    fn given_statement_when_extracting_then_first_match_per_category() {
        let offer = extract_properties("You offer a cold sandwich.", &offer_categories());
        assert_eq!(
            offer,
            Offer::new(vec![Some("cold".into()), Some("sandwich".into())])
        );
        assert!(offer.is_complete());
    }

    #[test]
    fn given_missing_item_when_extracting_then_slot_is_absent() {
        let offer = extract_properties("You offer a lukewarm soup.", &offer_categories());
        assert_eq!(offer.slots()[0], None);
        assert!(!offer.is_complete());
        assert_eq!(offer.values(), vec!["", "soup"]);
    }

    #[test]
    fn given_duplicate_keys_when_inserting_preferences_then_order_is_kept() {
        let mut prefs = PreferenceMap::new();
        prefs.insert("hot", vec!["noon".into()]);
        prefs.insert("cold", vec!["midnight".into()]);
        prefs.insert("hot", vec!["dusk".into()]);

        let keys: Vec<_> = prefs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["hot", "cold"]);
        assert_eq!(prefs.get("hot"), Some(&["dusk".to_string()][..]));
    }

    #[test]
    fn given_outcomes_when_displaying_then_uses_result_labels() {
        assert_eq!(EvaluationOutcome::Accepted.to_string(), "ACCEPTED");
        assert_eq!(EvaluationOutcome::Rejected.to_string(), "REJECTED");
        assert_eq!(EvaluationOutcome::InvalidOffer.to_string(), "INVALID OFFER");
    }
}
