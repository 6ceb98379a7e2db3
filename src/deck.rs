//! Deck building from an owned collection, substituting similar cards for
//! ones the collection can't supply.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::color::{InkColor, InkSet};
use crate::error::{DeckError, FinderError};
use crate::finder::CardFinder;
use crate::names::sanitize_name;
use crate::similarity::Score;

/// Most copies of one card a deck may hold.
pub const MAX_COPIES: u32 = 4;

/// Most distinct ink colors a deck may use.
pub const MAX_DECK_COLORS: usize = 2;

/// Requested cards in decklist order, keyed by sanitized name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Decklist {
    entries: Vec<(String, u32)>,
}

impl Decklist {
    /// Parse `"<quantity> <card name>"` lines. Blank lines are skipped and a
    /// repeated name adds to its first occurrence; a merged quantity that
    /// overflows is an invalid line.
    pub fn parse(text: &str) -> Result<Self, DeckError> {
        let mut decklist = Decklist::default();
        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let invalid = || DeckError::InvalidLine {
                line: number + 1,
                text: line.to_string(),
            };
            let (quantity, name) = line.split_once(char::is_whitespace).ok_or_else(invalid)?;
            let quantity: u32 = quantity.parse().map_err(|_| invalid())?;
            let name = sanitize_name(name);
            if name.is_empty() {
                return Err(invalid());
            }
            if !decklist.add(name, quantity) {
                return Err(invalid());
            }
        }
        Ok(decklist)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Returns false, changing nothing, if the merged quantity overflows.
    fn add(&mut self, name: String, quantity: u32) -> bool {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, total)) => match total.checked_add(quantity) {
                Some(sum) => {
                    *total = sum;
                    true
                }
                None => false,
            },
            None => {
                self.entries.push((name, quantity));
                true
            }
        }
    }

    pub fn entries(&self) -> &[(String, u32)] {
        &self.entries
    }

    /// Whether `name` (sanitized first) is one of the requested cards.
    pub fn contains(&self, name: &str) -> bool {
        let name = sanitize_name(name);
        self.entries.iter().any(|(existing, _)| *existing == name)
    }

    pub fn total_cards(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |sum, (_, quantity)| sum.saturating_add(*quantity))
    }

    /// Entries keyed by the source's canonical name, merged in first-seen
    /// order. Names the source doesn't know keep their sanitized form.
    fn resolve(&self, source: &dyn CandidateSource) -> Vec<(String, u32)> {
        let mut resolved: Vec<(String, u32)> = Vec::with_capacity(self.entries.len());
        for (name, quantity) in &self.entries {
            let key = source.canonical_name(name).unwrap_or_else(|| name.clone());
            match resolved.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, total)) => *total = total.saturating_add(*quantity),
                None => resolved.push((key, *quantity)),
            }
        }
        resolved
    }
}

/// Owned copies per sanitized card name. Counts only go down during a
/// substitution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collection {
    counts: HashMap<String, u32>,
}

impl Collection {
    /// Names are sanitized and zero counts dropped.
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut collection = Collection::default();
        for (name, count) in counts {
            if count == 0 {
                continue;
            }
            collection.add(sanitize_name(name.as_ref()), count);
        }
        collection
    }

    fn add(&mut self, name: String, count: u32) {
        let slot = self.counts.entry(name).or_default();
        *slot = slot.saturating_add(count);
    }

    /// Re-key every count under the name `resolve` maps it to, merging
    /// counts that land on the same key. Unresolved names are kept as is.
    pub fn canonicalize(&mut self, resolve: impl Fn(&str) -> Option<String>) {
        for (name, count) in std::mem::take(&mut self.counts) {
            let key = resolve(&name).unwrap_or(name);
            self.add(key, count);
        }
    }

    /// Parse a JSON object of card name -> copy count.
    pub fn from_json_str(raw: &str) -> Result<Self, DeckError> {
        let counts: BTreeMap<String, u32> = serde_json::from_str(raw)?;
        Ok(Self::from_counts(counts))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn count(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Remove one copy. Returns false, changing nothing, when none is left.
    pub fn take(&mut self, name: &str) -> bool {
        match self.counts.get_mut(name) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn total(&self) -> u32 {
        self.counts
            .values()
            .fold(0u32, |sum, count| sum.saturating_add(*count))
    }
}

/// One ranked substitute offered for a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Sanitized simple name.
    pub name: String,
    pub colors: InkSet,
    pub score: Score,
}

/// Where substitutes come from. [`CardFinder`] is the production source.
pub trait CandidateSource {
    /// Up to `n` substitutes for `name`, best first, never including `name`.
    fn ranked_candidates(&self, name: &str, n: usize) -> Result<Vec<Candidate>, FinderError>;

    /// Ink colors of `name`, if the card is known.
    fn colors_of(&self, name: &str) -> Option<InkSet>;

    /// The key candidates for `name` are reported under, if the card is
    /// known. Must agree with [`Candidate::name`].
    fn canonical_name(&self, name: &str) -> Option<String>;
}

impl CandidateSource for CardFinder {
    fn ranked_candidates(&self, name: &str, n: usize) -> Result<Vec<Candidate>, FinderError> {
        let result = self.find_similar(name, n)?;
        Ok(result
            .matches
            .into_iter()
            .map(|m| Candidate {
                name: m.record.key().to_string(),
                colors: m.record.color,
                score: m.overall,
            })
            .collect())
    }

    fn colors_of(&self, name: &str) -> Option<InkSet> {
        self.catalog().find(name).map(|record| record.color)
    }

    fn canonical_name(&self, name: &str) -> Option<String> {
        self.catalog().find(name).map(|record| record.key().to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementReason {
    UsedFromCollection,
    Substituted { score: Score },
    NoSubstitute,
    LookupFailed(String),
}

impl fmt::Display for ReplacementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementReason::UsedFromCollection => f.write_str("used from collection"),
            ReplacementReason::Substituted { score } => {
                write!(f, "substituted, similarity score = {score:.2}")
            }
            ReplacementReason::NoSubstitute => f.write_str("no substitute available"),
            ReplacementReason::LookupFailed(message) => write!(f, "error: {message}"),
        }
    }
}

impl Serialize for ReplacementReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// How one requested copy was resolved. `card` is `None` when nothing was
/// added to the deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementEntry {
    pub card: Option<String>,
    pub reason: ReplacementReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckResult {
    pub final_deck: BTreeMap<String, u32>,
    /// Original card name -> one entry per requested copy that was handled.
    pub replacement_log: BTreeMap<String, Vec<ReplacementEntry>>,
}

impl DeckResult {
    pub fn total_cards(&self) -> u32 {
        self.final_deck.values().sum()
    }
}

/// Union of the colors of every requested card the source knows, cut down
/// to [`MAX_DECK_COLORS`]. Colors backed by more requested copies win; ties
/// go to palette order.
pub fn color_identity(decklist: &Decklist, source: &dyn CandidateSource) -> InkSet {
    let mut weight: BTreeMap<InkColor, u32> = BTreeMap::new();
    for (name, quantity) in decklist.entries() {
        let Some(colors) = source.colors_of(name) else {
            continue;
        };
        for color in colors.iter() {
            *weight.entry(color).or_default() += quantity;
        }
    }

    let mut ranked: Vec<(InkColor, u32)> = weight.into_iter().collect();
    // BTreeMap iteration is palette order, and the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(MAX_DECK_COLORS)
        .map(|(color, _)| color)
        .collect()
}

/// Build the deck: use owned copies first, then the best-ranked substitute
/// that fits the color identity, is owned, isn't itself requested, and isn't
/// already at [`MAX_COPIES`]. Copies that can't be filled are dropped and
/// logged.
///
/// Requested names and collection keys are first mapped to the source's
/// canonical names, so the final deck and the log use catalog keys and the
/// collection is left keyed the same way.
pub fn substitute_deck(
    decklist: &Decklist,
    collection: &mut Collection,
    source: &dyn CandidateSource,
    candidate_pool: usize,
) -> DeckResult {
    let identity = color_identity(decklist, source);
    log::debug!("Deck color identity: {identity}");

    collection.canonicalize(|name| source.canonical_name(name));
    let requested = decklist.resolve(source);
    let requested_keys: HashSet<&str> = requested.iter().map(|(key, _)| key.as_str()).collect();

    let mut result = DeckResult::default();
    for (name, quantity) in &requested {
        let log_entries = result.replacement_log.entry(name.clone()).or_default();
        let mut candidates: Option<Vec<Candidate>> = None;

        for _ in 0..*quantity {
            let held = result.final_deck.get(name).copied().unwrap_or(0);
            if held < MAX_COPIES && collection.take(name) {
                *result.final_deck.entry(name.clone()).or_default() += 1;
                log_entries.push(ReplacementEntry {
                    card: Some(name.clone()),
                    reason: ReplacementReason::UsedFromCollection,
                });
                continue;
            }

            if candidates.is_none() {
                match source.ranked_candidates(name, candidate_pool) {
                    Ok(ranked) => candidates = Some(ranked),
                    Err(err) => {
                        log::debug!("No candidates for '{name}': {err}");
                        log_entries.push(ReplacementEntry {
                            card: None,
                            reason: ReplacementReason::LookupFailed(err.to_string()),
                        });
                        break;
                    }
                }
            }
            let ranked = candidates.as_deref().unwrap_or(&[]);

            let pick = ranked.iter().find(|candidate| {
                !candidate.colors.is_empty()
                    && identity.contains_all(candidate.colors)
                    && collection.count(&candidate.name) > 0
                    && !requested_keys.contains(candidate.name.as_str())
                    && result.final_deck.get(&candidate.name).copied().unwrap_or(0) < MAX_COPIES
            });

            match pick {
                Some(candidate) if collection.take(&candidate.name) => {
                    log::debug!(
                        "Substituting '{}' for '{name}' (score {:.3})",
                        candidate.name,
                        candidate.score
                    );
                    *result.final_deck.entry(candidate.name.clone()).or_default() += 1;
                    log_entries.push(ReplacementEntry {
                        card: Some(candidate.name.clone()),
                        reason: ReplacementReason::Substituted {
                            score: candidate.score,
                        },
                    });
                }
                _ => {
                    log::debug!("No substitute available for '{name}'");
                    log_entries.push(ReplacementEntry {
                        card: None,
                        reason: ReplacementReason::NoSubstitute,
                    });
                }
            }
        }
    }
    result
}
