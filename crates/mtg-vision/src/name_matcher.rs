use anyhow::Result;
use mtg_data::{normalize_name, CardDictionary, CardEntry};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::similarity::{levenshtein, score};

/// Minimum similarity for general card-name resolution
pub const DEFAULT_MIN_SCORE: f64 = 0.7;

/// Minimum similarity for higher-precision contexts
pub const STRICT_MIN_SCORE: f64 = 0.8;

/// A name to resolve, with its normalized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub raw_input: String,
    pub normalized_input: String,
}

impl MatchCandidate {
    pub fn new(raw_input: &str) -> Self {
        Self {
            raw_input: raw_input.to_string(),
            normalized_input: normalize_name(raw_input),
        }
    }
}

/// Outcome of a fuzzy lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    Found { entry: &'a CardEntry, score: f64 },
    NotFound,
}

impl<'a> MatchResult<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found { .. })
    }

    pub fn entry(&self) -> Option<&'a CardEntry> {
        match self {
            MatchResult::Found { entry, .. } => Some(entry),
            MatchResult::NotFound => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            MatchResult::Found { score, .. } => Some(*score),
            MatchResult::NotFound => None,
        }
    }
}

/// Exact lookup of the normalized name. Cheap; always tried before fuzzy matching.
pub fn exact_lookup<'a>(dictionary: &'a CardDictionary, name: &str) -> Option<&'a CardEntry> {
    dictionary.exact_lookup(name)
}

/// Find the dictionary key most similar to `name`, if it scores at least `min_score`.
///
/// Ties on score go to the lexicographically smallest key.
pub fn fuzzy_match<'a>(dictionary: &'a CardDictionary, name: &str, min_score: f64) -> MatchResult<'a> {
    let candidate = MatchCandidate::new(name);
    if candidate.normalized_input.is_empty() || dictionary.is_empty() {
        return MatchResult::NotFound;
    }

    if min_score <= 1.0 {
        if let Some(entry) = dictionary.get(&candidate.normalized_input) {
            return MatchResult::Found { entry, score: 1.0 };
        }
    }

    let input: Vec<char> = candidate.normalized_input.chars().collect();
    let mut key_chars: Vec<char> = Vec::new();
    let mut best: Option<(&CardEntry, f64)> = None;

    for entry in dictionary.iter() {
        let key_len = entry.key.chars().count();
        let max_len = input.len().max(key_len);
        let budget = edit_budget(max_len, min_score);

        // Length difference alone already costs this many edits
        if input.len().abs_diff(key_len) > budget {
            continue;
        }

        key_chars.clear();
        key_chars.extend(entry.key.chars());
        let Some(distance) = levenshtein(&input, &key_chars, budget) else {
            continue;
        };

        let entry_score = score(distance, max_len);
        if entry_score < min_score {
            continue;
        }

        let better = match best {
            None => true,
            Some((current, best_score)) => {
                entry_score > best_score || (entry_score == best_score && entry.key < current.key)
            }
        };
        if better {
            best = Some((entry, entry_score));
        }
    }

    match best {
        Some((entry, score)) => {
            debug!(
                "Fuzzy match {:?} -> {:?} (score {:.3})",
                candidate.raw_input, entry.display_name, score
            );
            MatchResult::Found { entry, score }
        }
        None => {
            debug!("No fuzzy match for {:?} at {:.2}", candidate.raw_input, min_score);
            MatchResult::NotFound
        }
    }
}

/// Largest edit distance that can still reach `min_score` when the longer
/// string has `max_len` chars. Rounded generously; the final score check is exact.
fn edit_budget(max_len: usize, min_score: f64) -> usize {
    let slack = max_len as f64 * (1.0 - min_score);
    (slack + 1e-9).floor().max(0.0) as usize
}

/// How a name was resolved against the dictionary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NameResolution<'a> {
    Exact(&'a CardEntry),
    Fuzzy { entry: &'a CardEntry, score: f64 },
    Unmatched,
}

/// Resolves noisy card names against a shared card dictionary
pub struct NameMatcher {
    dictionary: Arc<CardDictionary>,
}

impl NameMatcher {
    pub fn new(dictionary: Arc<CardDictionary>) -> Self {
        Self { dictionary }
    }

    /// Load the card dictionary from the data directory.
    /// Expects `data_dir/cards.json`; falls back to the embedded card list.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let dictionary = CardDictionary::load(data_dir)?;
        Ok(Self::new(Arc::new(dictionary)))
    }

    pub fn dictionary(&self) -> &CardDictionary {
        &self.dictionary
    }

    /// Number of canonical names
    pub fn entry_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn exact_lookup(&self, name: &str) -> Option<&CardEntry> {
        exact_lookup(&self.dictionary, name)
    }

    pub fn fuzzy_match(&self, name: &str, min_score: f64) -> MatchResult<'_> {
        fuzzy_match(&self.dictionary, name, min_score)
    }

    /// Exact lookup first, fuzzy match as the fallback.
    pub fn resolve(&self, name: &str, min_score: f64) -> NameResolution<'_> {
        if let Some(entry) = self.exact_lookup(name) {
            return NameResolution::Exact(entry);
        }
        match self.fuzzy_match(name, min_score) {
            MatchResult::Found { entry, score } => NameResolution::Fuzzy { entry, score },
            MatchResult::NotFound => NameResolution::Unmatched,
        }
    }
}
