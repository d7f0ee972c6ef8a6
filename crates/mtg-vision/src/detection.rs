use mtg_data::CardEntry;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::name_matcher::{NameMatcher, NameResolution, DEFAULT_MIN_SCORE};

/// Recognizer replies below this confidence (0-100) are treated as "no card"
pub const DEFAULT_MIN_CONFIDENCE: u8 = 70;

#[derive(Debug, Error)]
pub enum ReplyParseError {
    #[error("reply contains no JSON object")]
    NoJsonObject,
    #[error("reply JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the vision model reported for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerReply {
    #[serde(default)]
    pub card_name: Option<String>,
    /// 0-100
    #[serde(default, deserialize_with = "confidence_from_number")]
    pub confidence: u8,
    #[serde(default, rename = "type")]
    pub type_line: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default, rename = "set")]
    pub set_code: Option<String>,
}

/// Models report confidence as integers or floats; clamp to 0-100.
fn confidence_from_number<'de, D: Deserializer<'de>>(de: D) -> Result<u8, D::Error> {
    let value = Option::<f64>::deserialize(de)?.unwrap_or(0.0);
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Extract the JSON object from a model reply.
/// The object may be wrapped in prose or a Markdown code fence, and the prose
/// may itself contain braces such as mana symbols.
///
/// Each `{` is tried in turn and only the first JSON value after it is read.
/// If none parses, the error from the first attempt is returned.
pub fn parse_reply(text: &str) -> Result<RecognizerReply, ReplyParseError> {
    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&text[start..]).into_iter::<RecognizerReply>();
        match values.next() {
            Some(Ok(reply)) => return Ok(reply),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }
    Err(first_error.map_or(ReplyParseError::NoJsonObject, ReplyParseError::Json))
}

/// How the detected name was tied to a canonical card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Exact,
    Fuzzy { score: f64 },
    /// Confident recognizer reply with no dictionary match
    Unverified,
}

/// A recognized card, enriched with dictionary metadata when matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetection {
    /// Canonical display name, or the detected name when unverified
    pub name: String,
    /// Name as reported by the recognizer
    pub detected_name: String,
    pub confidence: u8,
    pub resolution: Resolution,
    pub entry: Option<CardEntry>,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub set_code: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetectionResult {
    NoCard,
    Card(CardDetection),
}

impl DetectionResult {
    pub fn has_card(&self) -> bool {
        matches!(self, DetectionResult::Card(_))
    }

    pub fn card(&self) -> Option<&CardDetection> {
        match self {
            DetectionResult::Card(card) => Some(card),
            DetectionResult::NoCard => None,
        }
    }
}

/// Thresholds applied when turning a recognizer reply into a detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionPolicy {
    pub min_confidence: u8,
    pub min_score: f64,
    pub accept_unverified: bool,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_score: DEFAULT_MIN_SCORE,
            accept_unverified: false,
        }
    }
}

/// Resolve a recognizer reply against the card dictionary.
///
/// Exact lookup first, then fuzzy matching. Dictionary metadata takes
/// precedence over the recognizer's own type/mana/set text.
pub fn resolve_reply(
    reply: &RecognizerReply,
    matcher: &NameMatcher,
    policy: &DetectionPolicy,
) -> DetectionResult {
    let Some(name) = reply
        .card_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return DetectionResult::NoCard;
    };

    if reply.confidence < policy.min_confidence {
        debug!(
            "Ignoring {:?}: confidence {} below {}",
            name, reply.confidence, policy.min_confidence
        );
        return DetectionResult::NoCard;
    }

    let (entry, resolution) = match matcher.resolve(name, policy.min_score) {
        NameResolution::Exact(entry) => (Some(entry), Resolution::Exact),
        NameResolution::Fuzzy { entry, score } => (Some(entry), Resolution::Fuzzy { score }),
        NameResolution::Unmatched if policy.accept_unverified => (None, Resolution::Unverified),
        NameResolution::Unmatched => {
            debug!("No dictionary match for {:?}", name);
            return DetectionResult::NoCard;
        }
    };

    let metadata = entry.map(|e| &e.metadata);
    let from_dictionary = |field: Option<&str>, fallback: &Option<String>| {
        field.map(str::to_string).or_else(|| fallback.clone())
    };

    DetectionResult::Card(CardDetection {
        name: entry.map_or_else(|| name.to_string(), |e| e.display_name.clone()),
        detected_name: name.to_string(),
        confidence: reply.confidence,
        resolution,
        type_line: from_dictionary(metadata.and_then(|m| m.type_line()), &reply.type_line),
        mana_cost: from_dictionary(metadata.and_then(|m| m.mana_cost()), &reply.mana_cost),
        set_code: from_dictionary(metadata.and_then(|m| m.set_code()), &reply.set_code),
        image_url: metadata.and_then(|m| m.image_url()).map(str::to_string),
        entry: entry.cloned(),
    })
}
