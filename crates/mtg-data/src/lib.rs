use anyhow::{Context, Result};
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{BufReader, Read};
use std::path::Path;

mod embedded;
mod error;

pub use error::DictionaryError;

/// File name of the bulk card data inside the data directory
pub const BULK_FILE_NAME: &str = "cards.json";

/// Lowercased, trimmed form of a card name, used as the dictionary key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Card record fields other than the name, carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardMetadata(Map<String, Value>);

impl CardMetadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Builder-style insert of a single field
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set_code(&self) -> Option<&str> {
        self.str_field("set")
    }

    pub fn set_name(&self) -> Option<&str> {
        self.str_field("set_name")
    }

    pub fn type_line(&self) -> Option<&str> {
        self.str_field("type_line")
    }

    pub fn mana_cost(&self) -> Option<&str> {
        self.str_field("mana_cost")
    }

    pub fn rarity(&self) -> Option<&str> {
        self.str_field("rarity")
    }

    /// Normal-size card image (`image_uris.normal` in Scryfall records)
    pub fn image_url(&self) -> Option<&str> {
        self.0
            .get("image_uris")
            .and_then(|uris| uris.get("normal"))
            .and_then(Value::as_str)
    }

    pub fn scryfall_uri(&self) -> Option<&str> {
        self.str_field("scryfall_uri")
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}

/// Input row for building a dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub name: String,
    pub metadata: CardMetadata,
}

impl CardRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: CardMetadata::default(),
        }
    }
}

/// One canonical card in the dictionary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    /// Normalized display name, unique within a dictionary
    pub key: String,
    /// Properly-cased canonical name
    pub display_name: String,
    pub metadata: CardMetadata,
}

/// Raw record from a Scryfall-style bulk data array
#[derive(Debug, Deserialize)]
struct BulkCard {
    name: String,
    #[serde(default)]
    lang: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Collects English records while the bulk array is being deserialized, so
/// other languages never have to be held in memory.
struct EnglishRecords;

impl<'de> Visitor<'de> for EnglishRecords {
    type Value = Vec<CardRecord>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of card records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut records = Vec::new();
        while let Some(card) = seq.next_element::<BulkCard>()? {
            if card.lang.as_deref() != Some("en") {
                continue;
            }
            records.push(CardRecord {
                name: card.name,
                metadata: CardMetadata(card.rest),
            });
        }
        Ok(records)
    }
}

fn bulk_error(e: serde_json::Error) -> DictionaryError {
    if e.is_io() {
        DictionaryError::Io(e.into())
    } else {
        DictionaryError::Json(e)
    }
}

/// Canonical card names keyed by their normalized form.
///
/// Immutable once built; safe to share between readers behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CardDictionary {
    entries: HashMap<String, CardEntry>,
}

impl CardDictionary {
    /// Build a dictionary from card records.
    ///
    /// Records whose names normalize to the same key overwrite each other:
    /// the last one wins. Bulk sources list one record per printing, and only
    /// one canonical entry per name is kept.
    ///
    /// A record with a blank name fails the whole build.
    pub fn build(
        records: impl IntoIterator<Item = CardRecord>,
    ) -> Result<Self, DictionaryError> {
        let mut entries = HashMap::new();

        for (index, record) in records.into_iter().enumerate() {
            let display_name = record.name.trim();
            if display_name.is_empty() {
                return Err(DictionaryError::MalformedEntry {
                    index,
                    reason: if record.name.is_empty() {
                        "name is empty".to_string()
                    } else {
                        "name is whitespace only".to_string()
                    },
                });
            }

            let key = normalize_name(display_name);
            entries.insert(
                key.clone(),
                CardEntry {
                    key,
                    display_name: display_name.to_string(),
                    metadata: record.metadata,
                },
            );
        }

        Ok(Self { entries })
    }

    /// Parse a JSON array of card records, keeping only `lang == "en"`.
    /// Read failures surface as `DictionaryError::Io`.
    pub fn from_bulk_reader<R: Read>(reader: R) -> Result<Self, DictionaryError> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let records = (&mut de)
            .deserialize_seq(EnglishRecords)
            .map_err(bulk_error)?;
        de.end().map_err(bulk_error)?;
        Self::build(records)
    }

    pub fn from_bulk_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let dictionary = Self::from_bulk_reader(BufReader::new(file))
            .with_context(|| format!("Failed to load bulk data from {}", path.display()))?;
        Ok(dictionary)
    }

    /// Small built-in dictionary of well-known cards
    pub fn embedded() -> Self {
        // Embedded names are non-blank, so building cannot fail
        Self::build(embedded::embedded_records()).unwrap_or_default()
    }

    /// Load the bulk dictionary from the data directory, falling back to the
    /// embedded list when no bulk file is present.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let bulk_path = data_dir.join(BULK_FILE_NAME);
        let dictionary = if bulk_path.exists() {
            Self::from_bulk_file(&bulk_path)?
        } else {
            tracing::warn!(
                "No {} found at {}. Using embedded card list",
                BULK_FILE_NAME,
                bulk_path.display()
            );
            Self::embedded()
        };

        tracing::info!("Loaded {} card names", dictionary.len());
        Ok(dictionary)
    }

    /// Exact lookup by normalized name
    pub fn exact_lookup(&self, name: &str) -> Option<&CardEntry> {
        self.entries.get(&normalize_name(name))
    }

    pub fn get(&self, key: &str) -> Option<&CardEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardEntry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
