use anyhow::{Context, Result};
use mtg_vision::CardDetection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File holding the collection inside its directory
pub const COLLECTION_FILE_NAME: &str = "collection.json";

/// A scanned card saved to the collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedCard {
    pub id: u64,
    pub name: String,
    pub set_code: Option<String>,
    pub type_line: Option<String>,
    pub mana_cost: Option<String>,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub scryfall_uri: Option<String>,
    pub confidence: u8,
    /// Unix time in milliseconds
    pub added_at: u64,
}

impl CollectedCard {
    /// Build a collection record from a detection. The id is assigned on `add`.
    pub fn from_detection(detection: &CardDetection) -> Self {
        let metadata = detection.entry.as_ref().map(|e| &e.metadata);
        Self {
            id: 0,
            name: detection.name.clone(),
            set_code: detection.set_code.clone(),
            type_line: detection.type_line.clone(),
            mana_cost: detection.mana_cost.clone(),
            rarity: metadata.and_then(|m| m.rarity()).map(str::to_string),
            image_url: detection.image_url.clone(),
            scryfall_uri: metadata.and_then(|m| m.scryfall_uri()).map(str::to_string),
            confidence: detection.confidence,
            added_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

/// The user's card collection, persisted as a JSON array
#[derive(Debug)]
pub struct CollectionStore {
    path: PathBuf,
    cards: Vec<CollectedCard>,
}

impl CollectionStore {
    /// Open the collection in `dir`. A missing file is an empty collection.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(COLLECTION_FILE_NAME);
        let cards = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Vec::new()
        };

        tracing::info!("Collection opened with {} cards", cards.len());
        Ok(Self { path, cards })
    }

    /// Append a card and persist. Returns the assigned id.
    /// On a failed write the collection is left unchanged.
    pub fn add(&mut self, mut card: CollectedCard) -> Result<u64> {
        card.id = self.cards.iter().map(|c| c.id).max().map_or(1, |id| id + 1);
        let id = card.id;
        tracing::debug!("Adding {} to collection as #{}", card.name, id);
        self.cards.push(card);
        if let Err(e) = self.save() {
            self.cards.pop();
            return Err(e);
        }
        Ok(id)
    }

    /// Remove a card by id and persist. Returns the removed card, if any.
    /// On a failed write the card stays in the collection.
    pub fn remove(&mut self, id: u64) -> Result<Option<CollectedCard>> {
        let Some(index) = self.cards.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let removed = self.cards.remove(index);
        if let Err(e) = self.save() {
            self.cards.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.cards);
        if let Err(e) = self.save() {
            self.cards = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn cards(&self) -> &[CollectedCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&self.cards)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtg_data::{CardEntry, CardMetadata};
    use mtg_vision::Resolution;

    fn detection(name: &str) -> CardDetection {
        CardDetection {
            name: name.to_string(),
            detected_name: name.to_lowercase(),
            confidence: 88,
            resolution: Resolution::Exact,
            entry: Some(CardEntry {
                key: name.to_lowercase(),
                display_name: name.to_string(),
                metadata: CardMetadata::default()
                    .with("rarity", "common")
                    .with("scryfall_uri", "https://scryfall.example/card"),
            }),
            type_line: Some("Instant".to_string()),
            mana_cost: Some("{R}".to_string()),
            set_code: Some("m10".to_string()),
            image_url: None,
        }
    }

    #[test]
    fn test_from_detection_copies_metadata() {
        let card = CollectedCard::from_detection(&detection("Lightning Bolt"));
        assert_eq!(card.name, "Lightning Bolt");
        assert_eq!(card.rarity.as_deref(), Some("common"));
        assert_eq!(card.scryfall_uri.as_deref(), Some("https://scryfall.example/card"));
        assert_eq!(card.set_code.as_deref(), Some("m10"));
        assert_eq!(card.confidence, 88);
        assert!(card.added_at > 0);
    }

    #[test]
    fn test_open_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CollectionStore::open(dir.path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_remove_persist() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = CollectionStore::open(dir.path()).unwrap();
        let bolt = store
            .add(CollectedCard::from_detection(&detection("Lightning Bolt")))
            .unwrap();
        let opt = store.add(CollectedCard::from_detection(&detection("Opt"))).unwrap();
        assert_eq!((bolt, opt), (1, 2));

        let reopened = CollectionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.cards()[1].name, "Opt");

        let mut store = reopened;
        let removed = store.remove(bolt).unwrap().expect("bolt was stored");
        assert_eq!(removed.name, "Lightning Bolt");
        assert!(store.remove(bolt).unwrap().is_none());

        // Next id follows the highest remaining id
        let next = store.add(CollectedCard::from_detection(&detection("Shock"))).unwrap();
        assert_eq!(next, 3);

        let reopened = CollectionStore::open(dir.path()).unwrap();
        let names: Vec<&str> = reopened.cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Opt", "Shock"]);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CollectionStore::open(dir.path()).unwrap();
        store.add(CollectedCard::from_detection(&detection("Opt"))).unwrap();
        store.clear().unwrap();
        assert!(CollectionStore::open(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CollectionStore::open(dir.path()).unwrap();
        let opt = store.add(CollectedCard::from_detection(&detection("Opt"))).unwrap();

        // A directory in place of the file makes every write fail
        let path = dir.path().join(COLLECTION_FILE_NAME);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.add(CollectedCard::from_detection(&detection("Shock"))).is_err());
        assert_eq!(store.len(), 1, "failed add must not keep the card");

        assert!(store.remove(opt).is_err());
        assert_eq!(store.cards()[0].id, opt, "failed remove must keep the card");

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1, "failed clear must keep the cards");

        // Once writable again, nothing from the failed calls reappears
        std::fs::remove_dir(&path).unwrap();
        let next = store.add(CollectedCard::from_detection(&detection("Shock"))).unwrap();
        assert_eq!(next, 2);
        let reopened = CollectionStore::open(dir.path()).unwrap();
        let names: Vec<&str> = reopened.cards().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Opt", "Shock"]);
    }

    #[test]
    fn test_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COLLECTION_FILE_NAME), "[{").unwrap();
        assert!(CollectionStore::open(dir.path()).is_err());
    }
}
