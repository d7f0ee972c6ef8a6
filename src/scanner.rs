use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

use mtg_capture::{CaptureStatus, FrameGrabber};
use mtg_collection::{CollectedCard, CollectionStore};
use mtg_vision::{CardDetection, NameMatcher};

use crate::config::ScanConfig;
use crate::pipeline::Pipeline;
use crate::recognizer::Recognizer;

/// Scanner config file inside the data directory
pub const CONFIG_FILE_NAME: &str = "scanner.json";

/// Application state behind the scanner front end: one pipeline at a time,
/// the shared card dictionary and the collection.
pub struct Scanner {
    data_dir: PathBuf,
    config: ScanConfig,
    matcher: Arc<NameMatcher>,
    pipeline: Mutex<Option<Pipeline>>,
    collection: Mutex<CollectionStore>,
}

impl Scanner {
    /// Load config, dictionary and collection from `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self> {
        info!("Data directory: {}", data_dir.display());
        let config = ScanConfig::load(&data_dir.join(CONFIG_FILE_NAME))?;
        let matcher = NameMatcher::load(data_dir).context("Failed to load card dictionary")?;
        let collection = CollectionStore::open(data_dir)?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            matcher: Arc::new(matcher),
            pipeline: Mutex::new(None),
            collection: Mutex::new(collection),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn matcher(&self) -> Arc<NameMatcher> {
        self.matcher.clone()
    }

    /// Start scanning unless a pipeline is already running.
    /// Must be called from within a tokio runtime.
    pub fn start<G: FrameGrabber + 'static>(
        &self,
        grabber: G,
        recognizer: Arc<dyn Recognizer>,
    ) -> Result<()> {
        let mut pipeline = self.lock_pipeline()?;
        if pipeline.is_some() {
            return Ok(());
        }

        *pipeline = Some(Pipeline::start(
            grabber,
            recognizer,
            self.matcher.clone(),
            &self.config,
        ));
        Ok(())
    }

    /// Stop and drop the running pipeline
    pub fn stop(&self) -> Result<()> {
        if let Some(p) = self.lock_pipeline()?.take() {
            p.stop();
        }
        Ok(())
    }

    pub fn is_running(&self) -> Result<bool> {
        Ok(self.lock_pipeline()?.is_some())
    }

    pub fn capture_status(&self) -> Result<CaptureStatus> {
        Ok(self
            .lock_pipeline()?
            .as_ref()
            .map(Pipeline::capture_status)
            .unwrap_or_default())
    }

    /// The card reported by the latest scan tick, if any
    pub fn latest_detection(&self) -> Result<Option<CardDetection>> {
        let pipeline = self.lock_pipeline()?;
        let outcome = pipeline.as_ref().and_then(Pipeline::latest_outcome);
        Ok(outcome.and_then(|o| o.card().cloned()))
    }

    /// Save the currently detected card to the collection. Returns the new id.
    pub fn collect_latest(&self) -> Result<Option<u64>> {
        let Some(detection) = self.latest_detection()? else {
            return Ok(None);
        };
        self.collect(&detection).map(Some)
    }

    pub fn collect(&self, detection: &CardDetection) -> Result<u64> {
        let mut collection = self.lock_collection()?;
        let id = collection.add(CollectedCard::from_detection(detection))?;
        info!("Collected {} as #{}", detection.name, id);
        Ok(id)
    }

    pub fn remove_from_collection(&self, id: u64) -> Result<Option<CollectedCard>> {
        self.lock_collection()?.remove(id)
    }

    pub fn collection(&self) -> Result<Vec<CollectedCard>> {
        Ok(self.lock_collection()?.cards().to_vec())
    }

    fn lock_pipeline(&self) -> Result<std::sync::MutexGuard<'_, Option<Pipeline>>> {
        self.pipeline
            .lock()
            .map_err(|e| anyhow!("pipeline state poisoned: {}", e))
    }

    fn lock_collection(&self) -> Result<std::sync::MutexGuard<'_, CollectionStore>> {
        self.collection
            .lock()
            .map_err(|e| anyhow!("collection poisoned: {}", e))
    }
}
