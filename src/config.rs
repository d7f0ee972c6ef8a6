use anyhow::{ensure, Context, Result};
use mtg_capture::{regions, ScreenRegion};
use mtg_vision::frame_change::{DEFAULT_SAMPLE_COUNT, DEFAULT_SIMILARITY_THRESHOLD};
use mtg_vision::{DetectionPolicy, DEFAULT_MIN_SCORE, STRICT_MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Pacing of recognizer calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum gap between calls while the recognizer is healthy
    pub min_interval_ms: u64,
    /// Gap after the first consecutive failure
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Growth of the gap per additional consecutive failure
    pub backoff_factor: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
            base_backoff_ms: 2000,
            max_backoff_ms: 30_000,
            backoff_factor: 2.0,
        }
    }
}

/// Scanner settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub frame_interval_ms: u64,
    pub frame_sample_count: usize,
    /// Fingerprint delta below which a frame counts as unchanged.
    /// Depends on camera and sample count; recalibrate per deployment.
    pub frame_similarity_threshold: u32,
    pub cache_freshness_ms: u64,
    /// 0-100
    pub min_recognizer_confidence: u8,
    pub min_match_score: f64,
    pub strict_match_score: f64,
    /// Use `strict_match_score` instead of `min_match_score`
    pub strict_matching: bool,
    /// Report confident recognizer names that have no dictionary match
    pub accept_unverified: bool,
    pub rate_limit: RateLimitConfig,
    /// Region handed to the recognizer; `None` sends the whole frame
    pub card_region: Option<ScreenRegion>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 500,
            frame_sample_count: DEFAULT_SAMPLE_COUNT,
            frame_similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            cache_freshness_ms: 3000,
            min_recognizer_confidence: 70,
            min_match_score: DEFAULT_MIN_SCORE,
            strict_match_score: STRICT_MIN_SCORE,
            strict_matching: false,
            accept_unverified: false,
            rate_limit: RateLimitConfig::default(),
            card_region: Some(regions::card_guide()),
        }
    }
}

impl ScanConfig {
    /// Load a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            warn!("No scanner config at {}. Using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.frame_interval_ms > 0, "frame_interval_ms must be positive");
        ensure!(self.frame_sample_count > 0, "frame_sample_count must be positive");
        ensure!(
            self.min_recognizer_confidence <= 100,
            "min_recognizer_confidence must be within 0-100, got {}",
            self.min_recognizer_confidence
        );
        for (name, score) in [
            ("min_match_score", self.min_match_score),
            ("strict_match_score", self.strict_match_score),
        ] {
            ensure!(
                score > 0.0 && score <= 1.0,
                "{} must be within (0, 1], got {}",
                name,
                score
            );
        }

        let rate = &self.rate_limit;
        ensure!(
            rate.backoff_factor >= 1.0,
            "rate_limit.backoff_factor must be at least 1, got {}",
            rate.backoff_factor
        );
        ensure!(
            rate.max_backoff_ms >= rate.base_backoff_ms,
            "rate_limit.max_backoff_ms must not be below base_backoff_ms"
        );

        if let Some(region) = &self.card_region {
            ensure!(
                region.width > 0.0 && region.height > 0.0,
                "card_region must have a positive size"
            );
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn cache_freshness(&self) -> Duration {
        Duration::from_millis(self.cache_freshness_ms)
    }

    /// Similarity threshold in effect for name matching
    pub fn match_score(&self) -> f64 {
        if self.strict_matching {
            self.strict_match_score
        } else {
            self.min_match_score
        }
    }

    pub fn detection_policy(&self) -> DetectionPolicy {
        DetectionPolicy {
            min_confidence: self.min_recognizer_confidence,
            min_score: self.match_score(),
            accept_unverified: self.accept_unverified,
        }
    }
}
