use image::RgbaImage;
use mtg_capture::{crop_region, ScreenRegion};
use mtg_vision::{
    resolve_reply, CardDetection, DetectionPolicy, DetectionResult, FrameChangeDetector,
    NameMatcher, Resolution,
};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::DetectionCache;
use crate::config::ScanConfig;
use crate::rate_limit::{RateLimitStatus, RateLimiter};
use crate::recognizer::Recognizer;

/// What one scan tick produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Frame unchanged and the last detection is still fresh
    Cached(CardDetection),
    /// The recognizer was called and its reply resolved
    Detected(DetectionResult),
    /// Too soon to call the recognizer again
    RateLimited { retry_after: Duration },
    RecognizerFailed { message: String },
}

impl ScanOutcome {
    /// The card this tick reports, if any
    pub fn card(&self) -> Option<&CardDetection> {
        match self {
            ScanOutcome::Cached(card) => Some(card),
            ScanOutcome::Detected(result) => result.card(),
            ScanOutcome::RateLimited { .. } | ScanOutcome::RecognizerFailed { .. } => None,
        }
    }
}

/// Per-scan state: frame fingerprint, detection cache and recognizer pacing.
///
/// `scan` takes `&mut self`, so ticks against one session can never overlap.
pub struct ScanSession {
    matcher: Arc<NameMatcher>,
    detector: FrameChangeDetector,
    cache: DetectionCache,
    limiter: RateLimiter,
    policy: DetectionPolicy,
    card_region: Option<ScreenRegion>,
}

impl ScanSession {
    pub fn new(matcher: Arc<NameMatcher>, config: &ScanConfig) -> Self {
        Self {
            matcher,
            detector: FrameChangeDetector::with_params(
                config.frame_sample_count,
                config.frame_similarity_threshold,
            ),
            cache: DetectionCache::new(config.cache_freshness()),
            limiter: RateLimiter::new(&config.rate_limit),
            policy: config.detection_policy(),
            card_region: config.card_region,
        }
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run one tick against `frame`
    pub async fn scan(
        &mut self,
        frame: &RgbaImage,
        recognizer: &dyn Recognizer,
        now: Instant,
    ) -> ScanOutcome {
        // Always fingerprint so the stored fingerprint tracks every frame
        let similar = self.detector.is_similar_image(frame);
        if similar {
            if let Some(cached) = self.cache.fresh(now) {
                debug!("Frame unchanged, reusing detection of {}", cached.name);
                return ScanOutcome::Cached(cached.clone());
            }
        }

        if let RateLimitStatus::RateLimited { retry_after } = self.limiter.check(now) {
            debug!("Recognizer rate limited, retry in {:?}", retry_after);
            return ScanOutcome::RateLimited { retry_after };
        }

        let input: Cow<'_, RgbaImage> = match &self.card_region {
            Some(region) => Cow::Owned(crop_region(frame, region)),
            None => Cow::Borrowed(frame),
        };

        self.limiter.record_call(now);
        let reply = match recognizer.recognize(&input).await {
            Ok(reply) => {
                self.limiter.record_success();
                reply
            }
            Err(e) => {
                self.limiter.record_failure();
                warn!(
                    "Recognizer failed ({} in a row): {:#}",
                    self.limiter.consecutive_failures(),
                    e
                );
                return ScanOutcome::RecognizerFailed {
                    message: format!("{:#}", e),
                };
            }
        };

        let result = resolve_reply(&reply, &self.matcher, &self.policy);
        match &result {
            DetectionResult::Card(card) if card.resolution != Resolution::Unverified => {
                info!("Detected {} ({}%)", card.name, card.confidence);
                self.cache.store(card.clone(), now);
            }
            DetectionResult::Card(card) => {
                debug!("Unverified detection {}, not cached", card.name);
            }
            DetectionResult::NoCard => {
                debug!("No card detected");
                self.cache.clear();
            }
        }

        ScanOutcome::Detected(result)
    }

    /// Forget the fingerprint, cached detection and backoff state
    pub fn reset(&mut self) {
        self.detector.reset();
        self.cache.clear();
        self.limiter.reset();
    }
}
