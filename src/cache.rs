use mtg_vision::CardDetection;
use std::time::{Duration, Instant};

/// The most recent confident detection, reusable while fresh
#[derive(Debug, Clone)]
pub struct DetectionCache {
    freshness: Duration,
    last: Option<(CardDetection, Instant)>,
}

impl DetectionCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            freshness,
            last: None,
        }
    }

    pub fn store(&mut self, detection: CardDetection, now: Instant) {
        self.last = Some((detection, now));
    }

    /// The cached detection if it is younger than the freshness window
    pub fn fresh(&self, now: Instant) -> Option<&CardDetection> {
        let (detection, stored_at) = self.last.as_ref()?;
        (now.saturating_duration_since(*stored_at) < self.freshness).then_some(detection)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtg_vision::Resolution;

    fn detection() -> CardDetection {
        CardDetection {
            name: "Opt".to_string(),
            detected_name: "Opt".to_string(),
            confidence: 90,
            resolution: Resolution::Exact,
            entry: None,
            type_line: None,
            mana_cost: None,
            set_code: None,
            image_url: None,
        }
    }

    #[test]
    fn test_fresh_within_window() {
        let mut cache = DetectionCache::new(Duration::from_secs(3));
        let t0 = Instant::now();
        assert!(cache.fresh(t0).is_none());

        cache.store(detection(), t0);
        assert_eq!(cache.fresh(t0 + Duration::from_millis(2999)).map(|d| d.name.as_str()), Some("Opt"));
        assert!(cache.fresh(t0 + Duration::from_secs(3)).is_none(), "window end is stale");
    }

    #[test]
    fn test_clear() {
        let mut cache = DetectionCache::new(Duration::from_secs(3));
        let t0 = Instant::now();
        cache.store(detection(), t0);
        cache.clear();
        assert!(cache.fresh(t0).is_none());
    }
}
