use image::RgbaImage;
use tracing::debug;

/// Number of pixel-buffer samples folded into a fingerprint
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// Fingerprints closer than this are treated as the same scene.
/// Tuned for 100 samples of 8-bit channels; recalibrate per camera.
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 1000;

/// Compact summary of a sparse sample of a frame's pixel bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameFingerprint(pub u32);

/// Byte offsets sampled from a frame buffer.
///
/// The stride comes from the frame dimensions (RGBA, 4 bytes per pixel), so
/// frames of equal size are always sampled at the same positions. Offsets past
/// the end of a short buffer are clamped to its last byte.
pub fn sample_positions(
    buffer_len: usize,
    width: u32,
    height: u32,
    sample_count: usize,
) -> impl Iterator<Item = usize> {
    let expected = width as usize * height as usize * 4;
    let span = if expected == 0 { buffer_len } else { expected };
    let stride = (span / sample_count.max(1)).max(1);
    let last = buffer_len.saturating_sub(1);

    (0..sample_count).map(move |i| (i * stride).min(last))
}

/// Fold the sampled bytes into a 32-bit rolling hash (`hash * 31 + sample`).
pub fn fingerprint(pixels: &[u8], width: u32, height: u32, sample_count: usize) -> FrameFingerprint {
    if pixels.is_empty() {
        return FrameFingerprint(0);
    }

    let hash = sample_positions(pixels.len(), width, height, sample_count).fold(0u32, |hash, i| {
        (hash << 5)
            .wrapping_sub(hash)
            .wrapping_add(u32::from(pixels[i]))
    });
    FrameFingerprint(hash)
}

/// Whether `current` is close enough to `previous` to skip recognition.
/// Always false for the first frame.
pub fn is_similar(previous: Option<FrameFingerprint>, current: FrameFingerprint, threshold: u32) -> bool {
    match previous {
        Some(previous) => current.0.abs_diff(previous.0) < threshold,
        None => false,
    }
}

/// Tracks the last frame fingerprint to detect static scenes
#[derive(Debug, Clone)]
pub struct FrameChangeDetector {
    sample_count: usize,
    threshold: u32,
    last: Option<FrameFingerprint>,
}

impl FrameChangeDetector {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_SAMPLE_COUNT, DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn with_params(sample_count: usize, threshold: u32) -> Self {
        Self {
            sample_count,
            threshold,
            last: None,
        }
    }

    /// Fingerprint a frame and compare it with the previous one.
    /// Returns true when the frame is similar to the previous one.
    ///
    /// The stored fingerprint is replaced on every call, so slow drift is
    /// still noticed.
    pub fn is_similar_frame(&mut self, pixels: &[u8], width: u32, height: u32) -> bool {
        let current = fingerprint(pixels, width, height, self.sample_count);
        let similar = is_similar(self.last, current, self.threshold);

        if let Some(last) = self.last {
            debug!(
                "Frame fingerprint {:#010x} (delta {}): {}",
                current.0,
                current.0.abs_diff(last.0),
                if similar { "similar" } else { "changed" }
            );
        }

        self.last = Some(current);
        similar
    }

    pub fn is_similar_image(&mut self, frame: &RgbaImage) -> bool {
        self.is_similar_frame(frame.as_raw(), frame.width(), frame.height())
    }

    pub fn last_fingerprint(&self) -> Option<FrameFingerprint> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for FrameChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 10;
    const H: u32 = 10;

    /// Blank 10x10 RGBA frame with the last sampled byte set to `value`
    fn frame_with_last_sample(value: u8) -> Vec<u8> {
        let mut data = vec![0u8; (W * H * 4) as usize];
        let last = sample_positions(data.len(), W, H, DEFAULT_SAMPLE_COUNT)
            .last()
            .unwrap();
        data[last] = value;
        data
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let data: Vec<u8> = (0..64 * 48 * 4).map(|i| (i * 7 % 251) as u8).collect();
        let a = fingerprint(&data, 64, 48, DEFAULT_SAMPLE_COUNT);
        let b = fingerprint(&data.clone(), 64, 48, DEFAULT_SAMPLE_COUNT);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_positions_stable_and_in_bounds() {
        let positions: Vec<usize> = sample_positions(400, W, H, 100).collect();
        assert_eq!(positions.len(), 100);
        assert_eq!(positions[1], 4);
        assert_eq!(*positions.last().unwrap(), 396);

        // Short buffer: same stride, clamped offsets
        let short: Vec<usize> = sample_positions(10, W, H, 100).collect();
        assert!(short.iter().all(|&p| p < 10));
    }

    #[test]
    fn test_first_frame_never_similar() {
        let fp = FrameFingerprint(12345);
        for threshold in [0, 1, DEFAULT_SIMILARITY_THRESHOLD, u32::MAX] {
            assert!(!is_similar(None, fp, threshold));
        }

        let mut detector = FrameChangeDetector::new();
        assert!(!detector.is_similar_frame(&frame_with_last_sample(0), W, H));
    }

    #[test]
    fn test_threshold_is_strict() {
        let blank = fingerprint(&frame_with_last_sample(0), W, H, DEFAULT_SAMPLE_COUNT);
        assert_eq!(blank, FrameFingerprint(0));

        let below = fingerprint(&frame_with_last_sample(199), W, H, DEFAULT_SAMPLE_COUNT);
        let at = fingerprint(&frame_with_last_sample(200), W, H, DEFAULT_SAMPLE_COUNT);
        assert_eq!(below, FrameFingerprint(199));
        assert_eq!(at, FrameFingerprint(200));

        assert!(is_similar(Some(blank), below, 200));
        assert!(!is_similar(Some(blank), at, 200), "a delta equal to the threshold is a change");
    }

    #[test]
    fn test_detector_flips_on_large_sample_change() {
        let mut detector = FrameChangeDetector::with_params(DEFAULT_SAMPLE_COUNT, 200);
        assert!(!detector.is_similar_frame(&frame_with_last_sample(0), W, H));
        assert!(detector.is_similar_frame(&frame_with_last_sample(0), W, H));
        assert!(detector.is_similar_frame(&frame_with_last_sample(199), W, H));
        // Reference is now 199; 0 is within threshold of it
        assert!(detector.is_similar_frame(&frame_with_last_sample(0), W, H));
        assert!(!detector.is_similar_frame(&frame_with_last_sample(200), W, H));
    }

    #[test]
    fn test_reference_updates_even_when_similar() {
        let mut detector = FrameChangeDetector::with_params(DEFAULT_SAMPLE_COUNT, 100);
        assert!(!detector.is_similar_frame(&frame_with_last_sample(0), W, H));
        for value in [60, 120, 180, 240] {
            assert!(
                detector.is_similar_frame(&frame_with_last_sample(value), W, H),
                "each step of 60 stays under the threshold"
            );
        }
        assert_eq!(detector.last_fingerprint(), Some(FrameFingerprint(240)));
    }

    #[test]
    fn test_unexpected_buffer_sizes_do_not_panic() {
        let mut detector = FrameChangeDetector::new();
        assert!(!detector.is_similar_frame(&[], 640, 480));
        assert_eq!(detector.last_fingerprint(), Some(FrameFingerprint(0)));

        let short = vec![9u8; 10];
        let a = fingerprint(&short, 640, 480, DEFAULT_SAMPLE_COUNT);
        let b = fingerprint(&short, 640, 480, DEFAULT_SAMPLE_COUNT);
        assert_eq!(a, b);

        // Zero dimensions fall back to the buffer length
        let _ = fingerprint(&[1, 2, 3], 0, 0, DEFAULT_SAMPLE_COUNT);
        let _ = fingerprint(&[1, 2, 3], 1, 1, 0);
    }

    #[test]
    fn test_image_matches_raw_fingerprint() {
        let img = RgbaImage::from_fn(32, 24, |x, y| image::Rgba([x as u8, y as u8, 128, 255]));
        let mut detector = FrameChangeDetector::new();
        detector.is_similar_image(&img);
        assert_eq!(
            detector.last_fingerprint(),
            Some(fingerprint(img.as_raw(), 32, 24, DEFAULT_SAMPLE_COUNT))
        );

        detector.reset();
        assert_eq!(detector.last_fingerprint(), None);
    }
}
