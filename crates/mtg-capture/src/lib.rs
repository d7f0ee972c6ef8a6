use anyhow::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

pub mod replay;

pub use replay::ImageDirGrabber;

/// Normalized frame region (0.0-1.0 coordinates relative to the frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Well-known frame regions for a 16:9 camera feed
pub mod regions {
    use super::ScreenRegion;

    /// Card width / height (63mm x 88mm)
    const CARD_ASPECT: f64 = 63.0 / 88.0;
    const FRAME_ASPECT: f64 = 16.0 / 9.0;

    /// Guide box the user holds the card in: centred, 80% of frame height,
    /// card-shaped.
    pub fn card_guide() -> ScreenRegion {
        let height = 0.8;
        let width = height * CARD_ASPECT / FRAME_ASPECT;
        ScreenRegion {
            x: (1.0 - width) / 2.0,
            y: (1.0 - height) / 2.0,
            width,
            height,
        }
    }
}

/// Status of the capture loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub source_ready: bool,
    pub source_name: Option<String>,
    pub fps: f64,
    pub last_capture_time: Option<u64>,
    pub resolution: Option<(u32, u32)>,
}

/// A blocking source of camera frames.
///
/// Camera access lives outside this crate; implementations wrap whatever
/// delivers frames (a device, a test fixture, a replay directory).
pub trait FrameGrabber: Send {
    /// Human-readable source name for status reporting
    fn name(&self) -> String;

    /// Grab the next frame. `Ok(None)` means the source is exhausted.
    fn grab(&mut self) -> Result<Option<RgbaImage>>;
}

impl<G: FrameGrabber + ?Sized> FrameGrabber for Box<G> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn grab(&mut self) -> Result<Option<RgbaImage>> {
        (**self).grab()
    }
}

/// Crop a region from a captured frame using normalized coordinates
pub fn crop_region(frame: &RgbaImage, region: &ScreenRegion) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    let x = (region.x * w as f64) as u32;
    let y = (region.y * h as f64) as u32;
    let rw = (region.width * w as f64) as u32;
    let rh = (region.height * h as f64) as u32;

    // Clamp to image bounds
    let x = x.min(w.saturating_sub(1));
    let y = y.min(h.saturating_sub(1));
    let rw = rw.min(w.saturating_sub(x));
    let rh = rh.min(h.saturating_sub(y));

    image::imageops::crop_imm(frame, x, y, rw, rh).to_image()
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The capture loop that runs as a background task.
/// Sends frames through the watch channel and status updates through the status channel.
/// Ends on the stop signal or when the grabber is exhausted.
pub async fn capture_loop<G: FrameGrabber + 'static>(
    mut grabber: G,
    frame_tx: watch::Sender<Option<Arc<RgbaImage>>>,
    status_tx: watch::Sender<CaptureStatus>,
    capture_interval: Duration,
    stop: Arc<AtomicBool>,
) {
    let source_name = grabber.name();
    info!("Capture loop started ({}), interval: {:?}", source_name, capture_interval);

    let mut last_capture = Instant::now();
    let mut frame_count = 0u64;
    let mut fps_timer = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("Capture loop stopping (stop signal received)");
            break;
        }

        // Grab on a blocking thread; grabbers are sync
        let grab_result = tokio::task::spawn_blocking(move || {
            let frame = grabber.grab();
            (grabber, frame)
        })
        .await;

        match grab_result {
            Ok((g, Ok(Some(frame)))) => {
                grabber = g;
                let resolution = (frame.width(), frame.height());
                frame_count += 1;

                // Calculate FPS
                let elapsed = fps_timer.elapsed().as_secs_f64();
                let fps = if elapsed > 0.0 {
                    frame_count as f64 / elapsed
                } else {
                    0.0
                };

                // Reset FPS counter every 5 seconds
                if elapsed > 5.0 {
                    frame_count = 0;
                    fps_timer = Instant::now();
                }

                let _ = status_tx.send(CaptureStatus {
                    is_capturing: true,
                    source_ready: true,
                    source_name: Some(source_name.clone()),
                    fps,
                    last_capture_time: Some(unix_millis()),
                    resolution: Some(resolution),
                });

                let _ = frame_tx.send(Some(Arc::new(frame)));
                last_capture = Instant::now();
            }
            Ok((_, Ok(None))) => {
                info!("Frame source {} exhausted", source_name);
                break;
            }
            Ok((g, Err(e))) => {
                grabber = g;
                warn!("Capture failed: {:#}", e);
                let _ = status_tx.send(CaptureStatus {
                    is_capturing: false,
                    source_ready: true,
                    source_name: Some(source_name.clone()),
                    ..CaptureStatus::default()
                });
            }
            Err(e) => {
                warn!("Capture task panicked: {}", e);
                break;
            }
        }

        // Sleep until next capture interval
        let elapsed = last_capture.elapsed();
        if elapsed < capture_interval {
            tokio::time::sleep(capture_interval - elapsed).await;
        } else {
            // Yield to prevent busy loop
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    let _ = status_tx.send(CaptureStatus::default());
    info!("Capture loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields `remaining` solid frames, failing once along the way
    struct CountingGrabber {
        remaining: u32,
        fail_next: bool,
    }

    impl FrameGrabber for CountingGrabber {
        fn name(&self) -> String {
            "counting".to_string()
        }

        fn grab(&mut self) -> Result<Option<RgbaImage>> {
            if self.fail_next {
                self.fail_next = false;
                anyhow::bail!("sensor hiccup");
            }
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbaImage::from_pixel(
                16,
                9,
                image::Rgba([self.remaining as u8, 0, 0, 255]),
            )))
        }
    }

    #[test]
    fn test_card_guide_region() {
        let region = regions::card_guide();
        assert!(region.x >= 0.0 && region.y >= 0.0);
        assert!(region.x + region.width <= 1.0);
        assert!(region.y + region.height <= 1.0);

        // Card-shaped on a 1920x1080 frame
        let px_w = region.width * 1920.0;
        let px_h = region.height * 1080.0;
        assert!((px_w / px_h - 63.0 / 88.0).abs() < 1e-6);
    }

    #[test]
    fn test_crop_region() {
        let img = RgbaImage::new(1920, 1080);
        let region = ScreenRegion {
            x: 0.5,
            y: 0.5,
            width: 0.1,
            height: 0.1,
        };
        let cropped = crop_region(&img, &region);
        assert_eq!(cropped.width(), 192);
        assert_eq!(cropped.height(), 108);
    }

    #[test]
    fn test_crop_region_clamps_to_bounds() {
        let img = RgbaImage::new(100, 50);
        let region = ScreenRegion {
            x: 0.9,
            y: 0.9,
            width: 0.5,
            height: 0.5,
        };
        let cropped = crop_region(&img, &region);
        assert_eq!(cropped.width(), 10);
        assert_eq!(cropped.height(), 5);
    }

    #[tokio::test]
    async fn test_capture_loop_publishes_until_exhausted() {
        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
        let (status_tx, status_rx) = watch::channel(CaptureStatus::default());
        let stop = Arc::new(AtomicBool::new(false));

        let grabber = CountingGrabber {
            remaining: 3,
            fail_next: true,
        };
        tokio::time::timeout(
            Duration::from_secs(5),
            capture_loop(grabber, frame_tx, status_tx, Duration::from_millis(5), stop),
        )
        .await
        .expect("capture loop should end when the source is exhausted");

        let last = frame_rx.borrow().clone().expect("a frame was published");
        assert_eq!(last.get_pixel(0, 0)[0], 0, "last frame wins");
        assert!(!status_rx.borrow().is_capturing);
    }

    #[tokio::test]
    async fn test_capture_loop_honours_stop() {
        let (frame_tx, _frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
        let (status_tx, _status_rx) = watch::channel(CaptureStatus::default());
        let stop = Arc::new(AtomicBool::new(true));

        let grabber = CountingGrabber {
            remaining: u32::MAX,
            fail_next: false,
        };
        tokio::time::timeout(
            Duration::from_secs(5),
            capture_loop(grabber, frame_tx, status_tx, Duration::from_millis(5), stop),
        )
        .await
        .expect("capture loop should stop immediately");
    }
}
