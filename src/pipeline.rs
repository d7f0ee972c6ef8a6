use anyhow::Result;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::info;

use mtg_capture::replay::ImageDirGrabber;
use mtg_capture::{CaptureStatus, FrameGrabber};
use mtg_vision::NameMatcher;

use crate::config::ScanConfig;
use crate::recognizer::Recognizer;
use crate::session::{ScanOutcome, ScanSession};

/// Manages the capture → scan pipeline
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    frame_rx: watch::Receiver<Option<Arc<RgbaImage>>>,
    status_rx: watch::Receiver<CaptureStatus>,
    outcome_rx: watch::Receiver<Option<ScanOutcome>>,
}

impl Pipeline {
    /// Start capturing from `grabber` and scanning each new frame.
    ///
    /// Must be called from within a tokio runtime. The scan loop awaits each
    /// tick before looking at the next frame; frames that arrive meanwhile are
    /// skipped and only the latest one is scanned.
    pub fn start<G: FrameGrabber + 'static>(
        grabber: G,
        recognizer: Arc<dyn Recognizer>,
        matcher: Arc<NameMatcher>,
        config: &ScanConfig,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
        let (status_tx, status_rx) = watch::channel(CaptureStatus::default());
        let (outcome_tx, outcome_rx) = watch::channel::<Option<ScanOutcome>>(None);

        let stop_capture = stop.clone();
        let frame_interval = config.frame_interval();
        tokio::spawn(async move {
            mtg_capture::capture_loop(grabber, frame_tx, status_tx, frame_interval, stop_capture)
                .await;
        });

        let mut scan_frame_rx = frame_rx.clone();
        let mut session = ScanSession::new(matcher, config);
        tokio::spawn(async move {
            info!(
                "Scan loop started with {} dictionary entries",
                session.matcher().entry_count()
            );
            loop {
                tokio::select! {
                    _ = stopped(&mut stop_rx) => break,
                    changed = scan_frame_rx.changed() => {
                        // Capture loop ended and dropped its sender
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let frame = scan_frame_rx.borrow_and_update().clone();
                if let Some(frame) = frame {
                    // An in-flight recognizer call is abandoned on stop
                    let outcome = tokio::select! {
                        _ = stopped(&mut stop_rx) => break,
                        outcome = session.scan(&frame, recognizer.as_ref(), Instant::now()) => outcome,
                    };
                    let _ = outcome_tx.send(Some(outcome));
                }
            }
            info!("Scan loop stopped");
        });

        info!("Pipeline started");

        Self {
            stop,
            stop_tx,
            frame_rx,
            status_rx,
            outcome_rx,
        }
    }

    /// Start the pipeline on a directory of recorded frames
    pub fn start_replay(
        dir: &Path,
        looping: bool,
        recognizer: Arc<dyn Recognizer>,
        matcher: Arc<NameMatcher>,
        config: &ScanConfig,
    ) -> Result<Self> {
        let grabber = ImageDirGrabber::open(dir, looping)?;
        Ok(Self::start(grabber, recognizer, matcher, config))
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.stop_tx.send(true);
        info!("Pipeline stop requested");
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.status_rx.borrow().clone()
    }

    /// Outcome of the most recent scan tick
    pub fn latest_outcome(&self) -> Option<ScanOutcome> {
        self.outcome_rx.borrow().clone()
    }

    /// Get the latest captured frame
    pub fn latest_frame(&self) -> Option<Arc<RgbaImage>> {
        self.frame_rx.borrow().clone()
    }

    /// Receiver notified on every scan outcome
    pub fn subscribe(&self) -> watch::Receiver<Option<ScanOutcome>> {
        self.outcome_rx.clone()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.stop_tx.send(true);
    }
}

/// Resolves once stop is signalled or the pipeline handle is gone
async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stop| *stop).await;
}
