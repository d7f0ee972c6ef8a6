use crate::FrameGrabber;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays the image files of a directory as camera frames, in file-name order.
pub struct ImageDirGrabber {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageDirGrabber {
    pub fn open(dir: &Path, looping: bool) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            warn!("No frame images found in {}", dir.display());
        } else {
            info!("Replaying {} frames from {}", paths.len(), dir.display());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            paths,
            next: 0,
            looping,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameGrabber for ImageDirGrabber {
    fn name(&self) -> String {
        let dir_name = self
            .dir
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!("[Replay] {}", dir_name)
    }

    fn grab(&mut self) -> Result<Option<RgbaImage>> {
        if self.next >= self.paths.len() {
            if !self.looping || self.paths.is_empty() {
                return Ok(None);
            }
            self.next = 0;
        }

        let path = &self.paths[self.next];
        self.next += 1;

        let frame = image::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .to_rgba8();
        Ok(Some(frame))
    }
}
