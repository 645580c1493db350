// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-file collaborators: read frames from a single image or a directory of
// numbered stills, and write composited frames as numbered PNGs.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use spurwerk_core::error::{Result, SpurwerkError};
use spurwerk_detect::frame::to_color_frame;
use tracing::{debug, info, instrument};

use crate::traits::{FrameSink, FrameSource};

/// Whether the file extension names a format the `image` crate can decode.
fn is_image_file(path: &Path) -> bool {
    path.is_file() && ImageFormat::from_path(path).is_ok()
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Frames read from disk, one decoded image per call.
#[derive(Debug)]
pub struct ImageFileSource {
    pending: VecDeque<PathBuf>,
    released: bool,
}

impl ImageFileSource {
    /// Open a single image file, or every image in a directory in file-name
    /// order. Non-image files in a directory are ignored.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;

        let pending: VecDeque<PathBuf> = if metadata.is_dir() {
            let mut frames = Vec::new();
            for entry in fs::read_dir(path)? {
                let candidate = entry?.path();
                if is_image_file(&candidate) {
                    frames.push(candidate);
                } else {
                    debug!(path = %candidate.display(), "Skipping non-image entry");
                }
            }
            frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            frames.into()
        } else {
            VecDeque::from([path.to_path_buf()])
        };

        if pending.is_empty() {
            return Err(SpurwerkError::Capture(format!(
                "no image frames found in {}",
                path.display()
            )));
        }

        info!(frames = pending.len(), "Image source opened");
        Ok(Self {
            pending,
            released: false,
        })
    }

    /// Frames not yet handed out.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.released {
            return Err(SpurwerkError::Capture("source already released".into()));
        }
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let decoded = image::open(&path)
            .map_err(|e| SpurwerkError::ImageError(format!("{}: {e}", path.display())))?;
        let frame = to_color_frame(&decoded)?;
        debug!(
            path = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "Frame decoded"
        );
        Ok(Some(frame))
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        self.pending.clear();
        debug!("Image source released");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Writes each presented frame to `<dir>/frame_NNNNNN.png`, numbered from 1.
#[derive(Debug)]
pub struct ImageFileSink {
    dir: PathBuf,
    written: u64,
    released: bool,
}

impl ImageFileSink {
    /// Create the output directory if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "Image sink ready");
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path of the n-th frame (1-based).
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for ImageFileSink {
    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        if self.released {
            return Err(SpurwerkError::Display("sink already released".into()));
        }
        let path = self.frame_path(self.written + 1);
        frame
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| SpurwerkError::ImageError(format!("{}: {e}", path.display())))?;
        self.written += 1;
        debug!(path = %path.display(), "Frame written");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        info!(frames = self.written, dir = %self.dir.display(), "Image sink closed");
        Ok(())
    }
}
