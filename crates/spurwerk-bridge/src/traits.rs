// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits for frame acquisition, display and loop termination.

use image::RgbImage;
use spurwerk_core::error::Result;

/// Supplies raster frames one at a time.
pub trait FrameSource {
    /// Next frame in the stream.
    /// Returns Ok(None) at end of stream; that is not an error.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Release the underlying device or file handles. Called exactly once
    /// by `FrameLoop` when the loop ends, whatever the reason.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Consumes annotated frames.
pub trait FrameSink {
    /// Show or store one composited frame.
    fn present(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the display. Called exactly once by `FrameLoop`.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// External "stop requested" signal, polled once per frame.
pub trait StopSignal {
    /// `frames_processed` is the number of frames completed so far in the
    /// current run.
    fn should_stop(&self, frames_processed: u64) -> bool;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).present(frame)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}
