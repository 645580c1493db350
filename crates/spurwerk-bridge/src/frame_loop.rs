// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The driving loop: pull a frame, run the lane pipeline, push the composited
// frame, and check for a stop request. A frame the pipeline rejects is logged
// and skipped; capture and display failures end the run. Capture and display
// are released on every exit path.

use std::fmt;

use spurwerk_core::error::Result;
use spurwerk_core::types::LanePair;
use spurwerk_detect::LanePipeline;
use tracing::{debug, info, instrument, warn};

use crate::traits::{FrameSink, FrameSource, StopSignal};

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// The source ran out of frames.
    #[default]
    EndOfStream,
    /// A stop signal fired.
    StopRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "end of stream"),
            Self::StopRequested => write!(f, "stop requested"),
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub frames_processed: u64,
    /// Frames where both lane lines were found.
    pub complete_frames: u64,
    /// Frames where at least one side was absent.
    pub frames_with_absent_side: u64,
    /// Frames the pipeline rejected. Not counted in `frames_processed`.
    pub frames_failed: u64,
    pub stop_reason: StopReason,
}

impl RunSummary {
    fn record(&mut self, lanes: &LanePair) {
        self.frames_processed += 1;
        if lanes.is_complete() {
            self.complete_frames += 1;
        } else {
            self.frames_with_absent_side += 1;
        }
    }
}

/// Source and sink held for the duration of a run.
///
/// `close` releases both and reports failures; if the session is dropped
/// without closing (an error unwound the loop) both are still released and
/// any release failure is logged.
struct Session<'a, S: FrameSource + ?Sized, K: FrameSink + ?Sized> {
    source: &'a mut S,
    sink: &'a mut K,
    open: bool,
}

impl<'a, S: FrameSource + ?Sized, K: FrameSink + ?Sized> Session<'a, S, K> {
    fn open(source: &'a mut S, sink: &'a mut K) -> Self {
        Self {
            source,
            sink,
            open: true,
        }
    }

    fn close(mut self) -> Result<()> {
        self.open = false;
        let source = self.source.release();
        let sink = self.sink.release();
        source.and(sink)
    }
}

impl<S: FrameSource + ?Sized, K: FrameSink + ?Sized> Drop for Session<'_, S, K> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Err(err) = self.source.release() {
            warn!(error = %err, "Frame source release failed");
        }
        if let Err(err) = self.sink.release() {
            warn!(error = %err, "Frame sink release failed");
        }
    }
}

/// Runs the lane pipeline over a stream of frames.
pub struct FrameLoop {
    pipeline: LanePipeline,
    stops: Vec<Box<dyn StopSignal>>,
}

impl FrameLoop {
    pub fn new(pipeline: LanePipeline) -> Self {
        Self {
            pipeline,
            stops: Vec::new(),
        }
    }

    /// Add a stop signal. The loop ends when any signal fires.
    pub fn with_stop(mut self, stop: impl StopSignal + 'static) -> Self {
        self.stops.push(Box::new(stop));
        self
    }

    pub fn pipeline(&self) -> &LanePipeline {
        &self.pipeline
    }

    fn stop_requested(&self, frames_processed: u64) -> bool {
        self.stops.iter().any(|s| s.should_stop(frames_processed))
    }

    /// Process frames until end of stream, a stop signal, or a capture or
    /// display error.
    ///
    /// Stop signals are polled before each frame is requested, so a signal
    /// already raised at start means no frame is read. A frame the pipeline
    /// rejects is counted in `frames_failed` and nothing is presented for it.
    /// Both collaborators are released exactly once before this returns.
    #[instrument(skip_all, fields(stops = self.stops.len()))]
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        let mut session = Session::open(source, sink);
        let mut summary = RunSummary::default();
        info!("Frame loop started");

        let reason = loop {
            if self.stop_requested(summary.frames_processed) {
                break StopReason::StopRequested;
            }
            let Some(frame) = session.source.next_frame()? else {
                break StopReason::EndOfStream;
            };
            let analysis = match self.pipeline.process(&frame) {
                Ok(analysis) => analysis,
                Err(err) => {
                    summary.frames_failed += 1;
                    warn!(
                        error = %err,
                        width = frame.width(),
                        height = frame.height(),
                        "Frame skipped"
                    );
                    continue;
                }
            };
            session.sink.present(&analysis.composited)?;
            summary.record(&analysis.lanes);
            debug!(frame = summary.frames_processed, "Frame presented");
        };

        session.close()?;
        summary.stop_reason = reason;
        info!(
            frames = summary.frames_processed,
            complete = summary.complete_frames,
            absent_side = summary.frames_with_absent_side,
            failed = summary.frames_failed,
            reason = %reason,
            "Frame loop finished"
        );
        Ok(summary)
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(LanePipeline::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::{FrameLimit, StopFlag};
    use image::{Rgb, RgbImage};
    use spurwerk_core::SpurwerkError;

    /// In-memory source that counts releases and can fail on demand.
    struct ScriptedSource {
        frames: Vec<Result<RgbImage>>,
        released: u32,
        served: u32,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<RgbImage>>) -> Self {
            Self {
                frames,
                released: 0,
                served: 0,
            }
        }

        fn plain(count: usize) -> Self {
            Self::new(
                (0..count)
                    .map(|_| Ok(RgbImage::from_pixel(64, 48, Rgb([100, 100, 100]))))
                    .collect(),
            )
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            if self.frames.is_empty() {
                return Ok(None);
            }
            self.served += 1;
            self.frames.remove(0).map(Some)
        }

        fn release(&mut self) -> Result<()> {
            self.released += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        presented: Vec<RgbImage>,
        fail_on: Option<usize>,
        released: u32,
    }

    impl FrameSink for RecordingSink {
        fn present(&mut self, frame: &RgbImage) -> Result<()> {
            if self.fail_on == Some(self.presented.len()) {
                return Err(SpurwerkError::Display("window closed".into()));
            }
            self.presented.push(frame.clone());
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            self.released += 1;
            Ok(())
        }
    }

    #[test]
    fn runs_to_end_of_stream_and_releases_once() {
        let mut source = ScriptedSource::plain(3);
        let mut sink = RecordingSink::default();

        let summary = FrameLoop::default().run(&mut source, &mut sink).unwrap();

        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.frames_with_absent_side, 3);
        assert_eq!(summary.complete_frames, 0);
        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(sink.presented.len(), 3);
        // Featureless frames are only dimmed by the blend.
        assert_eq!(sink.presented[0].get_pixel(10, 10).0, [80, 80, 80]);
        assert_eq!((source.released, sink.released), (1, 1));
    }

    #[test]
    fn raised_flag_stops_before_any_frame_is_read() {
        let flag = StopFlag::new();
        flag.raise();
        let mut source = ScriptedSource::plain(5);
        let mut sink = RecordingSink::default();

        let summary = FrameLoop::default()
            .with_stop(flag)
            .run(&mut source, &mut sink)
            .unwrap();

        assert_eq!(summary.frames_processed, 0);
        assert_eq!(summary.stop_reason, StopReason::StopRequested);
        assert_eq!(source.served, 0);
        assert_eq!((source.released, sink.released), (1, 1));
    }

    #[test]
    fn frame_limit_ends_run_early() {
        let mut source = ScriptedSource::plain(5);
        let mut sink = RecordingSink::default();

        let summary = FrameLoop::default()
            .with_stop(StopFlag::new())
            .with_stop(FrameLimit(2))
            .run(&mut source, &mut sink)
            .unwrap();

        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.stop_reason, StopReason::StopRequested);
        assert_eq!(source.served, 2);
        assert_eq!(source.released, 1);
    }

    #[test]
    fn capture_failure_still_releases_both() {
        let mut source = ScriptedSource::new(vec![
            Ok(RgbImage::new(32, 32)),
            Err(SpurwerkError::Capture("camera unplugged".into())),
        ]);
        let mut sink = RecordingSink::default();

        let err = FrameLoop::default().run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, SpurwerkError::Capture(_)));
        assert_eq!(sink.presented.len(), 1);
        assert_eq!((source.released, sink.released), (1, 1));
    }

    #[test]
    fn display_failure_still_releases_both() {
        let mut source = ScriptedSource::plain(4);
        let mut sink = RecordingSink {
            fail_on: Some(1),
            ..Default::default()
        };

        let err = FrameLoop::default().run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, SpurwerkError::Display(_)));
        assert_eq!((source.released, sink.released), (1, 1));
    }

    #[test]
    fn empty_frame_is_skipped_and_the_stream_continues() {
        let mut source = ScriptedSource::new(vec![
            Ok(RgbImage::new(32, 32)),
            Ok(RgbImage::new(0, 0)),
            Ok(RgbImage::new(32, 32)),
        ]);
        let mut sink = RecordingSink::default();

        let summary = FrameLoop::default().run(&mut source, &mut sink).unwrap();

        assert_eq!(sink.presented.len(), 2);
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.frames_failed, 1);
        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(source.served, 3);
        assert_eq!((source.released, sink.released), (1, 1));
    }

    #[test]
    fn boxed_collaborators_are_accepted() {
        let mut source: Box<dyn FrameSource> = Box::new(ScriptedSource::plain(1));
        let mut sink: Box<dyn FrameSink> = Box::new(RecordingSink::default());
        let summary = FrameLoop::default().run(&mut source, &mut sink).unwrap();
        assert_eq!(summary.frames_processed, 1);
    }
}
