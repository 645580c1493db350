// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The per-frame lane pipeline: edges -> region mask -> segments -> lanes ->
// overlay. Stateless; every call allocates its own intermediates.

use image::{DynamicImage, RgbImage};
use spurwerk_core::config::PipelineConfig;
use spurwerk_core::error::Result;
use spurwerk_core::types::{LanePair, Segment};
use tracing::{debug, instrument};

use crate::edge::EdgeExtractor;
use crate::frame::to_color_frame;
use crate::hough::SegmentDetector;
use crate::lane::LaneAggregator;
use crate::region::RegionMasker;
use crate::render::Renderer;

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Raw segments from the Hough stage, in detection order.
    pub segments: Vec<Segment>,
    pub lanes: LanePair,
    /// Source frame with the lane overlay blended in.
    pub composited: RgbImage,
}

/// Lane detection for single frames.
///
/// ```ignore
/// let pipeline = LanePipeline::new(PipelineConfig::default())?;
/// let analysis = pipeline.process(&frame)?;
/// println!("left: {:?}, right: {:?}", analysis.lanes.left, analysis.lanes.right);
/// ```
#[derive(Debug, Clone)]
pub struct LanePipeline {
    edges: EdgeExtractor,
    masker: RegionMasker,
    detector: SegmentDetector,
    aggregator: LaneAggregator,
    renderer: Renderer,
}

impl LanePipeline {
    /// Build a pipeline after validating the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: PipelineConfig) -> Self {
        let PipelineConfig {
            edge,
            camera,
            hough,
            aggregation,
            render,
        } = config;
        Self {
            edges: EdgeExtractor::new(edge),
            masker: RegionMasker::new(camera.region.clone()),
            detector: SegmentDetector::new(hough),
            aggregator: LaneAggregator::new(camera, aggregation),
            renderer: Renderer::new(render),
        }
    }

    /// Run every stage on one colour frame.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn process(&self, frame: &RgbImage) -> Result<FrameAnalysis> {
        let edges = self.edges.extract(frame)?;
        let masked = self.masker.apply(&edges)?;
        let segments = self.detector.detect(&masked);
        let lanes = self.aggregator.aggregate(frame.height(), &segments);
        let composited = self.renderer.render(frame, &lanes)?;

        debug!(
            segments = segments.len(),
            left = !lanes.left.is_absent(),
            right = !lanes.right.is_absent(),
            "Frame processed"
        );
        Ok(FrameAnalysis {
            segments,
            lanes,
            composited,
        })
    }

    /// Run every stage on any decoded image, colour or grayscale.
    pub fn process_dynamic(&self, image: &DynamicImage) -> Result<FrameAnalysis> {
        let frame = to_color_frame(image)?;
        self.process(&frame)
    }

    /// Composited frame only.
    pub fn annotate(&self, frame: &RgbImage) -> Result<RgbImage> {
        Ok(self.process(frame)?.composited)
    }

    /// Lane lines only, without rendering.
    pub fn detect_lanes(&self, frame: &RgbImage) -> Result<LanePair> {
        let edges = self.edges.extract(frame)?;
        let masked = self.masker.apply(&edges)?;
        let segments = self.detector.detect(&masked);
        Ok(self.aggregator.aggregate(frame.height(), &segments))
    }
}

impl Default for LanePipeline {
    fn default() -> Self {
        Self::from_config(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use spurwerk_core::SpurwerkError;
    use spurwerk_core::types::LaneLine;

    use crate::render::draw_thick_segment_mut;

    const TOLERANCE: i32 = 5;

    /// 1280x720 black frame with the two reference lane lines painted in
    /// white, 3 pixels wide.
    fn synthetic_road() -> RgbImage {
        let mut frame = RgbImage::new(1280, 720);
        let white = Rgb([255u8, 255, 255]);
        for marking in [
            Segment::new(200, 720, 550, 250),
            Segment::new(1100, 720, 550, 250),
        ] {
            draw_thick_segment_mut(&mut frame, &marking, 3, white);
        }
        frame
    }

    fn assert_near(line: &LaneLine, expected: (i32, i32, i32, i32)) {
        let s = line.segment().expect("lane should be present");
        assert_eq!((s.y1, s.y2), (expected.1, expected.3));
        assert!(
            (s.x1 - expected.0).abs() <= TOLERANCE && (s.x2 - expected.2).abs() <= TOLERANCE,
            "got {s:?}, expected {expected:?}"
        );
    }

    #[test]
    fn synthetic_road_yields_both_lanes() {
        let analysis = LanePipeline::default().process(&synthetic_road()).unwrap();

        assert!(!analysis.segments.is_empty());
        // Left: x = (y - 988.57) / -1.3429; right: x = (y + 220) / 0.8545.
        assert_near(&analysis.lanes.left, (200, 720, 414, 432));
        assert_near(&analysis.lanes.right, (1100, 720, 762, 432));
        assert_eq!(analysis.composited.dimensions(), (1280, 720));
    }

    #[test]
    fn black_frame_is_only_dimmed() {
        let frame = RgbImage::new(1280, 720);
        let analysis = LanePipeline::default().process(&frame).unwrap();

        assert!(analysis.segments.is_empty());
        assert!(analysis.lanes.is_empty());
        assert!(analysis.composited.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn featureless_frame_is_scaled_by_frame_weight() {
        let frame = RgbImage::from_pixel(640, 360, Rgb([120, 60, 30]));
        let out = LanePipeline::default().annotate(&frame).unwrap();
        assert!(out.pixels().all(|p| p.0 == [96, 48, 24]));
    }

    #[test]
    fn grayscale_input_is_accepted() {
        let gray = DynamicImage::ImageRgb8(synthetic_road()).to_luma8();
        let analysis = LanePipeline::default()
            .process_dynamic(&DynamicImage::ImageLuma8(gray))
            .unwrap();
        assert!(analysis.lanes.is_complete());
    }

    #[test]
    fn detect_lanes_matches_process() {
        let pipeline = LanePipeline::default();
        let frame = synthetic_road();
        assert_eq!(
            pipeline.detect_lanes(&frame).unwrap(),
            pipeline.process(&frame).unwrap().lanes
        );
    }

    #[test]
    fn empty_frame_is_rejected_before_processing() {
        let err = LanePipeline::default()
            .process(&RgbImage::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, SpurwerkError::InvalidInput(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.hough.vote_threshold = 0;
        assert!(matches!(
            LanePipeline::new(config),
            Err(SpurwerkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_pipeline_matches_validated_defaults() {
        let frame = synthetic_road();
        let validated = LanePipeline::new(PipelineConfig::default()).unwrap();
        let default = LanePipeline::default();

        let a = validated.process(&frame).unwrap();
        let b = default.process(&frame).unwrap();
        assert_eq!(a.segments, b.segments);
        assert_eq!(a.lanes, b.lanes);
        assert_eq!(a.composited, b.composited);
    }
}
