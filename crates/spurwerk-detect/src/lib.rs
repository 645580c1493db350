// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spurwerk-detect: Per-frame lane boundary detection.
//
// Each stage is a pure transformation: edge extraction, region-of-interest
// masking, probabilistic Hough segment detection, left/right lane aggregation,
// and overlay rendering. `LanePipeline` chains them for one frame at a time.

pub mod edge;
pub mod frame;
pub mod hough;
pub mod lane;
pub mod pipeline;
pub mod region;
pub mod render;

// Re-export the primary structs so callers can use `spurwerk_detect::LanePipeline` etc.
pub use edge::{EdgeExtractor, EdgeMap};
pub use hough::SegmentDetector;
pub use lane::LaneAggregator;
pub use pipeline::{FrameAnalysis, LanePipeline};
pub use region::RegionMasker;
pub use render::Renderer;
