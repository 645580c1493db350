// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every tunable constant of the lane detector lives here,
// with the reference values exported as named constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpurwerkError};

/// Side length of the square Gaussian smoothing kernel.
pub const BLUR_KERNEL_SIZE: u32 = 5;
/// Hysteresis low threshold of the edge detector.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
/// Hysteresis high threshold of the edge detector.
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Distance resolution of the Hough accumulator, in pixels.
pub const HOUGH_RHO: f64 = 2.0;
/// Angle resolution of the Hough accumulator, in radians.
pub const HOUGH_THETA: f64 = std::f64::consts::PI / 180.0;
/// Minimum accumulator votes before a line is traced.
pub const HOUGH_VOTE_THRESHOLD: u32 = 100;
/// Shortest segment the detector reports, in pixels.
pub const HOUGH_MIN_LINE_LENGTH: u32 = 40;
/// Largest run of missing pixels tolerated inside one segment.
pub const HOUGH_MAX_LINE_GAP: u32 = 5;
/// Seed for the edge-pixel visiting order.
pub const HOUGH_SEED: u64 = 0x5eed_1a4e;

/// Reference region of interest: `(200, H)`, `(550, 250)`, `(1100, H)`.
pub const REFERENCE_ROI: [(ProfileCoord, ProfileCoord); 3] = [
    (ProfileCoord::Pixels(200), ProfileCoord::Fraction(1.0)),
    (ProfileCoord::Pixels(550), ProfileCoord::Pixels(250)),
    (ProfileCoord::Pixels(1100), ProfileCoord::Fraction(1.0)),
];
/// Far end of a back-projected lane line, as a fraction of frame height.
pub const FAR_ROW_RATIO: RowRatio = RowRatio {
    numerator: 3,
    denominator: 5,
};

/// Overlay colour, RGB (blue).
pub const OVERLAY_COLOR: [u8; 3] = [0, 0, 255];
/// Overlay stroke width in pixels.
pub const OVERLAY_THICKNESS: u32 = 10;
/// Weight of the source frame in the final blend.
pub const FRAME_WEIGHT: f32 = 0.8;
/// Weight of the overlay canvas in the final blend.
pub const OVERLAY_WEIGHT: f32 = 1.0;
/// Scalar added to every blended channel.
pub const BLEND_OFFSET: f32 = 0.0;

/// Complete configuration for the per-frame lane pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub edge: EdgeConfig,
    pub camera: CameraProfile,
    pub hough: HoughConfig,
    pub aggregation: AggregationConfig,
    pub render: RenderConfig,
}

impl PipelineConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.edge.validate()?;
        self.camera.validate()?;
        self.hough.validate()?;
        self.render.validate()
    }
}

// -- Edge extraction ----------------------------------------------------------

/// Whether the Gaussian-smoothed image feeds the edge detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurPolicy {
    /// Run the edge detector on the raw grayscale image. The edge detector
    /// smooths internally, so no separate blur pass is needed.
    #[default]
    Skip,
    /// Run the edge detector on the smoothed grayscale image.
    Apply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub blur_kernel_size: u32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub blur_policy: BlurPolicy,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: BLUR_KERNEL_SIZE,
            low_threshold: CANNY_LOW_THRESHOLD,
            high_threshold: CANNY_HIGH_THRESHOLD,
            blur_policy: BlurPolicy::Skip,
        }
    }
}

impl EdgeConfig {
    fn validate(&self) -> Result<()> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(SpurwerkError::InvalidConfig(format!(
                "blur kernel size must be odd and positive, got {}",
                self.blur_kernel_size
            )));
        }
        let finite = self.low_threshold.is_finite() && self.high_threshold.is_finite();
        if !finite || self.low_threshold < 0.0 || self.low_threshold > self.high_threshold {
            return Err(SpurwerkError::InvalidConfig(format!(
                "edge thresholds must satisfy 0 <= low <= high, got low={} high={}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

// -- Camera profile -----------------------------------------------------------

/// One coordinate of a region-of-interest vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCoord {
    /// Absolute pixel position.
    Pixels(i32),
    /// Fraction of the matching frame dimension (width for x, height for y).
    Fraction(f64),
}

impl ProfileCoord {
    /// Resolve against a frame extent (width or height).
    pub fn resolve(&self, extent: u32) -> i32 {
        match *self {
            ProfileCoord::Pixels(px) => px,
            ProfileCoord::Fraction(f) => (f * f64::from(extent)).round() as i32,
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            ProfileCoord::Pixels(_) => true,
            ProfileCoord::Fraction(f) => f.is_finite(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiVertex {
    pub x: ProfileCoord,
    pub y: ProfileCoord,
}

/// Polygon bounding the expected road surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub vertices: Vec<RoiVertex>,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self {
            vertices: REFERENCE_ROI
                .iter()
                .map(|&(x, y)| RoiVertex { x, y })
                .collect(),
        }
    }
}

impl RegionOfInterest {
    /// Vertex positions in pixels for a frame of the given size.
    pub fn resolve(&self, width: u32, height: u32) -> Vec<(i32, i32)> {
        self.vertices
            .iter()
            .map(|v| (v.x.resolve(width), v.y.resolve(height)))
            .collect()
    }
}

/// An exact rational fraction of the frame height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRatio {
    pub numerator: u32,
    pub denominator: u32,
}

impl RowRatio {
    /// `height * numerator / denominator`, rounded down. A zero denominator
    /// yields row 0.
    pub fn of(&self, height: u32) -> i32 {
        (u64::from(height) * u64::from(self.numerator))
            .checked_div(u64::from(self.denominator))
            .unwrap_or(0) as i32
    }
}

/// Geometry tied to a particular camera mounting and resolution.
///
/// Swapping the profile retunes the detector for a different camera without
/// touching the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraProfile {
    pub region: RegionOfInterest,
    /// Row where back-projected lane lines end, measured from the top.
    pub far_row: RowRatio,
}

impl Default for CameraProfile {
    fn default() -> Self {
        Self {
            region: RegionOfInterest::default(),
            far_row: FAR_ROW_RATIO,
        }
    }
}

impl CameraProfile {
    /// The hand-tuned profile for 1280x720-class dash camera footage.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Rows `(near, far)` between which lane lines are drawn.
    pub fn projection_rows(&self, height: u32) -> (i32, i32) {
        (height as i32, self.far_row.of(height))
    }

    fn validate(&self) -> Result<()> {
        let vertices = &self.region.vertices;
        if vertices.len() < 3 {
            return Err(SpurwerkError::InvalidConfig(format!(
                "region of interest needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(SpurwerkError::InvalidConfig(
                "region of interest vertex is not finite".into(),
            ));
        }
        if vertices.first() == vertices.last() {
            return Err(SpurwerkError::InvalidConfig(
                "region of interest must not repeat its first vertex at the end".into(),
            ));
        }
        if self.far_row.denominator == 0 || self.far_row.numerator >= self.far_row.denominator {
            return Err(SpurwerkError::InvalidConfig(format!(
                "far row ratio must lie in [0, 1), got {}/{}",
                self.far_row.numerator, self.far_row.denominator
            )));
        }
        Ok(())
    }
}

// -- Segment detection --------------------------------------------------------

/// Parameters of the probabilistic Hough transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    pub rho: f64,
    pub theta: f64,
    pub vote_threshold: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
    /// Stop after this many segments. `None` means no limit.
    pub max_lines: Option<usize>,
    pub seed: u64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            rho: HOUGH_RHO,
            theta: HOUGH_THETA,
            vote_threshold: HOUGH_VOTE_THRESHOLD,
            min_line_length: HOUGH_MIN_LINE_LENGTH,
            max_line_gap: HOUGH_MAX_LINE_GAP,
            max_lines: None,
            seed: HOUGH_SEED,
        }
    }
}

impl HoughConfig {
    fn validate(&self) -> Result<()> {
        if !self.rho.is_finite() || self.rho <= 0.0 {
            return Err(SpurwerkError::InvalidConfig(format!(
                "hough rho must be positive, got {}",
                self.rho
            )));
        }
        if !self.theta.is_finite() || self.theta <= 0.0 || self.theta > std::f64::consts::PI {
            return Err(SpurwerkError::InvalidConfig(format!(
                "hough theta must lie in (0, pi], got {}",
                self.theta
            )));
        }
        if self.vote_threshold == 0 {
            return Err(SpurwerkError::InvalidConfig(
                "hough vote threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// -- Aggregation --------------------------------------------------------------

/// How segment fits are combined within one lane bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Every segment counts equally.
    #[default]
    Unweighted,
    /// Each segment counts in proportion to its length.
    LengthWeighted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub weighting: Weighting,
}

// -- Rendering ----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Stroke colour, RGB.
    pub color: [u8; 3],
    pub thickness: u32,
    pub frame_weight: f32,
    pub overlay_weight: f32,
    pub offset: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color: OVERLAY_COLOR,
            thickness: OVERLAY_THICKNESS,
            frame_weight: FRAME_WEIGHT,
            overlay_weight: OVERLAY_WEIGHT,
            offset: BLEND_OFFSET,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.thickness == 0 {
            return Err(SpurwerkError::InvalidConfig(
                "overlay thickness must be at least 1".into(),
            ));
        }
        if ![self.frame_weight, self.overlay_weight, self.offset]
            .iter()
            .all(|w| w.is_finite())
        {
            return Err(SpurwerkError::InvalidConfig(
                "blend weights must be finite".into(),
            ));
        }
        Ok(())
    }
}
