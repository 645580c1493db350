// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometric types for the Spurwerk lane detector.

use serde::{Deserialize, Serialize};

/// A detected straight line fragment, endpoints in image coordinates.
///
/// Image y grows downward, so a boundary that leans towards the left edge of
/// the frame as it recedes has a negative on-screen slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Both endpoints as `(x, y)` pairs.
    pub fn endpoints(&self) -> [(i32, i32); 2] {
        [(self.x1, self.y1), (self.x2, self.y2)]
    }

    /// Euclidean length in pixels.
    pub fn length(&self) -> f64 {
        let dx = f64::from(self.x2 - self.x1);
        let dy = f64::from(self.y2 - self.y1);
        dx.hypot(dy)
    }

    /// True when both endpoints share an x coordinate (no finite slope).
    pub fn is_vertical(&self) -> bool {
        self.x1 == self.x2
    }
}

/// A line `y = slope * x + intercept` in image coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitLine {
    pub slope: f64,
    pub intercept: f64,
}

impl FitLine {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Solve for x at the given row. `None` for horizontal or non-finite lines.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        if self.slope == 0.0 || !self.slope.is_finite() || !self.intercept.is_finite() {
            return None;
        }
        let x = (y - self.intercept) / self.slope;
        x.is_finite().then_some(x)
    }

    /// Which lane bucket a line with this slope belongs to.
    pub fn side(&self) -> LaneSide {
        LaneSide::from_slope(self.slope)
    }
}

/// Left or right boundary of the current driving lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    /// Negative slope is left, everything else (including zero) is right.
    pub fn from_slope(slope: f64) -> Self {
        if slope < 0.0 {
            LaneSide::Left
        } else {
            LaneSide::Right
        }
    }
}

impl std::fmt::Display for LaneSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneSide::Left => write!(f, "left"),
            LaneSide::Right => write!(f, "right"),
        }
    }
}

/// Final per-side result of lane aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaneLine {
    /// No usable boundary was found on this side.
    #[default]
    Absent,
    /// A drawable boundary.
    Present(Segment),
}

impl LaneLine {
    pub fn is_absent(&self) -> bool {
        matches!(self, LaneLine::Absent)
    }

    pub fn segment(&self) -> Option<&Segment> {
        match self {
            LaneLine::Present(segment) => Some(segment),
            LaneLine::Absent => None,
        }
    }
}

impl From<Option<Segment>> for LaneLine {
    fn from(segment: Option<Segment>) -> Self {
        segment.map_or(LaneLine::Absent, LaneLine::Present)
    }
}

/// Exactly two lane lines per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LanePair {
    pub left: LaneLine,
    pub right: LaneLine,
}

impl LanePair {
    pub fn new(left: LaneLine, right: LaneLine) -> Self {
        Self { left, right }
    }

    /// The "no lanes" result.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn get(&self, side: LaneSide) -> &LaneLine {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.left.is_absent() && !self.right.is_absent()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_absent() && self.right.is_absent()
    }

    /// Present lines in left, right order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        [&self.left, &self.right]
            .into_iter()
            .filter_map(LaneLine::segment)
    }
}
