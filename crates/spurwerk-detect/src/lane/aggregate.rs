// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lane aggregation: collapse many noisy segments into one line per side.
//
// ## Pipeline
//
// 1. Fit `y = m*x + b` through each segment (vertical segments are skipped)
// 2. Bucket by slope sign: `m < 0` is the left boundary, `m >= 0` the right
// 3. Average slope and intercept within each bucket
// 4. Back-project each mean line between the bottom row and the far row
//
// Any side that cannot produce a drawable segment (empty bucket, horizontal
// mean, non-finite or out-of-range endpoint) becomes `LaneLine::Absent`. The
// same policy applies to both sides.

use spurwerk_core::config::{AggregationConfig, CameraProfile, Weighting};
use spurwerk_core::error::{Result, SpurwerkError};
use spurwerk_core::types::{FitLine, LaneLine, LanePair, LaneSide, Segment};
use tracing::{debug, instrument};

use super::fit::fit_segment;

/// A fitted segment together with its length, for weighted averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedFit {
    pub fit: FitLine,
    pub length: f64,
}

/// Segment fits split by lane side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneBuckets {
    pub left: Vec<WeightedFit>,
    pub right: Vec<WeightedFit>,
    /// Segments with no finite slope.
    pub skipped: usize,
}

impl LaneBuckets {
    /// Fit every segment and route it to the left or right bucket.
    pub fn classify(segments: &[Segment]) -> Self {
        let mut buckets = Self::default();
        for segment in segments {
            let fit = match fit_segment(segment) {
                Ok(fit) => fit,
                Err(err) => {
                    debug!(?segment, error = %err, "Skipping segment");
                    buckets.skipped += 1;
                    continue;
                }
            };
            let entry = WeightedFit {
                fit,
                length: segment.length(),
            };
            match fit.side() {
                LaneSide::Left => buckets.left.push(entry),
                LaneSide::Right => buckets.right.push(entry),
            }
        }
        buckets
    }

    pub fn bucket(&self, side: LaneSide) -> &[WeightedFit] {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }
}

/// Average slope and intercept of a bucket.
pub fn mean_fit(bucket: &[WeightedFit], weighting: Weighting) -> Result<FitLine> {
    if bucket.is_empty() {
        return Err(SpurwerkError::DegenerateGeometry(
            "cannot average an empty bucket".into(),
        ));
    }

    let weight = |entry: &WeightedFit| match weighting {
        Weighting::Unweighted => 1.0,
        Weighting::LengthWeighted => entry.length,
    };

    let total: f64 = bucket.iter().map(weight).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(SpurwerkError::DegenerateGeometry(format!(
            "bucket weights sum to {total}"
        )));
    }

    let slope = bucket.iter().map(|e| weight(e) * e.fit.slope).sum::<f64>() / total;
    let intercept = bucket
        .iter()
        .map(|e| weight(e) * e.fit.intercept)
        .sum::<f64>()
        / total;
    Ok(FitLine::new(slope, intercept))
}

/// Turn an infinite line into a segment between two rows.
///
/// `rows` is `(near, far)`; x values are truncated toward zero.
pub fn back_project(fit: &FitLine, rows: (i32, i32)) -> Result<Segment> {
    let (near, far) = rows;
    let x_near = pixel_x(fit, near)?;
    let x_far = pixel_x(fit, far)?;
    Ok(Segment::new(x_near, near, x_far, far))
}

fn pixel_x(fit: &FitLine, row: i32) -> Result<i32> {
    let x = fit.x_at(f64::from(row)).ok_or_else(|| {
        SpurwerkError::DegenerateGeometry(format!(
            "line y = {} x + {} never reaches row {row}",
            fit.slope, fit.intercept
        ))
    })?;
    let x = x.trunc();
    if x < f64::from(i32::MIN) || x > f64::from(i32::MAX) {
        return Err(SpurwerkError::DegenerateGeometry(format!(
            "row {row} crossing at x = {x} is outside pixel range"
        )));
    }
    Ok(x as i32)
}

/// Collapses a frame's segments into exactly one line per lane side.
#[derive(Debug, Clone, Default)]
pub struct LaneAggregator {
    profile: CameraProfile,
    weighting: Weighting,
}

impl LaneAggregator {
    pub fn new(profile: CameraProfile, config: AggregationConfig) -> Self {
        Self {
            profile,
            weighting: config.weighting,
        }
    }

    /// Aggregate segments detected in a frame of the given height.
    ///
    /// Never fails: every degenerate case resolves to an absent side.
    #[instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn aggregate(&self, frame_height: u32, segments: &[Segment]) -> LanePair {
        if segments.is_empty() {
            debug!("No segments; both lanes absent");
            return LanePair::absent();
        }

        let buckets = LaneBuckets::classify(segments);
        let rows = self.profile.projection_rows(frame_height);
        debug!(
            left = buckets.left.len(),
            right = buckets.right.len(),
            skipped = buckets.skipped,
            "Segments classified"
        );

        LanePair::new(
            self.resolve_side(LaneSide::Left, &buckets, rows),
            self.resolve_side(LaneSide::Right, &buckets, rows),
        )
    }

    fn resolve_side(&self, side: LaneSide, buckets: &LaneBuckets, rows: (i32, i32)) -> LaneLine {
        let projected = mean_fit(buckets.bucket(side), self.weighting)
            .and_then(|mean| back_project(&mean, rows))
            .inspect_err(|err| debug!(%side, error = %err, "Lane side absent"));
        LaneLine::from(projected.ok())
    }
}
