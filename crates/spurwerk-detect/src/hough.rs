// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Segment detection via the progressive probabilistic Hough transform.
//
// Edge pixels are visited in random order. Each visited pixel votes in a
// (rho, theta) accumulator; once some bin reaches the vote threshold, the
// detector walks along that line in both directions from the pixel, tolerating
// gaps of up to `max_line_gap`, and reports the walked span as a segment if it
// is long enough. Pixels on an accepted segment withdraw their votes and are
// removed from further consideration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spurwerk_core::config::HoughConfig;
use spurwerk_core::types::Segment;
use tracing::{debug, instrument};

use crate::edge::EdgeMap;

/// Fixed-point fraction bits used while stepping along a candidate line.
const FIXED_SHIFT: u32 = 16;

/// Extracts straight line segments from an edge map.
#[derive(Debug, Clone, Default)]
pub struct SegmentDetector {
    config: HoughConfig,
}

impl SegmentDetector {
    pub fn new(config: HoughConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HoughConfig {
        &self.config
    }

    /// Detect every segment that crosses the vote threshold.
    ///
    /// An edge map with no edge pixels yields an empty list.
    #[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
    pub fn detect(&self, edges: &EdgeMap) -> Vec<Segment> {
        let (width, height) = edges.dimensions();
        let mut mask = PixelMask::from_edges(edges);
        let mut points = mask.points();
        if points.is_empty() {
            debug!("No edge pixels; skipping segment detection");
            return Vec::new();
        }

        let mut accumulator = Accumulator::new(width, height, &self.config);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let threshold = self.config.vote_threshold as i32;
        let min_length = self.config.min_line_length as i32;
        let max_gap = self.config.max_line_gap as i32;

        let mut segments = Vec::new();

        for remaining in (1..=points.len()).rev() {
            // Draw a random pending point and retire it.
            let idx = rng.random_range(0..remaining);
            let (px, py) = points[idx];
            points[idx] = points[remaining - 1];

            // Already consumed by an earlier segment.
            if !mask.get(px, py) {
                continue;
            }

            let (max_votes, best_angle) = accumulator.vote(px, py);
            if max_votes < threshold {
                continue;
            }

            let stepper = LineStepper::new(px, py, accumulator.direction(best_angle));

            // Find how far the line extends each way, allowing short gaps.
            let mut ends = [(px, py); 2];
            for (k, end) in ends.iter_mut().enumerate() {
                let mut gap = 0;
                for (x, y) in stepper.walk(k == 1) {
                    if !mask.contains(x, y) {
                        break;
                    }
                    if mask.get(x, y) {
                        gap = 0;
                        *end = (x, y);
                    } else {
                        gap += 1;
                        if gap > max_gap {
                            break;
                        }
                    }
                }
            }

            let good_line = (ends[1].0 - ends[0].0).abs() >= min_length
                || (ends[1].1 - ends[0].1).abs() >= min_length;

            // Consume the walked pixels; withdraw their votes if the line is kept.
            for (k, end) in ends.iter().enumerate() {
                for (x, y) in stepper.walk(k == 1) {
                    if !mask.contains(x, y) {
                        break;
                    }
                    if mask.get(x, y) {
                        if good_line {
                            accumulator.unvote(x, y);
                        }
                        mask.clear(x, y);
                    }
                    if (x, y) == *end {
                        break;
                    }
                }
            }

            if good_line {
                segments.push(Segment::new(ends[0].0, ends[0].1, ends[1].0, ends[1].1));
                if self
                    .config
                    .max_lines
                    .is_some_and(|max| segments.len() >= max)
                {
                    break;
                }
            }
        }

        debug!(segments = segments.len(), "Segments detected");
        segments
    }
}

/// Row-major edge membership, cleared as pixels are consumed.
struct PixelMask {
    width: i32,
    height: i32,
    bits: Vec<bool>,
}

impl PixelMask {
    fn from_edges(edges: &EdgeMap) -> Self {
        let (width, height) = edges.dimensions();
        let bits = edges.as_gray().pixels().map(|p| p.0[0] != 0).collect();
        Self {
            width: width as i32,
            height: height as i32,
            bits,
        }
    }

    fn points(&self) -> Vec<(i32, i32)> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(i, _)| ((i as i32) % self.width, (i as i32) / self.width))
            .collect()
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn get(&self, x: i32, y: i32) -> bool {
        self.bits[(y * self.width + x) as usize]
    }

    fn clear(&mut self, x: i32, y: i32) {
        self.bits[(y * self.width + x) as usize] = false;
    }
}

/// Vote counts indexed by `[angle][rho]`.
struct Accumulator {
    num_angles: usize,
    num_rho: usize,
    /// `(cos, sin)` of each angle, pre-divided by the rho resolution.
    trig: Vec<(f64, f64)>,
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: u32, height: u32, config: &HoughConfig) -> Self {
        let inv_rho = 1.0 / config.rho;
        let num_angles = ((std::f64::consts::PI / config.theta).round() as usize).max(1);
        let diagonal_span = f64::from((width + height) * 2 + 1);
        let num_rho = ((diagonal_span / config.rho).round() as usize).max(1);

        let trig = (0..num_angles)
            .map(|n| {
                let angle = n as f64 * config.theta;
                (angle.cos() * inv_rho, angle.sin() * inv_rho)
            })
            .collect();

        Self {
            num_angles,
            num_rho,
            trig,
            votes: vec![0; num_angles * num_rho],
        }
    }

    fn rho_bin(&self, x: i32, y: i32, angle: usize) -> usize {
        let (c, s) = self.trig[angle];
        let r = (f64::from(x) * c + f64::from(y) * s).round() as i64;
        let offset = (self.num_rho as i64 - 1) / 2;
        (r + offset).clamp(0, self.num_rho as i64 - 1) as usize
    }

    /// Add the pixel's votes; return the strongest bin count and its angle.
    fn vote(&mut self, x: i32, y: i32) -> (i32, usize) {
        let mut best = (0, 0);
        for angle in 0..self.num_angles {
            let idx = angle * self.num_rho + self.rho_bin(x, y, angle);
            self.votes[idx] += 1;
            if self.votes[idx] > best.0 {
                best = (self.votes[idx], angle);
            }
        }
        best
    }

    fn unvote(&mut self, x: i32, y: i32) {
        for angle in 0..self.num_angles {
            let idx = angle * self.num_rho + self.rho_bin(x, y, angle);
            self.votes[idx] -= 1;
        }
    }

    /// Unit step along the line whose normal has the given angle, scaled by
    /// the rho resolution.
    fn direction(&self, angle: usize) -> (f64, f64) {
        let (c, s) = self.trig[angle];
        (-s, c)
    }
}

/// Steps pixel by pixel along a line, one whole pixel on the dominant axis
/// and a fixed-point fraction on the other.
struct LineStepper {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    /// Whether x is the dominant (integer) axis.
    x_major: bool,
}

impl LineStepper {
    fn new(x: i32, y: i32, (a, b): (f64, f64)) -> Self {
        let half = 1i64 << (FIXED_SHIFT - 1);
        let scale = f64::from(1u32 << FIXED_SHIFT);
        if a.abs() > b.abs() {
            Self {
                x0: i64::from(x),
                y0: (i64::from(y) << FIXED_SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * scale / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: (i64::from(x) << FIXED_SHIFT) + half,
                y0: i64::from(y),
                dx: (a * scale / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixel positions starting at the seed, forwards or backwards. Unbounded;
    /// callers stop on their own conditions.
    fn walk(&self, backwards: bool) -> impl Iterator<Item = (i32, i32)> {
        let (dx, dy) = if backwards {
            (-self.dx, -self.dy)
        } else {
            (self.dx, self.dy)
        };
        let x_major = self.x_major;
        let mut x = self.x0;
        let mut y = self.y0;
        std::iter::from_fn(move || {
            let pixel = if x_major {
                (x, y >> FIXED_SHIFT)
            } else {
                (x >> FIXED_SHIFT, y)
            };
            x += dx;
            y += dy;
            Some((
                pixel.0.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
                pixel.1.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            ))
        })
    }
}
