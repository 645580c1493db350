// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region-of-interest masking. Zeroes every edge pixel that falls outside the
// road-surface polygon of the active camera profile.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use spurwerk_core::config::RegionOfInterest;
use spurwerk_core::error::{Result, SpurwerkError};
use tracing::{debug, instrument};

use crate::edge::EdgeMap;
use crate::frame::{ensure_non_empty, ensure_same_size};

/// Restricts edge maps to a fixed polygon.
#[derive(Debug, Clone, Default)]
pub struct RegionMasker {
    region: RegionOfInterest,
}

impl RegionMasker {
    pub fn new(region: RegionOfInterest) -> Self {
        Self { region }
    }

    pub fn region(&self) -> &RegionOfInterest {
        &self.region
    }

    /// Binary mask (255 inside the polygon) for a frame of the given size.
    pub fn mask(&self, width: u32, height: u32) -> Result<GrayImage> {
        ensure_non_empty(width, height)?;

        let points: Vec<Point<i32>> = self
            .region
            .resolve(width, height)
            .into_iter()
            .map(|(x, y)| Point::new(x, y))
            .collect();

        if points.len() < 3 {
            return Err(SpurwerkError::InvalidInput(format!(
                "region polygon needs at least 3 vertices, got {}",
                points.len()
            )));
        }
        if points.first() == points.last() {
            return Err(SpurwerkError::InvalidInput(format!(
                "region polygon closes on itself at {:?} for a {width}x{height} frame",
                points[0]
            )));
        }

        let mut mask = GrayImage::new(width, height);
        draw_polygon_mut(&mut mask, &points, Luma([255u8]));
        Ok(mask)
    }

    /// Zero every edge pixel outside the region of interest.
    #[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
    pub fn apply(&self, edges: &EdgeMap) -> Result<EdgeMap> {
        let mask = self.mask(edges.width(), edges.height())?;
        let masked = bitwise_and(edges, &mask)?;
        debug!(
            before = edges.edge_count(),
            after = masked.edge_count(),
            "Region of interest applied"
        );
        Ok(masked)
    }
}

/// Pixel-wise AND of an edge map with a mask of the same size.
pub fn bitwise_and(edges: &EdgeMap, mask: &GrayImage) -> Result<EdgeMap> {
    ensure_same_size(edges.dimensions(), mask.dimensions())?;

    let mut out = edges.as_gray().clone();
    for (pixel, m) in out.pixels_mut().zip(mask.pixels()) {
        pixel.0[0] &= m.0[0];
    }
    Ok(EdgeMap::from_gray(out))
}
