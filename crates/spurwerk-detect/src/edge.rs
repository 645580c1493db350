// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge extraction: grayscale conversion, Gaussian smoothing, and Canny edge
// detection with fixed hysteresis thresholds.

use image::{GrayImage, Luma, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use spurwerk_core::config::{BlurPolicy, EdgeConfig};
use spurwerk_core::error::Result;
use tracing::{debug, instrument};

use crate::frame::ensure_non_empty;

/// Binary single-channel raster: 255 where an edge was detected, 0 elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    image: GrayImage,
}

impl EdgeMap {
    /// Wrap a grayscale raster, mapping every non-zero pixel to 255.
    pub fn from_gray(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel.0[0] != 0 {
                pixel.0[0] = 255;
            }
        }
        Self { image }
    }

    /// An edge map with no edges.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] != 0).count()
    }

    /// Borrow the underlying raster.
    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the map and return the underlying raster.
    pub fn into_gray(self) -> GrayImage {
        self.image
    }
}

/// Converts colour frames into binary edge maps.
#[derive(Debug, Clone)]
pub struct EdgeExtractor {
    config: EdgeConfig,
    kernel: Vec<f32>,
}

impl EdgeExtractor {
    pub fn new(config: EdgeConfig) -> Self {
        let kernel = gaussian_kernel(config.blur_kernel_size);
        Self { config, kernel }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Produce the edge map for one colour frame.
    ///
    /// With `BlurPolicy::Skip` the Canny detector runs on the unsmoothed
    /// grayscale image and relies on its own internal smoothing.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn extract(&self, frame: &RgbImage) -> Result<EdgeMap> {
        ensure_non_empty(frame.width(), frame.height())?;

        let gray = grayscale(frame);
        let source = match self.config.blur_policy {
            BlurPolicy::Skip => gray,
            BlurPolicy::Apply => self.smooth(&gray),
        };

        let edges = canny(
            &source,
            self.config.low_threshold,
            self.config.high_threshold,
        );
        let map = EdgeMap::from_gray(edges);
        debug!(
            edge_pixels = map.edge_count(),
            blur = ?self.config.blur_policy,
            "Edge map extracted"
        );
        Ok(map)
    }

    /// Apply the fixed-size separable Gaussian blur.
    pub fn smooth(&self, gray: &GrayImage) -> GrayImage {
        separable_filter_equal(gray, &self.kernel)
    }
}

impl Default for EdgeExtractor {
    fn default() -> Self {
        Self::new(EdgeConfig::default())
    }
}

/// Luma-weighted grayscale conversion.
pub fn grayscale(frame: &RgbImage) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// 1-D Gaussian kernel of odd length `size` with the default variance for
/// that size.
///
/// Sizes up to 7 use the fixed binomial-style tables; larger sizes derive
/// sigma as `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8;
            let center = f64::from(size / 2);
            let weights: Vec<f64> = (0..size)
                .map(|i| {
                    let d = f64::from(i) - center;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let total: f64 = weights.iter().sum();
            weights.iter().map(|w| (w / total) as f32).collect()
        }
    }
}

/// Whether a grayscale raster only holds the values 0 and 255.
pub fn is_binary(image: &GrayImage) -> bool {
    image.pixels().all(|&Luma([v])| v == 0 || v == 255)
}
