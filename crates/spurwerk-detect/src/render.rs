// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay rendering: draw lane lines on a blank canvas and alpha-blend it
// onto the source frame.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use spurwerk_core::config::RenderConfig;
use spurwerk_core::error::Result;
use spurwerk_core::types::{LanePair, Segment};
use tracing::{debug, instrument};

use crate::frame::{ensure_non_empty, ensure_same_size};

/// Draws lane lines and composites them onto frames.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Composite the lane overlay onto a frame. Absent lines draw nothing.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn render(&self, frame: &RgbImage, lanes: &LanePair) -> Result<RgbImage> {
        ensure_non_empty(frame.width(), frame.height())?;
        let canvas = self.draw_lines(frame.width(), frame.height(), lanes);
        let composited = self.blend(frame, &canvas)?;
        debug!(lines = lanes.segments().count(), "Overlay composited");
        Ok(composited)
    }

    /// Blank canvas with every present lane line drawn on it.
    pub fn draw_lines(&self, width: u32, height: u32, lanes: &LanePair) -> RgbImage {
        let mut canvas = RgbImage::new(width, height);
        let color = Rgb(self.config.color);
        for segment in lanes.segments() {
            draw_thick_segment_mut(&mut canvas, segment, self.config.thickness, color);
        }
        canvas
    }

    /// `frame * frame_weight + overlay * overlay_weight + offset`, saturated.
    pub fn blend(&self, frame: &RgbImage, overlay: &RgbImage) -> Result<RgbImage> {
        ensure_same_size(frame.dimensions(), overlay.dimensions())?;

        let RenderConfig {
            frame_weight,
            overlay_weight,
            offset,
            ..
        } = self.config;

        let mut out = RgbImage::new(frame.width(), frame.height());
        for ((dst, src), over) in out.pixels_mut().zip(frame.pixels()).zip(overlay.pixels()) {
            for c in 0..3 {
                let value = f32::from(src.0[c]) * frame_weight
                    + f32::from(over.0[c]) * overlay_weight
                    + offset;
                dst.0[c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(out)
    }
}

/// Draw a segment `thickness` pixels wide with round caps.
///
/// The segment is clipped to the canvas (plus a stroke-width margin) first,
/// so far-off endpoints cost nothing to rasterise.
pub fn draw_thick_segment_mut(
    canvas: &mut RgbImage,
    segment: &Segment,
    thickness: u32,
    color: Rgb<u8>,
) {
    let margin = f64::from(thickness);
    let bounds = (
        -margin,
        -margin,
        f64::from(canvas.width()) + margin,
        f64::from(canvas.height()) + margin,
    );
    let start = (f64::from(segment.x1), f64::from(segment.y1));
    let end = (f64::from(segment.x2), f64::from(segment.y2));
    let Some((start, end)) = clip_segment(start, end, bounds) else {
        return;
    };

    if thickness <= 1 {
        draw_line_segment_mut(
            canvas,
            (start.0 as f32, start.1 as f32),
            (end.0 as f32, end.1 as f32),
            color,
        );
        return;
    }

    let radius = f64::from(thickness) / 2.0;
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.hypot(dy);

    if length >= 1.0 {
        let (nx, ny) = (-dy / length * radius, dx / length * radius);
        let corner = |(x, y): (f64, f64), sign: f64| {
            Point::new((x + sign * nx).round() as i32, (y + sign * ny).round() as i32)
        };
        let quad = [
            corner(start, 1.0),
            corner(end, 1.0),
            corner(end, -1.0),
            corner(start, -1.0),
        ];
        if quad[0] != quad[3] {
            draw_polygon_mut(canvas, &quad, color);
        }
    }

    let cap = radius.round() as i32;
    for (x, y) in [start, end] {
        draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), cap, color);
    }
}

/// Liang–Barsky clipping of a segment to `(x_min, y_min, x_max, y_max)`.
fn clip_segment(
    start: (f64, f64),
    end: (f64, f64),
    (x_min, y_min, x_max, y_max): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, start.0 - x_min),
        (dx, x_max - start.0),
        (-dy, start.1 - y_min),
        (dy, y_max - start.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (start.0 + t0 * dx, start.1 + t0 * dy),
        (start.0 + t1 * dx, start.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spurwerk_core::types::LaneLine;
    use spurwerk_core::SpurwerkError;

    const BLUE: [u8; 3] = [0, 0, 255];

    #[test]
    fn output_matches_input_dimensions() {
        let frame = RgbImage::from_pixel(320, 200, Rgb([10, 20, 30]));
        let out = Renderer::default().render(&frame, &LanePair::absent()).unwrap();
        assert_eq!(out.dimensions(), frame.dimensions());
    }

    #[test]
    fn undrawn_pixels_are_scaled_by_frame_weight() {
        let frame = RgbImage::from_pixel(64, 64, Rgb([100, 200, 255]));
        let out = Renderer::default().render(&frame, &LanePair::absent()).unwrap();
        for pixel in out.pixels() {
            assert_eq!(pixel.0, [80, 160, 204]);
        }
    }

    #[test]
    fn lane_pixels_saturate_blue_channel() {
        let frame = RgbImage::from_pixel(200, 200, Rgb([50, 50, 50]));
        let lanes = LanePair::new(
            LaneLine::Present(Segment::new(20, 199, 60, 100)),
            LaneLine::Absent,
        );
        let out = Renderer::default().render(&frame, &lanes).unwrap();

        // On the stroke: 50 * 0.8 + 255 saturates blue.
        assert_eq!(out.get_pixel(40, 150).0, [40, 40, 255]);
        // Well away from it.
        assert_eq!(out.get_pixel(180, 20).0, [40, 40, 40]);
    }

    #[test]
    fn stroke_is_roughly_ten_pixels_wide() {
        let lanes = LanePair::new(
            LaneLine::Absent,
            LaneLine::Present(Segment::new(100, 20, 100, 180)),
        );
        let canvas = Renderer::default().draw_lines(200, 200, &lanes);
        let row: Vec<u32> = (0..200)
            .filter(|&x| canvas.get_pixel(x, 100).0 == BLUE)
            .collect();
        assert!((9..=11).contains(&row.len()), "stroke width {}", row.len());
        assert!(row.contains(&96) && row.contains(&104));
    }

    #[test]
    fn far_off_endpoints_are_clipped() {
        let lanes = LanePair::new(
            LaneLine::Present(Segment::new(-2_000_000_000, 0, 2_000_000_000, 0)),
            LaneLine::Present(Segment::new(5_000, 5_000, 9_000, 9_000)),
        );
        let canvas = Renderer::default().draw_lines(100, 50, &lanes);
        assert_eq!(canvas.get_pixel(50, 2).0, BLUE);
        assert_eq!(canvas.get_pixel(50, 40).0, [0, 0, 0]);
    }

    #[test]
    fn blend_rejects_mismatched_overlay() {
        let frame = RgbImage::new(10, 10);
        let overlay = RgbImage::new(10, 9);
        assert!(matches!(
            Renderer::default().blend(&frame, &overlay),
            Err(SpurwerkError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn clip_keeps_inner_segment_and_drops_outer_one() {
        let bounds = (0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            clip_segment((2.0, 2.0), (8.0, 8.0), bounds),
            Some(((2.0, 2.0), (8.0, 8.0)))
        );
        assert_eq!(clip_segment((20.0, 0.0), (30.0, 5.0), bounds), None);
        let (a, b) = clip_segment((-10.0, 5.0), (20.0, 5.0), bounds).unwrap();
        assert!(a.0.abs() < 1e-9 && (b.0 - 10.0).abs() < 1e-9);
        assert_eq!((a.1, b.1), (5.0, 5.0));
    }
}
