// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// First-degree least-squares fitting of `y = slope * x + intercept`.

use spurwerk_core::error::{Result, SpurwerkError};
use spurwerk_core::types::{FitLine, Segment};

/// Fit a straight line through any number of points by ordinary least squares.
///
/// Fails with `DegenerateGeometry` when fewer than two points are given or
/// all points share one x coordinate, since no finite slope exists.
pub fn fit_line(points: &[(f64, f64)]) -> Result<FitLine> {
    if points.len() < 2 {
        return Err(SpurwerkError::DegenerateGeometry(format!(
            "line fit needs at least 2 points, got {}",
            points.len()
        )));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    if sxx == 0.0 {
        return Err(SpurwerkError::DegenerateGeometry(format!(
            "all points lie on the vertical x = {mean_x}"
        )));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(SpurwerkError::DegenerateGeometry(
            "line fit produced a non-finite coefficient".into(),
        ));
    }
    Ok(FitLine::new(slope, intercept))
}

/// Fit the line through a segment's two endpoints.
pub fn fit_segment(segment: &Segment) -> Result<FitLine> {
    if segment.is_vertical() {
        return Err(SpurwerkError::DegenerateGeometry(format!(
            "segment is vertical at x = {}",
            segment.x1
        )));
    }
    let points = segment
        .endpoints()
        .map(|(x, y)| (f64::from(x), f64::from(y)));
    fit_line(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_points_fit_exactly() {
        let fit = fit_segment(&Segment::new(0, 10, 10, 30)).unwrap();
        assert_eq!(fit, FitLine::new(2.0, 10.0));
    }

    #[test]
    fn endpoint_order_does_not_matter() {
        let a = fit_segment(&Segment::new(200, 720, 550, 250)).unwrap();
        let b = fit_segment(&Segment::new(550, 250, 200, 720)).unwrap();
        assert!((a.slope - b.slope).abs() < 1e-12);
        assert!((a.intercept - b.intercept).abs() < 1e-9);
        assert!(a.slope < 0.0);
    }

    #[test]
    fn many_points_use_least_squares() {
        // Staircase points; closed form gives slope 0.8, intercept 1.3.
        let points = [(0.0, 1.5), (1.0, 1.5), (2.0, 3.5), (3.0, 3.5)];
        let fit = fit_line(&points).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 1.3).abs() < 1e-12);
    }

    #[test]
    fn vertical_segment_is_degenerate() {
        let err = fit_segment(&Segment::new(5, 0, 5, 100)).unwrap_err();
        assert!(matches!(err, SpurwerkError::DegenerateGeometry(ref msg) if msg.contains("x = 5")));
    }

    #[test]
    fn single_point_is_degenerate() {
        assert!(fit_line(&[(1.0, 2.0)]).is_err());
        assert!(fit_segment(&Segment::new(3, 3, 3, 3)).is_err());
    }
}
