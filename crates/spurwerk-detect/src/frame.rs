// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame contract checks shared by the pipeline stages.

use image::{DynamicImage, RgbImage};
use spurwerk_core::error::{Result, SpurwerkError};

/// Reject frames with a zero dimension before any processing happens.
pub fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SpurwerkError::InvalidInput(format!(
            "frame must have non-zero dimensions, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Require two rasters to share the same size.
pub fn ensure_same_size(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(SpurwerkError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Convert any decoded image into a 3-channel colour frame.
///
/// Single-channel intensity images are expanded by channel replication.
pub fn to_color_frame(image: &DynamicImage) -> Result<RgbImage> {
    ensure_non_empty(image.width(), image.height())?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn zero_dimension_is_invalid_input() {
        assert!(matches!(
            ensure_non_empty(0, 10),
            Err(SpurwerkError::InvalidInput(_))
        ));
        assert!(ensure_non_empty(1, 1).is_ok());
    }

    #[test]
    fn size_mismatch_is_reported() {
        let err = ensure_same_size((4, 4), (4, 5)).unwrap_err();
        assert!(matches!(
            err,
            SpurwerkError::DimensionMismatch {
                expected: (4, 4),
                actual: (4, 5)
            }
        ));
    }

    #[test]
    fn grayscale_input_expands_to_color() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 2, Luma([77u8])));
        let frame = to_color_frame(&gray).unwrap();
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.get_pixel(2, 1).0, [77, 77, 77]);
    }
}
