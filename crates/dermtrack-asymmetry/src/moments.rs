use crate::AsymmetryError;
use dermtrack_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Binary image moments up to second order.
///
/// Every non-zero pixel contributes weight 1 at its pixel-center coordinate
/// `(x, y)`. Central moments are the raw sums around the centroid; they are
/// *not* divided by the area (see [`Moments::normalized_central`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub mu20: f64,
    pub mu02: f64,
    pub mu11: f64,
}

impl Moments {
    /// Compute moments of the foreground (non-zero) pixels of `mask`.
    ///
    /// Fails when the buffer length does not match `width * height`.
    pub fn from_mask(mask: &GrayImageView<'_>) -> Result<Self, AsymmetryError> {
        if !mask.is_consistent() {
            return Err(AsymmetryError::invalid(format!(
                "buffer holds {} bytes, expected {}x{}",
                mask.data.len(),
                mask.width,
                mask.height
            )));
        }
        let mut m = Moments::default();
        for y in 0..mask.height {
            let row = &mask.data[y * mask.width..(y + 1) * mask.width];
            for (x, &v) in row.iter().enumerate() {
                if v != 0 {
                    m.m00 += 1.0;
                    m.m10 += x as f64;
                    m.m01 += y as f64;
                }
            }
        }
        if m.m00 == 0.0 {
            return Ok(m);
        }

        // Second pass around the centroid keeps symmetric shapes exactly symmetric.
        let (cx, cy) = (m.m10 / m.m00, m.m01 / m.m00);
        for y in 0..mask.height {
            let row = &mask.data[y * mask.width..(y + 1) * mask.width];
            let dy = y as f64 - cy;
            for (x, &v) in row.iter().enumerate() {
                if v != 0 {
                    let dx = x as f64 - cx;
                    m.mu20 += dx * dx;
                    m.mu02 += dy * dy;
                    m.mu11 += dx * dy;
                }
            }
        }
        Ok(m)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.m00
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.m00 == 0.0
    }

    /// Centroid `(m10/m00, m01/m00)`, or `None` for an empty mask.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(Point2::new(self.m10 / self.m00, self.m01 / self.m00))
    }

    /// `(μ20, μ02, μ11)` divided by the area.
    pub fn normalized_central(&self) -> Option<(f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        Some((
            self.mu20 / self.m00,
            self.mu02 / self.m00,
            self.mu11 / self.m00,
        ))
    }

    /// Angle of the principal axis, `0.5 · atan2(2·μ11, μ20 − μ02)`, in radians.
    ///
    /// Measured in image coordinates (x right, y down), so the axis direction
    /// is `(cos θ, sin θ)`. Shapes with no preferred direction yield 0.
    pub fn orientation(&self) -> Option<f64> {
        let (mu20, mu02, mu11) = self.normalized_central()?;
        Some(0.5 * (2.0 * mu11).atan2(mu20 - mu02))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use dermtrack_core::GrayImage;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn empty_mask_has_no_centroid() {
        let img = GrayImage::new(8, 8);
        let m = Moments::from_mask(&img.view()).unwrap();
        assert!(m.is_empty());
        assert!(m.centroid().is_none());
        assert!(m.orientation().is_none());
    }

    #[test]
    fn inconsistent_buffer_is_an_error() {
        let data = [255u8; 5];
        let view = GrayImageView {
            width: 3,
            height: 2,
            data: &data,
        };
        let err = Moments::from_mask(&view).unwrap_err();
        assert!(err.to_string().contains("buffer holds 5 bytes"));
    }

    #[test]
    fn rectangle_centroid_and_axis() {
        // 10 wide, 4 tall, top-left at (3, 5).
        let img = GrayImage::from_fn(20, 20, |x, y| {
            if (3..13).contains(&x) && (5..9).contains(&y) {
                1
            } else {
                0
            }
        });
        let m = Moments::from_mask(&img.view()).unwrap();
        assert_eq!(m.area(), 40.0);
        let c = m.centroid().unwrap();
        assert_abs_diff_eq!(c.x, 7.5, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 6.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.orientation().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tall_rectangle_is_vertical() {
        let img = GrayImage::from_fn(20, 20, |x, y| {
            if (8..11).contains(&x) && (2..18).contains(&y) {
                255
            } else {
                0
            }
        });
        let theta = Moments::from_mask(&img.view()).unwrap().orientation().unwrap();
        assert_abs_diff_eq!(theta.abs(), std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn diagonal_line_is_forty_five_degrees() {
        let img = GrayImage::from_fn(16, 16, |x, y| if x == y { 255 } else { 0 });
        let theta = Moments::from_mask(&img.view()).unwrap().orientation().unwrap();
        assert_abs_diff_eq!(theta, FRAC_PI_4, epsilon = 1e-9);
    }
}
