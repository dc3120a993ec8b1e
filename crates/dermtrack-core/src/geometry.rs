//! Conversions between pixel space and unit-square space.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Errors produced by coordinate conversions.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("invalid image dimensions (width={width}, height={height}); both must be > 0")]
    InvalidDimensions { width: u32, height: u32 },
}

/// A point in unit-square coordinates, relative to some image's size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitPoint {
    pub u: f64,
    pub v: f64,
}

impl UnitPoint {
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    /// Euclidean distance in unit-square space.
    #[inline]
    pub fn distance(&self, other: &UnitPoint) -> f64 {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn distance_squared(&self, other: &UnitPoint) -> f64 {
        let du = self.u - other.u;
        let dv = self.v - other.v;
        du * du + dv * dv
    }

    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.u, self.v]
    }
}

/// A point in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PixelPoint> for Point2<f64> {
    fn from(p: PixelPoint) -> Self {
        Point2::new(p.x, p.y)
    }
}

impl From<Point2<f64>> for PixelPoint {
    fn from(p: Point2<f64>) -> Self {
        PixelPoint::new(p.x, p.y)
    }
}

/// Axis-aligned box `(x1, y1, x2, y2)` in unit-square coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl UnitBox {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// `0 <= x1 < x2 <= 1` and `0 <= y1 < y2 <= 1`.
    ///
    /// NaN coordinates fail every comparison and are therefore invalid.
    pub fn is_valid(&self) -> bool {
        0.0 <= self.x1
            && self.x1 < self.x2
            && self.x2 <= 1.0
            && 0.0 <= self.y1
            && self.y1 < self.y2
            && self.y2 <= 1.0
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    #[inline]
    pub fn center(&self) -> UnitPoint {
        UnitPoint::new(0.5 * (self.x1 + self.x2), 0.5 * (self.y1 + self.y2))
    }

    /// A box of the given size centered on `center`, clipped to the unit square.
    pub fn centered_at(center: UnitPoint, width: f64, height: f64) -> Self {
        let hw = 0.5 * width;
        let hh = 0.5 * height;
        Self {
            x1: (center.u - hw).clamp(0.0, 1.0),
            y1: (center.v - hh).clamp(0.0, 1.0),
            x2: (center.u + hw).clamp(0.0, 1.0),
            y2: (center.v + hh).clamp(0.0, 1.0),
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Integer pixel rectangle with *inclusive* corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    #[inline]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1 + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1 + 1
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Pixel point -> unit-square point for an image of `width x height`.
pub fn normalize(point: PixelPoint, width: u32, height: u32) -> Result<UnitPoint, GeometryError> {
    check_dimensions(width, height)?;
    Ok(UnitPoint::new(
        point.x / width as f64,
        point.y / height as f64,
    ))
}

/// Unit-square point -> pixel point for an image of `width x height`.
pub fn denormalize(
    point: UnitPoint,
    width: u32,
    height: u32,
) -> Result<PixelPoint, GeometryError> {
    check_dimensions(width, height)?;
    Ok(PixelPoint::new(
        point.u * width as f64,
        point.v * height as f64,
    ))
}

/// Inclusive pixel span `[start, end]` covered by the unit interval `[a, b]`.
///
/// `start = floor(a·size)` and the exclusive end `floor(b·size)` become
/// `end = floor(b·size) - 1`, so an edge on a pixel boundary does not pull in
/// the next pixel. Both ends are clamped to `[0, size-1]` and the span keeps
/// at least one pixel. `as` saturates, and NaN becomes 0.
#[inline]
fn pixel_span(a: f64, b: f64, size: u32) -> (u32, u32) {
    let n = size as f64;
    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
    let start = (lo * n).floor().clamp(0.0, n - 1.0) as u32;
    let end_exclusive = (hi * n).floor().clamp(0.0, n) as u32;
    (start, end_exclusive.saturating_sub(1).max(start))
}

/// Convert a unit-square box into an inclusive pixel rectangle.
///
/// Covers the same pixels as slicing `[floor(x1·w), floor(x2·w))`, clamped to
/// `[0, width-1] x [0, height-1]` so a box touching the right or bottom image
/// edge never reads past the last pixel. The result always covers at least
/// one pixel.
pub fn bbox_to_pixels(
    bbox: &UnitBox,
    width: u32,
    height: u32,
) -> Result<PixelRect, GeometryError> {
    check_dimensions(width, height)?;
    let (x1, x2) = pixel_span(bbox.x1, bbox.x2, width);
    let (y1, y2) = pixel_span(bbox.y1, bbox.y2, height);
    Ok(PixelRect { x1, y1, x2, y2 })
}
