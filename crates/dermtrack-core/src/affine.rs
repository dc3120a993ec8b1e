use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix2, Matrix3, Point2, Vector2, Vector3};

/// 2D affine transform stored as a homogeneous 3x3 matrix with last row `[0 0 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: Matrix3<f64>,
}

impl Affine2 {
    pub fn new(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, tx, //
            0.0, 1.0, ty, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Linear part plus translation: `p' = a * p + t`.
    pub fn from_parts(a: Matrix2<f64>, t: Vector2<f64>) -> Self {
        Self::new(Matrix3::new(
            a[(0, 0)],
            a[(0, 1)],
            t.x, //
            a[(1, 0)],
            a[(1, 1)],
            t.y, //
            0.0,
            0.0,
            1.0,
        ))
    }

    /// Rotation by `angle` radians about `center`.
    ///
    /// In image coordinates (x right, y down) a positive angle turns the +x
    /// axis towards +y.
    pub fn rotation_about(center: Point2<f64>, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let r = Matrix2::new(c, -s, s, c);
        let t = center.coords - r * center.coords;
        Self::from_parts(r, t)
    }

    /// Mirror across the vertical line `x = axis_x`.
    pub fn mirror_x(axis_x: f64) -> Self {
        Self::new(Matrix3::new(
            -1.0,
            0.0,
            2.0 * axis_x, //
            0.0,
            1.0,
            0.0, //
            0.0,
            0.0,
            1.0,
        ))
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Affine2) -> Self {
        Self::new(self.m * other.m)
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(Self::new)
    }
}

/// Warp into an `out_w x out_h` image: for each dst pixel, map to src via
/// `src_from_dst` and sample bilinearly. Pixels mapped outside `src` are 0.
pub fn warp_affine_gray(
    src: &GrayImageView<'_>,
    src_from_dst: &Affine2,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = vec![0u8; out_w * out_h];

    for y in 0..out_h {
        for x in 0..out_w {
            let ps = src_from_dst.apply(Point2::new(x as f64, y as f64));
            out[y * out_w + x] = sample_bilinear_u8(src, ps.x as f32, ps.y as f32);
        }
    }

    GrayImage {
        width: out_w,
        height: out_h,
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn rotation_keeps_center_fixed() {
        let c = Point2::new(12.5, -3.0);
        let r = Affine2::rotation_about(c, 0.7);
        assert_close(r.apply(c), c, 1e-12);
    }

    #[test]
    fn quarter_turn_maps_x_axis_to_y_axis() {
        let r = Affine2::rotation_about(Point2::origin(), FRAC_PI_2);
        assert_close(r.apply(Point2::new(1.0, 0.0)), Point2::new(0.0, 1.0), 1e-12);
    }

    #[test]
    fn inverse_round_trips_points() {
        let a = Affine2::rotation_about(Point2::new(40.0, 30.0), 0.3)
            .compose(&Affine2::translation(5.0, -2.0));
        let inv = a.inverse().expect("invertible");
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(50.0, -20.0),
            Point2::new(320.0, 200.0),
        ] {
            assert_close(inv.apply(a.apply(p)), p, 1e-9);
        }
    }

    #[test]
    fn mirror_is_an_involution() {
        let m = Affine2::mirror_x(7.5);
        assert_close(m.apply(Point2::new(7.0, 2.0)), Point2::new(8.0, 2.0), 1e-12);
        assert_close(
            m.compose(&m).apply(Point2::new(3.0, 4.0)),
            Point2::new(3.0, 4.0),
            1e-12,
        );
    }

    #[test]
    fn identity_warp_copies_image() {
        let img = GrayImage::from_fn(5, 4, |x, y| if (x + y) % 2 == 0 { 255 } else { 0 });
        let out = warp_affine_gray(&img.view(), &Affine2::identity(), 5, 4);
        assert_eq!(out, img);
    }
}
