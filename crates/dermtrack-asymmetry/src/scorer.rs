use crate::{AsymmetryError, AsymmetryImages, AsymmetryParams, AsymmetryResult, MirrorAxis, Moments};
use dermtrack_core::{warp_affine_gray, Affine2, GrayImage, GrayImageView};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Principal-axis mirrored-difference asymmetry scorer.
#[derive(Clone, Debug, Default)]
pub struct AsymmetryScorer {
    params: AsymmetryParams,
}

impl AsymmetryScorer {
    pub fn new(params: AsymmetryParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &AsymmetryParams {
        &self.params
    }

    /// Score a binary mask (background 0, foreground a single non-zero value).
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, mask), fields(width = mask.width, height = mask.height))
    )]
    pub fn score(&self, mask: &GrayImageView<'_>) -> Result<AsymmetryResult, AsymmetryError> {
        validate_mask(mask)?;

        let moments = Moments::from_mask(mask)?;
        let (Some(centroid), Some(theta)) = (moments.centroid(), moments.orientation()) else {
            debug!("empty mask, asymmetry is 0");
            return Ok(AsymmetryResult::degenerate());
        };

        let (w, h) = (mask.width, mask.height);
        let binary = GrayImage::from_fn(w, h, |x, y| if mask.get(x, y) != 0 { 255 } else { 0 });

        // aligned -> source is a rotation by +θ, i.e. the mask itself turns by -θ.
        let src_from_aligned = Affine2::rotation_about(centroid, theta);
        let mut aligned = warp_affine_gray(&binary.view(), &src_from_aligned, w, h);
        let threshold = self.params.foreground_threshold.max(1);
        for v in aligned.data.iter_mut() {
            *v = if *v >= threshold { 255 } else { 0 };
        }

        let aligned_area = aligned.count_nonzero();
        let axis2 = match self.params.mirror_axis {
            MirrorAxis::Centroid => Moments::from_mask(&aligned.view())?
                .centroid()
                .map(|c| (2.0 * c.x).round()),
            MirrorAxis::FrameCenter => Some((w - 1) as f64),
        };
        let Some(axis2) = axis2.filter(|_| aligned_area > 0) else {
            debug!("rotation left no foreground (area={}), asymmetry is 0", moments.area());
            let images = self.params.keep_images.then(|| AsymmetryImages {
                mirrored_mask: GrayImage::new(w, h),
                difference_map: GrayImage::new(w, h),
                aligned_mask: aligned,
            });
            return Ok(AsymmetryResult {
                score: 0.0,
                orientation: theta,
                area: moments.area(),
                images,
            });
        };

        // The axis is snapped to a half pixel, so the mirror is a pure pixel permutation.
        let mirror = Affine2::mirror_x(0.5 * axis2);
        let mirrored = warp_affine_gray(&aligned.view(), &mirror, w, h);

        let difference = GrayImage {
            width: w,
            height: h,
            data: aligned
                .data
                .iter()
                .zip(&mirrored.data)
                .map(|(&a, &b)| a.abs_diff(b))
                .collect(),
        };
        let score = difference.count_nonzero() as f64 / aligned_area as f64;

        debug!(
            "asymmetry score={:.4} theta={:.4} area={} aligned_area={} axis_x={:.1}",
            score,
            theta,
            moments.area(),
            aligned_area,
            0.5 * axis2
        );

        let images = self.params.keep_images.then_some(AsymmetryImages {
            aligned_mask: aligned,
            mirrored_mask: mirrored,
            difference_map: difference,
        });

        Ok(AsymmetryResult {
            score,
            orientation: theta,
            area: moments.area(),
            images,
        })
    }
}

/// Score `mask` with default parameters.
pub fn compute_asymmetry(mask: &GrayImageView<'_>) -> Result<AsymmetryResult, AsymmetryError> {
    AsymmetryScorer::default().score(mask)
}

fn validate_mask(mask: &GrayImageView<'_>) -> Result<(), AsymmetryError> {
    if mask.width == 0 || mask.height == 0 {
        return Err(AsymmetryError::invalid(format!(
            "mask must be two-dimensional, got {}x{}",
            mask.width, mask.height
        )));
    }
    if !mask.is_consistent() {
        return Err(AsymmetryError::invalid(format!(
            "buffer holds {} bytes, expected {}x{}",
            mask.data.len(),
            mask.width,
            mask.height
        )));
    }
    let mut foreground = None;
    for &v in mask.data.iter().filter(|&&v| v != 0) {
        match foreground {
            None => foreground = Some(v),
            Some(f) if f != v => {
                return Err(AsymmetryError::invalid(format!(
                    "mask is not binary (found foreground values {f} and {v})"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
