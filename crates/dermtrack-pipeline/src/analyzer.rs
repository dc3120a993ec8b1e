use crate::{gray_view, BoxError, LesionAnalyzer, MaskSegmenter};
use dermtrack_asymmetry::{AsymmetryParams, AsymmetryScorer};
use image::{DynamicImage, GrayImage};
use log::debug;
use serde::{Deserialize, Serialize};

/// Metrics reported for a single lesion crop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LesionMetrics {
    /// Mirrored-difference asymmetry score, `>= 0`.
    pub asymmetry: f64,
    /// Principal-axis angle of the mask in radians.
    pub orientation: f64,
    /// Mask area in crop pixels.
    pub mask_area: f64,
}

/// Intensity-threshold segmenter for lesions darker than the surrounding skin.
///
/// Pixels whose luma is below `threshold` become 255, the rest 0.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdSegmenter {
    pub threshold: u8,
}

impl ThresholdSegmenter {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl MaskSegmenter for ThresholdSegmenter {
    fn segment(&self, crop: &DynamicImage) -> Result<GrayImage, BoxError> {
        let mut mask = crop.to_luma8();
        for p in mask.pixels_mut() {
            p.0[0] = if p.0[0] < self.threshold { 255 } else { 0 };
        }
        Ok(mask)
    }
}

/// Segment a crop, then score the asymmetry of the resulting mask.
///
/// The segmenter's output is binarized at `mask_threshold` first, so soft
/// probability masks are accepted.
pub struct AsymmetryAnalyzer<S> {
    segmenter: S,
    scorer: AsymmetryScorer,
    mask_threshold: u8,
}

impl<S: MaskSegmenter> AsymmetryAnalyzer<S> {
    pub fn new(segmenter: S, params: AsymmetryParams) -> Self {
        Self {
            segmenter,
            scorer: AsymmetryScorer::new(params),
            mask_threshold: 128,
        }
    }

    /// Override the binarization threshold applied to segmenter output.
    pub fn with_mask_threshold(mut self, threshold: u8) -> Self {
        self.mask_threshold = threshold.max(1);
        self
    }
}

impl<S: MaskSegmenter> LesionAnalyzer for AsymmetryAnalyzer<S> {
    type Output = LesionMetrics;

    fn analyze(&self, crop: &DynamicImage) -> Result<LesionMetrics, BoxError> {
        let mut mask = self.segmenter.segment(crop)?;
        if mask.dimensions() != (crop.width(), crop.height()) {
            return Err(format!(
                "segmenter returned a {}x{} mask for a {}x{} crop",
                mask.width(),
                mask.height(),
                crop.width(),
                crop.height()
            )
            .into());
        }
        for p in mask.pixels_mut() {
            p.0[0] = if p.0[0] >= self.mask_threshold { 255 } else { 0 };
        }

        let result = self.scorer.score(&gray_view(&mask))?;
        debug!(
            "asymmetry {:.4} (area {}, theta {:.3})",
            result.score, result.area, result.orientation
        );
        Ok(LesionMetrics {
            asymmetry: result.score,
            orientation: result.orientation,
            mask_area: result.area,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::{Luma, Rgb, RgbImage};

    /// Soft disc mask: 200 inside radius `r`, 40 outside.
    struct DiscSegmenter {
        r: f64,
    }

    impl MaskSegmenter for DiscSegmenter {
        fn segment(&self, crop: &DynamicImage) -> Result<GrayImage, BoxError> {
            let (w, h) = (crop.width(), crop.height());
            let (cx, cy) = ((w / 2) as f64, (h / 2) as f64);
            Ok(GrayImage::from_fn(w, h, |x, y| {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                Luma([if d2 <= self.r * self.r { 200 } else { 40 }])
            }))
        }
    }

    struct WrongSizeSegmenter;

    impl MaskSegmenter for WrongSizeSegmenter {
        fn segment(&self, _crop: &DynamicImage) -> Result<GrayImage, BoxError> {
            Ok(GrayImage::new(3, 3))
        }
    }

    fn crop(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(w, h))
    }

    #[test]
    fn soft_disc_mask_is_nearly_symmetric() {
        let analyzer = AsymmetryAnalyzer::new(DiscSegmenter { r: 15.0 }, AsymmetryParams::default());
        let m = analyzer.analyze(&crop(64, 64)).unwrap();
        assert!(m.asymmetry < 0.02, "asymmetry = {}", m.asymmetry);
        assert!(m.mask_area > 600.0);
    }

    #[test]
    fn empty_mask_scores_zero() {
        let analyzer = AsymmetryAnalyzer::new(DiscSegmenter { r: 15.0 }, AsymmetryParams::default())
            .with_mask_threshold(250);
        let m = analyzer.analyze(&crop(32, 32)).unwrap();
        assert_abs_diff_eq!(m.asymmetry, 0.0);
        assert_abs_diff_eq!(m.mask_area, 0.0);
    }

    #[test]
    fn threshold_segmenter_marks_dark_pixels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(4, 1, |x, _| {
            if x < 2 {
                Rgb([20, 20, 20])
            } else {
                Rgb([220, 200, 180])
            }
        }));
        let mask = ThresholdSegmenter::new(100).segment(&img).unwrap();
        assert_eq!(mask.as_raw(), &vec![255, 255, 0, 0]);
    }

    #[test]
    fn mismatched_mask_size_is_an_error() {
        let analyzer = AsymmetryAnalyzer::new(WrongSizeSegmenter, AsymmetryParams::default());
        let err = analyzer.analyze(&crop(10, 12)).unwrap_err();
        assert!(err.to_string().contains("3x3"));
    }
}
