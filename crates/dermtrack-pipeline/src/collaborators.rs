//! Interfaces to the machine-learned collaborators the pipeline drives.
//!
//! The pipeline never loads or runs a model itself. Detectors, matchers and
//! segmenters are injected as trait objects or generic parameters, so tests
//! can substitute deterministic stubs.

use dermtrack_core::{normalize, Detection, GeometryError, KeypointCorrespondence, PixelPoint};
use image::{DynamicImage, GrayImage};

/// Boxed error crossing a collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Object detector locating candidate lesions in a full image.
pub trait LesionDetector {
    /// Detections with bounding boxes in unit-square coordinates of `image`.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, BoxError>;
}

/// Dense keypoint matcher between two photographs of the same skin area.
pub trait KeypointMatcher {
    /// Correspondences `A -> B`, both sides in their image's unit-square
    /// coordinates. See [`correspondences_from_working_pixels`] for matchers
    /// that report pixels at a resized working resolution.
    fn match_pair(
        &self,
        image_a: &DynamicImage,
        image_b: &DynamicImage,
    ) -> Result<Vec<KeypointCorrespondence>, BoxError>;
}

/// Per-lesion analysis run on every crop.
///
/// Implementations must be shareable across threads; the orchestrator may
/// dispatch crops in parallel.
pub trait LesionAnalyzer: Send + Sync {
    type Output: Send;

    fn analyze(&self, crop: &DynamicImage) -> Result<Self::Output, BoxError>;
}

/// Segmentation model producing a lesion mask for a crop.
///
/// The mask has the crop's dimensions; non-zero pixels are lesion.
pub trait MaskSegmenter: Send + Sync {
    fn segment(&self, crop: &DynamicImage) -> Result<GrayImage, BoxError>;
}

/// Detector replaying detections computed elsewhere.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedDetections(pub Vec<Detection>);

impl LesionDetector for PrecomputedDetections {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Matcher replaying correspondences computed elsewhere.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedCorrespondences(pub Vec<KeypointCorrespondence>);

impl KeypointMatcher for PrecomputedCorrespondences {
    fn match_pair(
        &self,
        _image_a: &DynamicImage,
        _image_b: &DynamicImage,
    ) -> Result<Vec<KeypointCorrespondence>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Rescale matcher keypoints from working-resolution pixels to unit-square
/// coordinates.
///
/// Matchers typically resize both inputs to a fixed working size. Each pair
/// is `(pixel in A's working frame, pixel in B's working frame)`; the frames
/// are given as `(width, height)`. Normalizing by the working size yields
/// coordinates that are valid for the native images as well.
pub fn correspondences_from_working_pixels(
    pairs: &[(PixelPoint, PixelPoint)],
    working_a: (u32, u32),
    working_b: (u32, u32),
) -> Result<Vec<KeypointCorrespondence>, GeometryError> {
    pairs
        .iter()
        .map(|&(a, b)| {
            Ok(KeypointCorrespondence::new(
                normalize(a, working_a.0, working_a.1)?,
                normalize(b, working_b.0, working_b.1)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermtrack_core::UnitPoint;

    #[test]
    fn working_pixels_are_normalized_per_image() {
        let pairs = [(PixelPoint::new(320.0, 240.0), PixelPoint::new(64.0, 96.0))];
        let out = correspondences_from_working_pixels(&pairs, (640, 480), (128, 128)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].point_a, UnitPoint::new(0.5, 0.5));
        assert_eq!(out[0].point_b, UnitPoint::new(0.5, 0.75));
    }

    #[test]
    fn zero_working_size_is_rejected() {
        let pairs = [(PixelPoint::new(1.0, 1.0), PixelPoint::new(1.0, 1.0))];
        let err = correspondences_from_working_pixels(&pairs, (0, 480), (128, 128)).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDimensions { width: 0, .. }));
    }
}
