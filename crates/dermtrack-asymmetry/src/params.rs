use serde::{Deserialize, Serialize};

/// Where the mirror axis of the aligned mask is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorAxis {
    /// Vertical line through the centroid of the rotated mask.
    #[default]
    Centroid,
    /// Vertical center line of the image frame.
    ///
    /// Only matches the lesion's own axis when the lesion is centered in the
    /// frame. Kept for parity with scores produced by frame-flip tooling.
    FrameCenter,
}

/// Parameters for [`crate::AsymmetryScorer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AsymmetryParams {
    /// Rotated samples at or above this intensity (0..=255 scale) are foreground.
    pub foreground_threshold: u8,
    pub mirror_axis: MirrorAxis,
    /// Keep the aligned/mirrored/difference images in the result.
    pub keep_images: bool,
}

impl Default for AsymmetryParams {
    fn default() -> Self {
        Self {
            foreground_threshold: 128,
            mirror_axis: MirrorAxis::Centroid,
            keep_images: true,
        }
    }
}
