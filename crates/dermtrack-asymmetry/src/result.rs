use dermtrack_core::GrayImage;

/// Diagnostic images produced while scoring. All are 0/255 binary masks of
/// the input size.
#[derive(Clone, Debug)]
pub struct AsymmetryImages {
    /// Mask rotated so that its principal axis is horizontal.
    pub aligned_mask: GrayImage,
    /// `aligned_mask` mirrored across the vertical axis through its centroid.
    pub mirrored_mask: GrayImage,
    /// `|aligned_mask - mirrored_mask|`.
    pub difference_map: GrayImage,
}

/// Output of an asymmetry scoring run.
#[derive(Clone, Debug)]
pub struct AsymmetryResult {
    /// Mirrored-difference area over aligned area. `>= 0`, no hard upper bound.
    pub score: f64,
    /// Principal-axis angle in radians (0 for an empty mask).
    pub orientation: f64,
    /// Foreground area of the input mask in pixels.
    pub area: f64,
    /// `None` for the empty-mask case or when images were not requested.
    pub images: Option<AsymmetryImages>,
}

impl AsymmetryResult {
    pub(crate) fn degenerate() -> Self {
        Self {
            score: 0.0,
            orientation: 0.0,
            area: 0.0,
            images: None,
        }
    }

    /// `true` for the empty-mask result.
    pub fn is_degenerate(&self) -> bool {
        self.area == 0.0
    }
}
