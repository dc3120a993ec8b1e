//! Adapters between the `image` crate and the lightweight core image types.

use dermtrack_asymmetry::AsymmetryImages;
use dermtrack_core::{GrayImage as CoreGrayImage, GrayImageView};
use image::GrayImage;
use std::path::{Path, PathBuf};

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a core image into an `image::GrayImage`.
pub fn to_image_gray(img: &CoreGrayImage) -> Option<GrayImage> {
    let w = u32::try_from(img.width).ok()?;
    let h = u32::try_from(img.height).ok()?;
    GrayImage::from_raw(w, h, img.data.clone())
}

/// Paths written by [`save_asymmetry_images`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticPaths {
    pub aligned: PathBuf,
    pub mirrored: PathBuf,
    pub difference: PathBuf,
}

/// Write the aligned, mirrored and difference masks as
/// `{stem}_aligned.png`, `{stem}_mirrored.png`, `{stem}_difference.png`.
pub fn save_asymmetry_images(
    images: &AsymmetryImages,
    dir: impl AsRef<Path>,
    stem: &str,
) -> Result<DiagnosticPaths, image::ImageError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(image::ImageError::IoError)?;
    let paths = DiagnosticPaths {
        aligned: dir.join(format!("{stem}_aligned.png")),
        mirrored: dir.join(format!("{stem}_mirrored.png")),
        difference: dir.join(format!("{stem}_difference.png")),
    };
    for (img, path) in [
        (&images.aligned_mask, &paths.aligned),
        (&images.mirrored_mask, &paths.mirrored),
        (&images.difference_map, &paths.difference),
    ] {
        let out = to_image_gray(img).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        out.save(path)?;
    }
    Ok(paths)
}
