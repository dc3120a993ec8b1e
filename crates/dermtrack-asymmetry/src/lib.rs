//! Bilateral asymmetry scoring for binary lesion masks.
//!
//! Algorithm:
//! 1. Compute raw and central image moments of the mask. An empty mask is a
//!    defined degenerate case with score 0.
//! 2. Centroid from first-order moments, orientation of the principal axis from
//!    the area-normalized second-order central moments:
//!    `θ = 0.5 · atan2(2·μ11, μ20 − μ02)`.
//! 3. Rotate the mask about its centroid by `−θ` so the principal axis is
//!    horizontal (same image size, background outside the source).
//! 4. Re-derive the centroid of the rotated mask and mirror it across the
//!    vertical line through that centroid.
//! 5. `score = Σ|rotated − mirrored| / Σ rotated`.
//!
//! ```
//! use dermtrack_asymmetry::AsymmetryScorer;
//! use dermtrack_core::GrayImage;
//!
//! let mask = GrayImage::from_fn(64, 64, |x, y| {
//!     let dx = x as f64 - 32.0;
//!     let dy = y as f64 - 32.0;
//!     if dx * dx + dy * dy <= 100.0 { 255 } else { 0 }
//! });
//! let result = AsymmetryScorer::default().score(&mask.view()).unwrap();
//! assert!(result.score < 0.02);
//! ```

mod error;
mod moments;
mod params;
mod result;
mod scorer;

pub use error::AsymmetryError;
pub use moments::Moments;
pub use params::{AsymmetryParams, MirrorAxis};
pub use result::{AsymmetryImages, AsymmetryResult};
pub use scorer::{compute_asymmetry, AsymmetryScorer};
