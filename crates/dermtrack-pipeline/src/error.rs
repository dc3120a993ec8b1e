use crate::BoxError;
use dermtrack_core::GeometryError;

/// Errors that abort a whole pipeline run.
///
/// Per-lesion failures never end up here; they are recorded on the lesion's
/// [`crate::LesionRecord`] instead.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("lesion detector failed: {0}")]
    Detector(#[source] BoxError),

    #[error("keypoint matcher failed: {0}")]
    Matcher(#[source] BoxError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
