//! Failure-tolerant lesion pipelines built on the `dermtrack-*` algorithm crates.
//!
//! - [`LesionBatchOrchestrator`]: detection -> crop -> per-lesion analysis
//!   over a full image. Each lesion yields one [`LesionRecord`] whose
//!   [`LesionAnalysis`] is either a result or an [`ErrorInfo`]; one lesion's
//!   failure never affects the others.
//! - [`LesionTracker`]: re-identifies the lesions of image A in image B from
//!   keypoint correspondences.
//!
//! Detection, segmentation and keypoint matching are external models and
//! enter through the traits in [`collaborators`].
//!
//! ## Example
//!
//! ```
//! use dermtrack_core::{Detection, UnitBox};
//! use dermtrack_pipeline::{
//!     AsymmetryAnalyzer, LesionBatchOrchestrator, MemoryCropSink, OrchestratorParams,
//!     PrecomputedDetections, ThresholdSegmenter,
//! };
//! use image::{DynamicImage, Rgb, RgbImage};
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::from_fn(80, 80, |x, y| {
//!     let d2 = (x as i32 - 40).pow(2) + (y as i32 - 40).pow(2);
//!     if d2 <= 100 { Rgb([40, 20, 10]) } else { Rgb([230, 190, 170]) }
//! }));
//! let detections = vec![Detection::new(UnitBox::new(0.25, 0.25, 0.75, 0.75), 0.9)];
//!
//! let orchestrator = LesionBatchOrchestrator::new(
//!     PrecomputedDetections(detections),
//!     AsymmetryAnalyzer::new(ThresholdSegmenter::new(100), Default::default()),
//!     MemoryCropSink::new(),
//!     OrchestratorParams::default(),
//! );
//! let records = orchestrator.process(&image).unwrap();
//! assert_eq!(records[0].mole_id, "mole_1");
//! assert!(records[0].analysis.ok().unwrap().asymmetry < 0.05);
//! ```

pub mod collaborators;

mod analyzer;
mod convert;
mod crop;
mod error;
mod io;
mod orchestrator;
mod record;
mod track;

pub use analyzer::{AsymmetryAnalyzer, LesionMetrics, ThresholdSegmenter};
pub use collaborators::{
    correspondences_from_working_pixels, BoxError, KeypointMatcher, LesionAnalyzer,
    LesionDetector, MaskSegmenter, PrecomputedCorrespondences, PrecomputedDetections,
};
pub use convert::{gray_view, save_asymmetry_images, to_image_gray, DiagnosticPaths};
pub use crop::{crop_lesion, CropHandle, CropSink, CropSinkError, DirectoryCropSink, MemoryCropSink};
pub use error::PipelineError;
pub use io::{
    load_correspondences_json, load_detections_json, BatchConfig, BatchReport, PipelineIoError,
    TrackConfig, TrackReport,
};
pub use orchestrator::{LesionBatchOrchestrator, OrchestratorParams};
pub use record::{mole_id, ErrorInfo, FailureStage, LesionAnalysis, LesionRecord};
pub use track::{LesionTracker, TrackedLesion};
