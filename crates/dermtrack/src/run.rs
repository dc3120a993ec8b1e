use crate::asymmetry::{AsymmetryError, AsymmetryParams, AsymmetryResult, AsymmetryScorer};
use crate::correspondence::{Assignment, CorrespondenceResolver, ResolverParams};
use crate::core::{Detection, UnitPoint};
use crate::pipeline::{
    gray_view, load_correspondences_json, load_detections_json, AsymmetryAnalyzer, BatchConfig,
    BatchReport, CropSink, DirectoryCropSink, LesionBatchOrchestrator, LesionMetrics,
    LesionRecord, LesionTracker, MemoryCropSink, PipelineError, PipelineIoError,
    PrecomputedCorrespondences, PrecomputedDetections, ThresholdSegmenter, TrackConfig,
    TrackReport,
};
use image::{DynamicImage, GrayImage};
use log::info;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the file-based entry points.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Asymmetry(#[from] AsymmetryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Io(#[from] PipelineIoError),
}

/// Open any image and convert it to 8-bit grayscale.
pub fn open_mask(path: impl AsRef<Path>) -> Result<GrayImage, RunError> {
    Ok(open_image(path)?.to_luma8())
}

fn open_image(path: impl AsRef<Path>) -> Result<DynamicImage, RunError> {
    let path = path.as_ref();
    image::open(path).map_err(|source| RunError::Image {
        path: path.display().to_string(),
        source,
    })
}

/// Score a grayscale mask. Every non-zero pixel counts as foreground.
pub fn score_mask(mask: &GrayImage, params: AsymmetryParams) -> Result<AsymmetryResult, RunError> {
    let binary = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        image::Luma([if mask.get_pixel(x, y).0[0] != 0 { 255 } else { 0 }])
    });
    Ok(AsymmetryScorer::new(params).score(&gray_view(&binary))?)
}

/// Resolve query points against a correspondence file.
pub fn resolve_file(
    queries: &[UnitPoint],
    correspondences_path: impl AsRef<Path>,
    params: ResolverParams,
) -> Result<Vec<Assignment>, RunError> {
    let correspondences = load_correspondences_json(correspondences_path)?;
    Ok(CorrespondenceResolver::new(params).resolve(queries, &correspondences))
}

/// Run a batch analysis described by `cfg`.
///
/// Detections are replayed from `cfg.detections_path` and lesions are
/// segmented by intensity threshold.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(image = %cfg.image_path))
)]
pub fn run_batch(cfg: &BatchConfig) -> Result<BatchReport, RunError> {
    let image = open_image(&cfg.image_path)?;
    let detections = load_detections_json(&cfg.detections_path)?;
    info!(
        "{}: {}x{}, {} detections",
        cfg.image_path,
        image.width(),
        image.height(),
        detections.len()
    );

    let records = match cfg.crops_dir.as_ref() {
        Some(dir) => {
            let sink = DirectoryCropSink::for_image(dir, &cfg.image_path);
            batch_with_sink(cfg, &image, detections, sink)?
        }
        None => batch_with_sink(cfg, &image, detections, MemoryCropSink::new())?,
    };
    Ok(BatchReport::new(cfg.image_path.clone(), records))
}

fn batch_with_sink<S: CropSink>(
    cfg: &BatchConfig,
    image: &DynamicImage,
    detections: Vec<Detection>,
    sink: S,
) -> Result<Vec<LesionRecord<LesionMetrics>>, PipelineError> {
    let analyzer = AsymmetryAnalyzer::new(
        ThresholdSegmenter::new(cfg.mask_threshold),
        cfg.asymmetry.clone(),
    );
    LesionBatchOrchestrator::new(
        PrecomputedDetections(detections),
        analyzer,
        sink,
        cfg.orchestrator.clone(),
    )
    .process(image)
}

/// Track lesions from image A into image B as described by `cfg`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(cfg), fields(a = %cfg.image_a_path, b = %cfg.image_b_path))
)]
pub fn run_track(cfg: &TrackConfig) -> Result<TrackReport, RunError> {
    let image_a = open_image(&cfg.image_a_path)?;
    let image_b = open_image(&cfg.image_b_path)?;
    let detections = load_detections_json(&cfg.detections_path)?;
    let correspondences = load_correspondences_json(&cfg.correspondences_path)?;

    let tracker = LesionTracker::new(
        PrecomputedDetections(detections),
        PrecomputedCorrespondences(correspondences),
        cfg.resolver.clone(),
    );
    let lesions = tracker.track(&image_a, &image_b)?;
    Ok(TrackReport::new(
        cfg.image_a_path.clone(),
        cfg.image_b_path.clone(),
        lesions,
    ))
}
