use crate::{
    crop_lesion, mole_id, CropHandle, CropSink, ErrorInfo, FailureStage, LesionAnalysis, LesionAnalyzer,
    LesionDetector, LesionRecord, PipelineError,
};
use dermtrack_core::{bbox_to_pixels, Detection, PixelRect};
use image::DynamicImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters for [`LesionBatchOrchestrator`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorParams {
    /// Analyze crops on the rayon pool. Ignored without the `rayon` feature.
    pub parallel: bool,
}

/// Runs detection -> crop -> per-lesion analysis over a full image.
///
/// A failing lesion is recorded as [`LesionAnalysis::Failed`] and never
/// affects the other lesions. Only a detector failure aborts the run.
pub struct LesionBatchOrchestrator<D, A, S> {
    detector: D,
    analyzer: A,
    sink: S,
    params: OrchestratorParams,
}

struct PreparedLesion {
    mole_id: String,
    detection: Detection,
    rect: PixelRect,
    crop: DynamicImage,
    stored: Result<CropHandle, ErrorInfo>,
}

impl<D, A, S> LesionBatchOrchestrator<D, A, S>
where
    D: LesionDetector,
    A: LesionAnalyzer,
    S: CropSink,
{
    pub fn new(detector: D, analyzer: A, sink: S, params: OrchestratorParams) -> Self {
        Self {
            detector,
            analyzer,
            sink,
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    #[inline]
    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one full image. Records come back in detection order.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image),
            fields(width = image.width(), height = image.height())
        )
    )]
    pub fn process(
        &self,
        image: &DynamicImage,
    ) -> Result<Vec<LesionRecord<A::Output>>, PipelineError> {
        let detections = self
            .detector
            .detect(image)
            .map_err(PipelineError::Detector)?;
        if detections.is_empty() {
            debug!("no lesions detected");
            return Ok(Vec::new());
        }

        let valid = valid_detections(detections);
        let prepared = valid
            .into_iter()
            .enumerate()
            .map(|(i, det)| self.prepare(image, i, det))
            .collect::<Result<Vec<_>, _>>()?;

        let analyses = self.analyze_all(&prepared);

        let records = prepared
            .into_iter()
            .zip(analyses)
            .map(|(p, analysis)| {
                if let LesionAnalysis::Failed(info) = &analysis {
                    warn!("could not analyze {}: {}", p.mole_id, info);
                }
                LesionRecord {
                    mole_id: p.mole_id,
                    bbox: p.detection.bbox,
                    confidence: p.detection.confidence,
                    pixel_rect: p.rect,
                    crop: p.stored.ok(),
                    analysis,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "processed {} lesions ({} failed)",
            records.len(),
            records.iter().filter(|r| !r.is_ok()).count()
        );
        Ok(records)
    }

    fn prepare(
        &self,
        image: &DynamicImage,
        index: usize,
        detection: Detection,
    ) -> Result<PreparedLesion, PipelineError> {
        let rect = bbox_to_pixels(&detection.bbox, image.width(), image.height())?;
        let crop = crop_lesion(image, &rect);
        let mole_id = mole_id(index);
        let stored = self
            .sink
            .store(&mole_id, &crop)
            .map_err(|e| ErrorInfo::new(FailureStage::Crop, e.to_string()));
        Ok(PreparedLesion {
            mole_id,
            detection,
            rect,
            crop,
            stored,
        })
    }

    fn analyze_all(&self, prepared: &[PreparedLesion]) -> Vec<LesionAnalysis<A::Output>> {
        let analyzer = &self.analyzer;

        #[cfg(feature = "rayon")]
        {
            if self.params.parallel {
                return prepared
                    .par_iter()
                    .map(|p| analyze_one(analyzer, p))
                    .collect();
            }
        }
        #[cfg(not(feature = "rayon"))]
        {
            if self.params.parallel {
                debug!("rayon feature disabled, analyzing sequentially");
            }
        }

        prepared.iter().map(|p| analyze_one(analyzer, p)).collect()
    }
}

/// Run the analyzer on one crop, turning errors and panics into [`ErrorInfo`].
/// A lesion whose crop could not be stored is not analyzed.
fn analyze_one<A: LesionAnalyzer>(
    analyzer: &A,
    lesion: &PreparedLesion,
) -> LesionAnalysis<A::Output> {
    if let Err(info) = &lesion.stored {
        return LesionAnalysis::Failed(info.clone());
    }
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(&lesion.crop))) {
        Ok(Ok(value)) => LesionAnalysis::Ok(value),
        Ok(Err(e)) => {
            LesionAnalysis::Failed(ErrorInfo::new(FailureStage::Analysis, e.to_string()))
        }
        Err(payload) => LesionAnalysis::Failed(ErrorInfo::new(
            FailureStage::Analysis,
            panic_message(payload.as_ref()),
        )),
    }
}

/// Drop detections whose box is malformed, keeping order.
pub(crate) fn valid_detections(detections: Vec<Detection>) -> Vec<Detection> {
    let total = detections.len();
    let valid: Vec<Detection> = detections
        .into_iter()
        .enumerate()
        .filter_map(|(i, det)| {
            if det.bbox.is_valid() {
                Some(det)
            } else {
                warn!(
                    "discarding detection {} with invalid bbox {:?}",
                    i,
                    det.bbox.to_array()
                );
                None
            }
        })
        .collect();
    if valid.len() != total {
        debug!("{} of {} detections kept", valid.len(), total);
    }
    valid
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("analyzer panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("analyzer panicked: {s}")
    } else {
        "analyzer panicked".to_string()
    }
}
