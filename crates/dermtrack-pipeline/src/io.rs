//! JSON configuration and report helpers for batch analysis and tracking.

use crate::{LesionMetrics, LesionRecord, OrchestratorParams, TrackedLesion};
use dermtrack_asymmetry::AsymmetryParams;
use dermtrack_core::{Detection, KeypointCorrespondence};
use dermtrack_correspondence::ResolverParams;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum PipelineIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, PipelineIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_pretty<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), PipelineIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a JSON array of detections, e.g. exported from a detector run.
pub fn load_detections_json(path: impl AsRef<Path>) -> Result<Vec<Detection>, PipelineIoError> {
    read_json(path)
}

/// Load a JSON array of keypoint correspondences.
pub fn load_correspondences_json(
    path: impl AsRef<Path>,
) -> Result<Vec<KeypointCorrespondence>, PipelineIoError> {
    read_json(path)
}

fn default_mask_threshold() -> u8 {
    100
}

/// Configuration for a batch analysis run over one full image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub image_path: String,
    /// Precomputed detections (JSON array of [`Detection`]).
    pub detections_path: String,
    /// Directory for lesion crops. Crops are kept in memory when unset.
    #[serde(default)]
    pub crops_dir: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Grayscale level below which a crop pixel counts as lesion.
    #[serde(default = "default_mask_threshold")]
    pub mask_threshold: u8,
    #[serde(default)]
    pub asymmetry: AsymmetryParams,
    #[serde(default)]
    pub orchestrator: OrchestratorParams,
}

impl BatchConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineIoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineIoError> {
        write_pretty(self, path)
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("dermtrack_batch_report.json"))
    }
}

/// Configuration for tracking lesions from image A into image B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub image_a_path: String,
    pub image_b_path: String,
    /// Detections in image A (JSON array of [`Detection`]).
    pub detections_path: String,
    /// Correspondences A -> B (JSON array of [`KeypointCorrespondence`]).
    pub correspondences_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub resolver: ResolverParams,
}

impl TrackConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineIoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineIoError> {
        write_pretty(self, path)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("dermtrack_track_report.json"))
    }
}

/// Per-image batch analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport<T = LesionMetrics> {
    pub image_path: String,
    pub num_lesions: usize,
    pub num_failed: usize,
    pub records: Vec<LesionRecord<T>>,
}

impl<T> BatchReport<T> {
    pub fn new(image_path: impl Into<String>, records: Vec<LesionRecord<T>>) -> Self {
        Self {
            image_path: image_path.into(),
            num_lesions: records.len(),
            num_failed: records.iter().filter(|r| !r.is_ok()).count(),
            records,
        }
    }
}

impl<T: Serialize> BatchReport<T> {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineIoError> {
        write_pretty(self, path)
    }
}

impl<T: DeserializeOwned> BatchReport<T> {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineIoError> {
        read_json(path)
    }
}

/// Cross-scan tracking report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackReport {
    pub image_a_path: String,
    pub image_b_path: String,
    pub num_lesions: usize,
    pub matches_count: usize,
    pub lesions: Vec<TrackedLesion>,
}

impl TrackReport {
    pub fn new(
        image_a_path: impl Into<String>,
        image_b_path: impl Into<String>,
        lesions: Vec<TrackedLesion>,
    ) -> Self {
        Self {
            image_a_path: image_a_path.into(),
            image_b_path: image_b_path.into(),
            num_lesions: lesions.len(),
            matches_count: lesions.iter().filter(|l| l.is_matched()).count(),
            lesions,
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PipelineIoError> {
        read_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PipelineIoError> {
        write_pretty(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorInfo, FailureStage, LesionAnalysis};
    use dermtrack_core::{PixelRect, UnitBox};

    #[test]
    fn batch_config_defaults_fill_missing_fields() {
        let cfg: BatchConfig = serde_json::from_str(
            r#"{"image_path": "body.jpg", "detections_path": "dets.json"}"#,
        )
        .unwrap();
        assert_eq!(cfg.mask_threshold, 100);
        assert!(!cfg.orchestrator.parallel);
        assert!(cfg.crops_dir.is_none());
        assert_eq!(cfg.output_path(), PathBuf::from("dermtrack_batch_report.json"));
    }

    #[test]
    fn batch_report_counts_failures_and_round_trips() {
        let rect = PixelRect {
            x1: 0,
            y1: 0,
            x2: 9,
            y2: 9,
        };
        let record = |id: &str, analysis| LesionRecord {
            mole_id: id.to_string(),
            bbox: UnitBox::new(0.0, 0.0, 0.1, 0.1),
            confidence: 0.5,
            pixel_rect: rect,
            crop: None,
            analysis,
        };
        let report = BatchReport::new(
            "body.jpg",
            vec![
                record(
                    "mole_1",
                    LesionAnalysis::Ok(LesionMetrics {
                        asymmetry: 0.25,
                        orientation: 0.0,
                        mask_area: 40.0,
                    }),
                ),
                record(
                    "mole_2",
                    LesionAnalysis::Failed(ErrorInfo::new(FailureStage::Analysis, "no mask")),
                ),
            ],
        );
        assert_eq!(report.num_lesions, 2);
        assert_eq!(report.num_failed, 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();
        let back: BatchReport = BatchReport::load_json(&path).unwrap();
        assert_eq!(back.records, report.records);
    }

    #[test]
    fn track_config_resolver_defaults() {
        let cfg: TrackConfig = serde_json::from_str(
            r#"{
                "image_a_path": "a.jpg",
                "image_b_path": "b.jpg",
                "detections_path": "d.json",
                "correspondences_path": "c.json",
                "resolver": {"max_distance": 0.1}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.resolver.max_distance, Some(0.1));
        assert_eq!(cfg.resolver.kdtree_min_correspondences, 512);
    }
}
