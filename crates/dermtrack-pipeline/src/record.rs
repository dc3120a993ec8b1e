use crate::CropHandle;
use dermtrack_core::{PixelRect, UnitBox};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage at which a single lesion failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Persisting the crop through the crop sink.
    Crop,
    /// The per-lesion analyzer returned an error or panicked.
    Analysis,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Crop => f.write_str("crop"),
            FailureStage::Analysis => f.write_str("analysis"),
        }
    }
}

/// Failure captured on a single lesion record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub stage: FailureStage,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Outcome of analyzing one lesion: exactly one of success or failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LesionAnalysis<T> {
    Ok(T),
    Failed(ErrorInfo),
}

impl<T> LesionAnalysis<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, LesionAnalysis::Ok(_))
    }

    pub fn is_failed(&self) -> bool {
        !self.is_ok()
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            LesionAnalysis::Ok(v) => Some(v),
            LesionAnalysis::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            LesionAnalysis::Ok(_) => None,
            LesionAnalysis::Failed(e) => Some(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LesionAnalysis<U> {
        match self {
            LesionAnalysis::Ok(v) => LesionAnalysis::Ok(f(v)),
            LesionAnalysis::Failed(e) => LesionAnalysis::Failed(e),
        }
    }
}

/// One detected lesion and its analysis outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LesionRecord<T> {
    /// `mole_<n>`, 1-based position among the valid detections.
    pub mole_id: String,
    /// Detector bounding box, unit-square coordinates of the full image.
    pub bbox: UnitBox,
    pub confidence: f32,
    /// Inclusive crop rectangle in full-image pixels.
    pub pixel_rect: PixelRect,
    /// Where the crop was stored; `None` if storing it failed.
    pub crop: Option<CropHandle>,
    pub analysis: LesionAnalysis<T>,
}

impl<T> LesionRecord<T> {
    pub fn is_ok(&self) -> bool {
        self.analysis.is_ok()
    }
}

/// Identifier for the lesion at 0-based position `index`.
pub fn mole_id(index: usize) -> String {
    format!("mole_{}", index + 1)
}
