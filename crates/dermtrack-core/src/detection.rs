use crate::{UnitBox, UnitPoint};
use serde::{Deserialize, Serialize};

/// One lesion candidate reported by an external detector.
///
/// `bbox` is in unit-square coordinates of the image the detector ran on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: UnitBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: UnitBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// A pair of points believed to show the same physical location in images A and B.
///
/// Both points are in unit-square coordinates relative to the *native*
/// resolution of their own image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeypointCorrespondence {
    pub point_a: UnitPoint,
    pub point_b: UnitPoint,
}

impl KeypointCorrespondence {
    pub fn new(point_a: UnitPoint, point_b: UnitPoint) -> Self {
        Self { point_a, point_b }
    }
}
