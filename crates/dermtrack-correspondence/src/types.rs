use dermtrack_core::UnitPoint;
use serde::{Deserialize, Serialize};

/// A query point resolved to its nearest correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceAssignment {
    /// Query point in A's unit-square coordinates.
    pub query: UnitPoint,
    /// Index of the winning correspondence in the input slice.
    pub correspondence_index: usize,
    /// Nearest A-side keypoint.
    pub source_keypoint: UnitPoint,
    /// Matched location in B's unit-square coordinates.
    pub matched_point: UnitPoint,
    /// Distance from `query` to `source_keypoint` (unit-square units).
    pub source_keypoint_distance: f64,
}

/// Resolution outcome for a single query. One per query, in query order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assignment {
    Matched(CorrespondenceAssignment),
    /// No correspondence was available (or none passed the distance gate).
    Unmatched { query: UnitPoint },
}

impl Assignment {
    pub fn query(&self) -> UnitPoint {
        match self {
            Assignment::Matched(m) => m.query,
            Assignment::Unmatched { query } => *query,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Assignment::Matched(_))
    }

    pub fn as_matched(&self) -> Option<&CorrespondenceAssignment> {
        match self {
            Assignment::Matched(m) => Some(m),
            Assignment::Unmatched { .. } => None,
        }
    }

    pub fn matched_point(&self) -> Option<UnitPoint> {
        self.as_matched().map(|m| m.matched_point)
    }
}
