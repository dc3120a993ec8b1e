use crate::orchestrator::valid_detections;
use crate::{mole_id, KeypointMatcher, LesionDetector, PipelineError};
use dermtrack_core::{UnitBox, UnitPoint};
use dermtrack_correspondence::{Assignment, CorrespondenceResolver, ResolverParams};
use image::DynamicImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A lesion detected in image A together with its resolved location in B.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedLesion {
    pub mole_id: String,
    pub bbox_a: UnitBox,
    /// Center of `bbox_a`, the point that was resolved.
    pub query: UnitPoint,
    pub assignment: Assignment,
    /// `bbox_a`'s size re-centered on the matched point in B, clipped to the
    /// unit square. `None` when unmatched.
    pub bbox_b: Option<UnitBox>,
}

impl TrackedLesion {
    pub fn is_matched(&self) -> bool {
        self.assignment.is_matched()
    }
}

/// Re-identifies lesions of image A in image B.
///
/// Detects lesions in A, matches keypoints between A and B, and resolves
/// every lesion center against the correspondences.
pub struct LesionTracker<D, M> {
    detector: D,
    matcher: M,
    resolver: CorrespondenceResolver,
}

impl<D: LesionDetector, M: KeypointMatcher> LesionTracker<D, M> {
    pub fn new(detector: D, matcher: M, params: ResolverParams) -> Self {
        Self {
            detector,
            matcher,
            resolver: CorrespondenceResolver::new(params),
        }
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image_a, image_b),
            fields(a_width = image_a.width(), b_width = image_b.width())
        )
    )]
    pub fn track(
        &self,
        image_a: &DynamicImage,
        image_b: &DynamicImage,
    ) -> Result<Vec<TrackedLesion>, PipelineError> {
        let detections = self
            .detector
            .detect(image_a)
            .map_err(PipelineError::Detector)?;

        let boxes: Vec<UnitBox> = valid_detections(detections)
            .into_iter()
            .map(|det| det.bbox)
            .collect();
        if boxes.is_empty() {
            debug!("no lesions detected in image A");
            return Ok(Vec::new());
        }

        let correspondences = self
            .matcher
            .match_pair(image_a, image_b)
            .map_err(PipelineError::Matcher)?;
        debug!("{} keypoint correspondences", correspondences.len());

        let queries: Vec<UnitPoint> = boxes.iter().map(UnitBox::center).collect();
        let assignments = self.resolver.resolve(&queries, &correspondences);

        let tracked: Vec<TrackedLesion> = boxes
            .into_iter()
            .zip(queries)
            .zip(assignments)
            .enumerate()
            .map(|(i, ((bbox_a, query), assignment))| TrackedLesion {
                mole_id: mole_id(i),
                bbox_b: assignment
                    .matched_point()
                    .map(|p| UnitBox::centered_at(p, bbox_a.width(), bbox_a.height())),
                bbox_a,
                query,
                assignment,
            })
            .collect();

        info!(
            "tracked {} of {} lesions",
            tracked.iter().filter(|t| t.is_matched()).count(),
            tracked.len()
        );
        Ok(tracked)
    }
}
