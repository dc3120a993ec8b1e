//! Correspondence resolution between two photographs of the same skin area.
//!
//! Given lesion query points in image A and an unordered cloud of keypoint
//! correspondences `A -> B` produced by an external matcher, every query is
//! assigned the correspondence whose A-side point is nearest (Euclidean
//! distance in unit-square space), together with that correspondence's B-side
//! point. Ties resolve to the lowest correspondence index.
//!
//! ## Quickstart
//!
//! ```
//! use dermtrack_core::{KeypointCorrespondence, UnitPoint};
//! use dermtrack_correspondence::CorrespondenceResolver;
//!
//! let correspondences = [KeypointCorrespondence::new(
//!     UnitPoint::new(0.5, 0.5),
//!     UnitPoint::new(0.6, 0.4),
//! )];
//! let resolver = CorrespondenceResolver::default();
//! let out = resolver.resolve(&[UnitPoint::new(0.51, 0.49)], &correspondences);
//! assert_eq!(out[0].matched_point(), Some(UnitPoint::new(0.6, 0.4)));
//! ```

mod params;
mod resolver;
mod types;

pub use params::{ResolverParams, SearchStrategy};
pub use resolver::{resolve_nearest, CorrespondenceResolver};
pub use types::{Assignment, CorrespondenceAssignment};
