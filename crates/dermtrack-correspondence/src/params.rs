use serde::{Deserialize, Serialize};

/// How nearest neighbours are searched.
///
/// Every strategy yields the same assignments, including tie-breaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Brute force for small correspondence sets, KD-tree above
    /// [`ResolverParams::kdtree_min_correspondences`].
    #[default]
    Auto,
    BruteForce,
    KdTree,
}

/// Parameters for [`crate::CorrespondenceResolver`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverParams {
    pub strategy: SearchStrategy,
    /// Correspondence count from which `Auto` switches to the KD-tree.
    pub kdtree_min_correspondences: usize,
    /// Optional gate: matches whose A-side keypoint is farther than this from
    /// the query (unit-square units) are reported as unmatched.
    pub max_distance: Option<f64>,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Auto,
            kdtree_min_correspondences: 512,
            max_distance: None,
        }
    }
}
