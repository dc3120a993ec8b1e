use crate::{Assignment, CorrespondenceAssignment, ResolverParams, SearchStrategy};
use dermtrack_core::{KeypointCorrespondence, UnitPoint};
use kiddo::{KdTree, SquaredEuclidean};
use log::debug;
use std::collections::HashSet;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Nearest-keypoint resolver.
#[derive(Clone, Debug, Default)]
pub struct CorrespondenceResolver {
    params: ResolverParams,
}

impl CorrespondenceResolver {
    pub fn new(params: ResolverParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    /// Resolve every query against `correspondences`.
    ///
    /// Returns exactly one [`Assignment`] per query, in query order. With no
    /// correspondences every query is [`Assignment::Unmatched`].
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, queries, correspondences),
            fields(queries = queries.len(), correspondences = correspondences.len())
        )
    )]
    pub fn resolve(
        &self,
        queries: &[UnitPoint],
        correspondences: &[KeypointCorrespondence],
    ) -> Vec<Assignment> {
        if correspondences.is_empty() {
            debug!(
                "no correspondences, {} queries left unmatched",
                queries.len()
            );
            return queries
                .iter()
                .map(|&query| Assignment::Unmatched { query })
                .collect();
        }

        let nearest: Vec<Option<usize>> = if self.use_kdtree(correspondences.len()) {
            debug!(
                "kd-tree search over {} correspondences",
                correspondences.len()
            );
            let index = KeypointIndex::new(correspondences);
            queries
                .iter()
                .map(|q| is_finite(q).then(|| index.nearest(q)).flatten())
                .collect()
        } else {
            queries
                .iter()
                .map(|q| {
                    is_finite(q)
                        .then(|| nearest_brute_force(q, correspondences))
                        .flatten()
                })
                .collect()
        };

        queries
            .iter()
            .zip(nearest)
            .map(|(&query, idx)| self.assignment(query, idx, correspondences))
            .collect()
    }

    fn use_kdtree(&self, n: usize) -> bool {
        match self.params.strategy {
            SearchStrategy::BruteForce => false,
            SearchStrategy::KdTree => true,
            SearchStrategy::Auto => n >= self.params.kdtree_min_correspondences,
        }
    }

    fn assignment(
        &self,
        query: UnitPoint,
        idx: Option<usize>,
        correspondences: &[KeypointCorrespondence],
    ) -> Assignment {
        let Some(idx) = idx else {
            return Assignment::Unmatched { query };
        };
        let corr = correspondences[idx];
        let distance = query.distance(&corr.point_a);
        if let Some(max) = self.params.max_distance {
            if distance > max {
                debug!(
                    "query ({:.4}, {:.4}) nearest keypoint {} at {:.4} exceeds gate {:.4}",
                    query.u, query.v, idx, distance, max
                );
                return Assignment::Unmatched { query };
            }
        }
        Assignment::Matched(CorrespondenceAssignment {
            query,
            correspondence_index: idx,
            source_keypoint: corr.point_a,
            matched_point: corr.point_b,
            source_keypoint_distance: distance,
        })
    }
}

/// Resolve with default parameters.
pub fn resolve_nearest(
    queries: &[UnitPoint],
    correspondences: &[KeypointCorrespondence],
) -> Vec<Assignment> {
    CorrespondenceResolver::default().resolve(queries, correspondences)
}

#[inline]
fn is_finite(p: &UnitPoint) -> bool {
    p.u.is_finite() && p.v.is_finite()
}

/// Index of the correspondence whose A-side point is nearest to `query`.
/// Strict `<` keeps the first index among equal distances. Correspondences
/// with a non-finite A-side point never match.
fn nearest_brute_force(
    query: &UnitPoint,
    correspondences: &[KeypointCorrespondence],
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in correspondences.iter().enumerate() {
        if !is_finite(&c.point_a) {
            continue;
        }
        let d = query.distance_squared(&c.point_a);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Bit pattern of a point, with `-0.0` folded into `0.0`.
#[inline]
fn point_key(p: &UnitPoint) -> (u64, u64) {
    ((p.u + 0.0).to_bits(), (p.v + 0.0).to_bits())
}

/// KD-tree over the distinct, finite A-side keypoints.
///
/// A point repeated across several correspondences is inserted once, under
/// its lowest index. The tree holds a bounded number of items per exact
/// coordinate, and the lowest index is the only one a query can win anyway.
struct KeypointIndex<'a> {
    tree: KdTree<f64, 2>,
    len: usize,
    correspondences: &'a [KeypointCorrespondence],
}

impl<'a> KeypointIndex<'a> {
    fn new(correspondences: &'a [KeypointCorrespondence]) -> Self {
        let mut seen = HashSet::with_capacity(correspondences.len());
        let mut tree: KdTree<f64, 2> = KdTree::with_capacity(correspondences.len().max(1));
        let mut len = 0;
        for (i, c) in correspondences.iter().enumerate() {
            if !is_finite(&c.point_a) || !seen.insert(point_key(&c.point_a)) {
                continue;
            }
            tree.add(&c.point_a.to_array(), i as u64);
            len += 1;
        }
        if len < correspondences.len() {
            debug!(
                "kd-tree holds {} of {} keypoints (duplicates or non-finite skipped)",
                len,
                correspondences.len()
            );
        }
        Self {
            tree,
            len,
            correspondences,
        }
    }

    fn nearest(&self, query: &UnitPoint) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let q = query.to_array();
        let best = self.tree.nearest_one::<SquaredEuclidean>(&q);

        // The tree does not order equidistant items by insertion index; collect
        // everything at the best distance and re-rank exactly.
        let radius = best.distance + best.distance.abs() * 1e-9 + f64::EPSILON;
        let mut candidates: Vec<usize> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&q, radius)
            .into_iter()
            .map(|nn| nn.item as usize)
            .collect();
        candidates.push(best.item as usize);

        candidates
            .into_iter()
            .filter(|&i| i < self.correspondences.len())
            .map(|i| (i, query.distance_squared(&self.correspondences[i].point_a)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(i, _)| i)
    }
}
