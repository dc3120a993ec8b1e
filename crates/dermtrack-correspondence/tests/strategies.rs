use dermtrack_core::{KeypointCorrespondence, UnitPoint};
use dermtrack_correspondence::{
    Assignment, CorrespondenceResolver, ResolverParams, SearchStrategy,
};

/// Small deterministic generator so the cloud is reproducible without extra deps.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn cloud(n: usize, seed: u64) -> Vec<KeypointCorrespondence> {
    let mut rng = Lcg(seed);
    (0..n)
        .map(|_| {
            let a = UnitPoint::new(rng.next_unit(), rng.next_unit());
            // B is A shifted and slightly scaled, as between two scans.
            let b = UnitPoint::new(0.9 * a.u + 0.05, 0.95 * a.v + 0.02);
            KeypointCorrespondence::new(a, b)
        })
        .collect()
}

fn resolver(strategy: SearchStrategy) -> CorrespondenceResolver {
    CorrespondenceResolver::new(ResolverParams {
        strategy,
        ..ResolverParams::default()
    })
}

#[test]
fn kdtree_and_brute_force_agree() {
    let correspondences = cloud(2000, 7);
    let mut rng = Lcg(99);
    let queries: Vec<UnitPoint> = (0..64)
        .map(|_| UnitPoint::new(rng.next_unit(), rng.next_unit()))
        .collect();

    let brute = resolver(SearchStrategy::BruteForce).resolve(&queries, &correspondences);
    let kd = resolver(SearchStrategy::KdTree).resolve(&queries, &correspondences);
    let auto = resolver(SearchStrategy::Auto).resolve(&queries, &correspondences);
    assert_eq!(brute, kd);
    assert_eq!(brute, auto);
}

#[test]
fn repeated_keypoints_resolve_to_lowest_index() {
    // Dense matchers can emit many pairs on the same A-side pixel.
    let mut correspondences = cloud(600, 21);
    for (i, c) in correspondences.iter_mut().take(100).enumerate() {
        c.point_a = UnitPoint::new(0.3, 0.3);
        c.point_b = UnitPoint::new(0.4, i as f64 / 100.0);
    }
    let queries = [UnitPoint::new(0.3, 0.31), UnitPoint::new(0.3, 0.3)];

    let brute = resolver(SearchStrategy::BruteForce).resolve(&queries, &correspondences);
    for strategy in [SearchStrategy::Auto, SearchStrategy::KdTree] {
        let out = resolver(strategy).resolve(&queries, &correspondences);
        assert_eq!(out, brute, "{strategy:?}");
    }
    let exact = brute[1].as_matched().expect("matched");
    assert_eq!(exact.correspondence_index, 0);
    assert_eq!(exact.matched_point, UnitPoint::new(0.4, 0.0));
}

#[test]
fn signed_zero_keypoints_share_a_slot() {
    let correspondences = [
        KeypointCorrespondence::new(UnitPoint::new(-0.0, 0.2), UnitPoint::new(0.1, 0.1)),
        KeypointCorrespondence::new(UnitPoint::new(0.0, 0.2), UnitPoint::new(0.9, 0.9)),
    ];
    let q = [UnitPoint::new(0.0, 0.25)];
    let out = resolver(SearchStrategy::KdTree).resolve(&q, &correspondences);
    assert_eq!(out[0].as_matched().expect("matched").correspondence_index, 0);
}

#[test]
fn queries_on_keypoints_resolve_to_their_own_match() {
    let correspondences = cloud(300, 3);
    let queries: Vec<UnitPoint> = correspondences.iter().map(|c| c.point_a).collect();
    for strategy in [SearchStrategy::BruteForce, SearchStrategy::KdTree] {
        let out = resolver(strategy).resolve(&queries, &correspondences);
        assert_eq!(out.len(), queries.len());
        for (i, a) in out.iter().enumerate() {
            let m = a.as_matched().expect("matched");
            assert_eq!(m.correspondence_index, i);
            assert_eq!(m.source_keypoint_distance, 0.0);
            assert_eq!(m.matched_point, correspondences[i].point_b);
        }
    }
}

#[test]
fn output_preserves_query_order_and_count() {
    let correspondences = cloud(50, 11);
    let queries = [
        UnitPoint::new(0.9, 0.1),
        UnitPoint::new(0.1, 0.9),
        UnitPoint::new(0.5, 0.5),
        UnitPoint::new(0.9, 0.1),
    ];
    let out = resolver(SearchStrategy::Auto).resolve(&queries, &correspondences);
    assert_eq!(out.len(), 4);
    for (a, q) in out.iter().zip(&queries) {
        assert_eq!(a.query(), *q);
    }
    assert_eq!(out[0], out[3]);
}

#[test]
fn non_finite_query_is_unmatched() {
    let correspondences = cloud(10, 5);
    let q = UnitPoint::new(f64::NAN, 0.5);
    for strategy in [SearchStrategy::BruteForce, SearchStrategy::KdTree] {
        let out = resolver(strategy).resolve(&[q], &correspondences);
        assert!(matches!(out[0], Assignment::Unmatched { .. }));
    }
}
