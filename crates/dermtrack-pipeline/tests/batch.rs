use dermtrack_core::{Detection, UnitBox};
use dermtrack_pipeline::{
    AsymmetryAnalyzer, BatchReport, BoxError, CropHandle, DirectoryCropSink, FailureStage,
    LesionAnalysis, LesionAnalyzer, LesionBatchOrchestrator, LesionRecord, MemoryCropSink,
    OrchestratorParams, PrecomputedDetections, ThresholdSegmenter,
};
use image::{DynamicImage, Rgb, RgbImage};

/// Skin-coloured canvas with dark elliptical lesions at the given pixel centers.
fn body_image(lesions: &[(i32, i32, i32, i32)]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(200, 120, |x, y| {
        let (x, y) = (x as i32, y as i32);
        let dark = lesions.iter().any(|&(cx, cy, rx, ry)| {
            let dx = (x - cx) as f64 / rx as f64;
            let dy = (y - cy) as f64 / ry as f64;
            dx * dx + dy * dy <= 1.0
        });
        if dark {
            Rgb([60, 35, 25])
        } else {
            Rgb([225, 185, 160])
        }
    }))
}

fn detections() -> Vec<Detection> {
    vec![
        Detection::new(UnitBox::new(0.05, 0.1, 0.275, 0.5), 0.95),
        Detection::new(UnitBox::new(0.4, 0.4, 0.6, 0.8), 0.8),
        Detection::new(UnitBox::new(0.7, 0.2, 0.95, 0.6), 0.6),
    ]
}

fn lesions() -> Vec<(i32, i32, i32, i32)> {
    vec![(30, 36, 12, 12), (100, 72, 14, 8), (165, 48, 16, 10)]
}

/// Wraps another analyzer and fails for one crop width only.
struct FailOnWidth<A> {
    inner: A,
    width: u32,
}

impl<A: LesionAnalyzer> LesionAnalyzer for FailOnWidth<A> {
    type Output = A::Output;

    fn analyze(&self, crop: &DynamicImage) -> Result<A::Output, BoxError> {
        if crop.width() == self.width {
            return Err("segmentation model returned NaNs".into());
        }
        self.inner.analyze(crop)
    }
}

fn analyzer() -> AsymmetryAnalyzer<ThresholdSegmenter> {
    AsymmetryAnalyzer::new(ThresholdSegmenter::new(120), Default::default())
}

#[test]
fn every_detection_yields_one_record_in_order() {
    let image = body_image(&lesions());
    let orch = LesionBatchOrchestrator::new(
        PrecomputedDetections(detections()),
        analyzer(),
        MemoryCropSink::new(),
        OrchestratorParams::default(),
    );
    let records = orch.process(&image).unwrap();
    assert_eq!(records.len(), 3);
    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.mole_id, format!("mole_{}", i + 1));
        assert_eq!(r.bbox, detections()[i].bbox);
        let m = r.analysis.ok().expect("analysis succeeded");
        assert!(m.mask_area > 0.0);
        assert!(m.asymmetry >= 0.0);
    }
    assert_eq!(orch.sink().len(), 3);
}

#[test]
fn one_failing_lesion_only_affects_its_own_record() {
    let image = body_image(&lesions());
    let baseline = LesionBatchOrchestrator::new(
        PrecomputedDetections(detections()),
        analyzer(),
        MemoryCropSink::new(),
        OrchestratorParams::default(),
    )
    .process(&image)
    .unwrap();

    // The second box spans x 80..=120 in a 200px wide image.
    let failing_width = baseline[1].pixel_rect.width();
    let failing = LesionBatchOrchestrator::new(
        PrecomputedDetections(detections()),
        FailOnWidth {
            inner: analyzer(),
            width: failing_width,
        },
        MemoryCropSink::new(),
        OrchestratorParams::default(),
    )
    .process(&image)
    .unwrap();

    assert_eq!(failing.len(), baseline.len());
    let failed: Vec<&LesionRecord<_>> = failing.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].mole_id, "mole_2");
    let info = failed[0].analysis.error().unwrap();
    assert_eq!(info.stage, FailureStage::Analysis);
    assert!(info.message.contains("NaNs"));

    for (a, b) in baseline.iter().zip(&failing) {
        assert_eq!(a.mole_id, b.mole_id);
        assert_eq!(a.pixel_rect, b.pixel_rect);
        if a.mole_id != "mole_2" {
            assert_eq!(a.analysis, b.analysis);
        }
    }
}

/// Counts the crops analyzed on a rayon worker thread.
#[cfg(feature = "rayon")]
struct CountPoolCalls<A> {
    inner: A,
    on_pool: std::sync::atomic::AtomicUsize,
}

#[cfg(feature = "rayon")]
impl<A: LesionAnalyzer> LesionAnalyzer for CountPoolCalls<A> {
    type Output = A::Output;

    fn analyze(&self, crop: &DynamicImage) -> Result<A::Output, BoxError> {
        if rayon::current_thread_index().is_some() {
            self.on_pool
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        self.inner.analyze(crop)
    }
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_and_sequential_runs_agree() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let image = body_image(&lesions());
    let run = |parallel| {
        let orch = LesionBatchOrchestrator::new(
            PrecomputedDetections(detections()),
            CountPoolCalls {
                inner: analyzer(),
                on_pool: AtomicUsize::new(0),
            },
            MemoryCropSink::new(),
            OrchestratorParams { parallel },
        );
        let records = orch.process(&image).unwrap();
        (records, orch.analyzer().on_pool.load(Ordering::Relaxed))
    };

    let (sequential, sequential_pool_calls) = run(false);
    let (parallel, parallel_pool_calls) = run(true);
    assert_eq!(sequential, parallel);
    assert_eq!(sequential_pool_calls, 0);
    assert_eq!(parallel_pool_calls, 3);
}

#[test]
fn crops_are_written_next_to_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let image = body_image(&lesions());
    let orch = LesionBatchOrchestrator::new(
        PrecomputedDetections(detections()),
        analyzer(),
        DirectoryCropSink::for_image(dir.path(), "scans/patient7_back.jpg"),
        OrchestratorParams::default(),
    );
    let records = orch.process(&image).unwrap();

    for r in &records {
        let Some(CropHandle::File { path }) = &r.crop else {
            panic!("expected a file handle for {}", r.mole_id);
        };
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("patient7_back_{}.png", r.mole_id)
        );
        let crop = image::open(path).unwrap();
        assert_eq!(crop.width(), r.pixel_rect.width());
        assert_eq!(crop.height(), r.pixel_rect.height());
    }

    let report = BatchReport::new("scans/patient7_back.jpg", records);
    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).unwrap();
    let back: BatchReport = BatchReport::load_json(&report_path).unwrap();
    assert_eq!(back.num_lesions, 3);
    assert_eq!(back.num_failed, 0);
    assert!(matches!(back.records[0].analysis, LesionAnalysis::Ok(_)));
}
