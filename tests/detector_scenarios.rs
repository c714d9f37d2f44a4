//! End-to-end detector traces through the public API.

use rep_tracker::{DetectorConfig, Phase, RepDetector, TrackedSignal, UpdateResult};

fn detector() -> RepDetector {
    RepDetector::new(DetectorConfig {
        top_threshold: 200.0,
        bottom_threshold: 350.0,
        min_frames_below: 2,
        require_signal: true,
    })
    .expect("valid config")
}

fn feed(detector: &mut RepDetector, values: &[Option<f64>]) -> Vec<UpdateResult> {
    values
        .iter()
        .map(|value| detector.update(value.map(TrackedSignal::new)))
        .collect()
}

fn present(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn scenario_single_clean_rep() {
    let mut detector = detector();
    let results = feed(&mut detector, &present(&[100.0, 400.0, 400.0, 150.0]));

    let phases: Vec<Phase> = results.iter().map(|r| r.phase).collect();
    assert_eq!(phases, vec![Phase::High, Phase::High, Phase::Low, Phase::High]);
    let fired: Vec<bool> = results.iter().map(|r| r.event_fired).collect();
    assert_eq!(fired, vec![false, false, false, true]);
    assert_eq!(detector.repetition_count(), 1);
}

#[test]
fn scenario_noisy_dip_breaks_debounce() {
    let mut detector = detector();
    let results = feed(
        &mut detector,
        &present(&[400.0, 100.0, 400.0, 400.0, 150.0]),
    );

    assert_eq!(results[1].phase, Phase::High);
    assert_eq!(results[2].phase, Phase::High);
    assert_eq!(results[3].phase, Phase::Low);
    assert!(results[4].event_fired);
    assert_eq!(results[4].repetition_count, 1);
}

#[test]
fn scenario_absence_keeps_debounce_progress() {
    let mut detector = detector();
    feed(&mut detector, &present(&[400.0]));
    let before = detector.state();
    let absent = detector.update(None);
    assert_eq!(detector.state(), before);
    assert_eq!(absent.depth, None);
    assert!(!absent.event_fired);
    assert!(absent.status.is_unavailable());

    let mut detector = detector_after(&[Some(400.0), Some(400.0)]);
    let after_two = detector.state();
    detector.update(None);
    assert_eq!(detector.state(), after_two);
    let last = detector.update(Some(TrackedSignal::new(150.0)));
    assert!(last.event_fired);
    assert_eq!(detector.repetition_count(), 1);
}

#[test]
fn scenario_reset_matches_fresh_detector() {
    let mut reused = detector_after(&present(&[100.0, 400.0, 400.0, 150.0]));
    reused.reset();
    assert_eq!(reused.state(), Default::default());

    let tail = present(&[400.0, 400.0, 150.0]);
    let mut fresh = detector();
    assert_eq!(feed(&mut reused, &tail), feed(&mut fresh, &tail));
}

#[test]
fn rejects_inverted_thresholds() {
    let result = RepDetector::new(DetectorConfig {
        top_threshold: 350.0,
        bottom_threshold: 200.0,
        ..DetectorConfig::default()
    });
    assert!(result.is_err());
}

fn detector_after(values: &[Option<f64>]) -> RepDetector {
    let mut detector = detector();
    feed(&mut detector, values);
    detector
}
