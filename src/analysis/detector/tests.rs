use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn detector(top: f64, bottom: f64, min_frames_below: u32) -> RepDetector {
    RepDetector::new(DetectorConfig {
        top_threshold: top,
        bottom_threshold: bottom,
        min_frames_below,
        require_signal: true,
    })
    .unwrap()
}

fn feed(detector: &mut RepDetector, values: &[Option<f64>]) -> Vec<UpdateResult> {
    values
        .iter()
        .map(|value| detector.update(value.map(TrackedSignal::new)))
        .collect()
}

/// Random mix of high-zone, mid-zone, low-zone, and absent readings
fn random_sequence(seed: u64, len: usize) -> Vec<Option<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| match rng.gen_range(0..10) {
            0 => None,
            1..=3 => Some(rng.gen_range(0.0..=200.0)),
            4..=5 => Some(rng.gen_range(200.5..350.0)),
            _ => Some(rng.gen_range(350.0..=600.0)),
        })
        .collect()
}

#[test]
fn test_new_starts_high_with_zero_counters() {
    let det = detector(200.0, 350.0, 2);
    assert_eq!(det.state(), DetectorState::default());
    assert_eq!(det.phase(), Phase::High);
    assert_eq!(det.repetition_count(), 0);
}

#[test]
fn test_new_rejects_zero_debounce() {
    let err = RepDetector::new(DetectorConfig {
        min_frames_below: 0,
        ..DetectorConfig::default()
    })
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidDebounce { value: 0 });
}

#[test]
fn test_new_rejects_inverted_and_equal_thresholds() {
    for (top, bottom) in [(350.0, 200.0), (300.0, 300.0)] {
        let result = RepDetector::new(DetectorConfig {
            top_threshold: top,
            bottom_threshold: bottom,
            ..DetectorConfig::default()
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }
}

#[test]
fn test_new_rejects_non_finite_thresholds() {
    let result = RepDetector::new(DetectorConfig {
        bottom_threshold: f64::NAN,
        ..DetectorConfig::default()
    });
    assert!(matches!(
        result,
        Err(ConfigError::NonFiniteThreshold {
            name: "bottom_threshold",
            ..
        })
    ));
}

#[test]
fn test_scenario_a_single_rep() {
    let mut det = detector(200.0, 350.0, 2);
    let results = feed(
        &mut det,
        &[Some(100.0), Some(400.0), Some(400.0), Some(150.0)],
    );

    let phases: Vec<Phase> = results.iter().map(|r| r.phase).collect();
    assert_eq!(phases, vec![Phase::High, Phase::High, Phase::Low, Phase::High]);

    let events: Vec<bool> = results.iter().map(|r| r.event_fired).collect();
    assert_eq!(events, vec![false, false, false, true]);

    let statuses: Vec<DetectorStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            DetectorStatus::Descending,
            DetectorStatus::Descending,
            DetectorStatus::ReachedDepth,
            DetectorStatus::RepCompleted,
        ]
    );
    assert_eq!(results[3].repetition_count, 1);
    assert_eq!(results[3].status_text, "repetition completed");
}

#[test]
fn test_scenario_b_noisy_dip_breaks_debounce() {
    let mut det = detector(200.0, 350.0, 2);
    let results = feed(
        &mut det,
        &[Some(400.0), Some(100.0), Some(400.0), Some(400.0), Some(150.0)],
    );

    assert_eq!(results[1].phase, Phase::High);
    assert_eq!(results[2].phase, Phase::High);
    assert_eq!(results[3].phase, Phase::Low);
    assert_eq!(results[3].status, DetectorStatus::ReachedDepth);
    assert_eq!(results[4].repetition_count, 1);
    assert!(results[4].event_fired);
}

#[test]
fn test_scenario_c_absence_keeps_debounce_progress() {
    let mut det = detector(200.0, 350.0, 2);
    feed(&mut det, &[Some(400.0), Some(400.0)]);
    let after_second = det.state();

    let absent = det.update(None);
    assert_eq!(det.state(), after_second);
    assert_eq!(absent.depth, None);
    assert!(!absent.event_fired);
    assert_eq!(absent.status, DetectorStatus::SignalMissing);

    let last = det.update(Some(TrackedSignal::new(150.0)));
    assert!(last.event_fired);
    assert_eq!(last.repetition_count, 1);
}

#[test]
fn test_absence_mid_debounce_does_not_reset_counter() {
    let mut det = detector(200.0, 350.0, 3);
    feed(&mut det, &[Some(400.0), Some(400.0)]);
    assert_eq!(det.state().debounce_counter, 2);

    det.update(None);
    assert_eq!(det.state().debounce_counter, 2);

    let result = det.update(Some(TrackedSignal::new(400.0)));
    assert_eq!(result.phase, Phase::Low);
}

#[test]
fn test_scenario_d_reset_reproduces_fresh_trace() {
    let mut det = detector(200.0, 350.0, 2);
    feed(
        &mut det,
        &[Some(100.0), Some(400.0), Some(400.0), Some(150.0)],
    );
    det.reset();

    let sequence = [Some(400.0), Some(400.0), Some(150.0)];
    let after_reset = feed(&mut det, &sequence);
    let mut fresh = detector(200.0, 350.0, 2);
    let fresh_trace = feed(&mut fresh, &sequence);

    assert_eq!(after_reset, fresh_trace);
}

#[test]
fn test_reset_keeps_config() {
    let mut det = detector(180.0, 420.0, 4);
    feed(&mut det, &[Some(500.0); 4]);
    det.reset();
    assert_eq!(det.config().top_threshold, 180.0);
    assert_eq!(det.config().bottom_threshold, 420.0);
    assert_eq!(det.config().min_frames_below, 4);
}

#[test]
fn test_reset_is_idempotent() {
    let mut det = detector(200.0, 350.0, 2);
    feed(&mut det, &random_sequence(7, 200));
    det.reset();
    let once = det.state();
    det.reset();
    det.reset();
    assert_eq!(det.state(), once);
    assert_eq!(once, DetectorState::default());
}

#[test]
fn test_debounce_k_minus_one_then_break_does_not_transition() {
    for k in 1..=6u32 {
        let mut det = detector(200.0, 350.0, k);
        let mut values = vec![Some(400.0); (k - 1) as usize];
        values.push(Some(300.0));
        let results = feed(&mut det, &values);
        assert!(
            results.iter().all(|r| r.phase == Phase::High),
            "k={k} transitioned early"
        );
        assert_eq!(det.state().debounce_counter, 0);
    }
}

#[test]
fn test_debounce_exactly_k_transitions() {
    for k in 1..=6u32 {
        let mut det = detector(200.0, 350.0, k);
        let results = feed(&mut det, &vec![Some(400.0); k as usize]);
        let (last, earlier) = results.split_last().unwrap();
        assert!(earlier.iter().all(|r| r.phase == Phase::High));
        assert_eq!(last.phase, Phase::Low, "k={k} did not transition");
        assert_eq!(det.state().debounce_counter, 0);
    }
}

#[test]
fn test_bottom_threshold_is_inclusive() {
    let mut det = detector(200.0, 350.0, 1);
    let result = det.update(Some(TrackedSignal::new(350.0)));
    assert_eq!(result.phase, Phase::Low);
}

#[test]
fn test_top_threshold_is_inclusive() {
    let mut det = detector(200.0, 350.0, 1);
    det.update(Some(TrackedSignal::new(400.0)));
    let result = det.update(Some(TrackedSignal::new(200.0)));
    assert!(result.event_fired);
}

#[test]
fn test_no_debounce_on_ascent() {
    for dwell in 0..5usize {
        let mut det = detector(200.0, 350.0, 3);
        feed(&mut det, &[Some(400.0); 3]);
        assert_eq!(det.phase(), Phase::Low);
        feed(&mut det, &vec![Some(300.0); dwell]);

        let result = det.update(Some(TrackedSignal::new(120.0)));
        assert!(result.event_fired, "dwell={dwell}");
        assert_eq!(result.phase, Phase::High);
    }
}

#[test]
fn test_mid_zone_in_low_reports_ascending() {
    let mut det = detector(200.0, 350.0, 1);
    det.update(Some(TrackedSignal::new(400.0)));
    let result = det.update(Some(TrackedSignal::new(250.0)));
    assert_eq!(result.phase, Phase::Low);
    assert_eq!(result.status, DetectorStatus::Ascending);
    assert_eq!(result.status_text, "below / ascending");
}

#[test]
fn test_depth_echoes_input() {
    let mut det = detector(200.0, 350.0, 2);
    let result = det.update(Some(TrackedSignal::new(287.5)));
    assert_eq!(result.depth, Some(287.5));
}

#[test]
fn test_require_signal_false_reports_ignored_and_stays_inert() {
    let mut det = RepDetector::new(DetectorConfig {
        require_signal: false,
        ..DetectorConfig::default()
    })
    .unwrap();
    det.update(Some(TrackedSignal::new(400.0)));
    let before = det.state();

    let result = det.update(None);
    assert_eq!(result.status, DetectorStatus::SignalIgnored);
    assert_eq!(result.status_text, "no marker (ignored)");
    assert_eq!(det.state(), before);
}

#[test]
fn test_nan_resets_debounce_in_high_and_holds_in_low() {
    let mut det = detector(200.0, 350.0, 2);
    det.update(Some(TrackedSignal::new(400.0)));
    let result = det.update(Some(TrackedSignal::new(f64::NAN)));
    assert_eq!(result.phase, Phase::High);
    assert_eq!(det.state().debounce_counter, 0);

    feed(&mut det, &[Some(400.0), Some(400.0)]);
    let result = det.update(Some(TrackedSignal::new(f64::NAN)));
    assert_eq!(result.phase, Phase::Low);
    assert!(!result.event_fired);
}

#[test]
fn test_infinite_readings_are_handled() {
    let mut det = detector(200.0, 350.0, 1);
    let result = det.update(Some(TrackedSignal::new(f64::INFINITY)));
    assert_eq!(result.phase, Phase::Low);
    let result = det.update(Some(TrackedSignal::new(f64::NEG_INFINITY)));
    assert!(result.event_fired);
}

#[test]
fn test_count_is_monotonic_and_steps_by_at_most_one() {
    for seed in 0..32 {
        let mut det = detector(200.0, 350.0, 2);
        let mut previous = 0;
        for result in feed(&mut det, &random_sequence(seed, 500)) {
            assert!(result.repetition_count >= previous);
            assert!(result.repetition_count - previous <= 1);
            previous = result.repetition_count;
        }
    }
}

#[test]
fn test_event_fires_iff_low_to_high_transition() {
    for seed in 0..32 {
        let mut det = detector(200.0, 350.0, 3);
        let mut previous_phase = det.phase();
        for result in feed(&mut det, &random_sequence(seed, 500)) {
            let ascended = previous_phase == Phase::Low && result.phase == Phase::High;
            assert_eq!(result.event_fired, ascended, "seed={seed}");
            previous_phase = result.phase;
        }
    }
}

#[test]
fn test_absent_cycle_never_changes_state() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut det = detector(200.0, 350.0, 3);
    for value in random_sequence(11, 1_000) {
        det.update(value.map(TrackedSignal::new));
        if rng.gen_bool(0.3) {
            let before = det.state();
            let result = det.update(None);
            assert_eq!(det.state(), before);
            assert_eq!(result.repetition_count, before.repetition_count);
            assert_eq!(result.phase, before.phase);
            assert!(!result.event_fired);
        }
    }
}

#[test]
fn test_set_thresholds_validates_and_keeps_previous_on_error() {
    let mut det = detector(200.0, 350.0, 2);
    assert!(det.set_top_threshold(400.0).is_err());
    assert_eq!(det.config().top_threshold, 200.0);

    assert!(det.set_bottom_threshold(f64::NAN).is_err());
    assert_eq!(det.config().bottom_threshold, 350.0);

    det.set_thresholds(450.0, 600.0).unwrap();
    assert_eq!(det.config().top_threshold, 450.0);
    assert_eq!(det.config().bottom_threshold, 600.0);
}

#[test]
fn test_tuned_thresholds_apply_on_next_update() {
    let mut det = detector(200.0, 350.0, 1);
    assert_eq!(
        det.update(Some(TrackedSignal::new(300.0))).phase,
        Phase::High
    );
    det.set_bottom_threshold(280.0).unwrap();
    assert_eq!(det.update(Some(TrackedSignal::new(300.0))).phase, Phase::Low);
}

#[test]
fn test_set_min_frames_below() {
    let mut det = detector(200.0, 350.0, 4);
    assert_eq!(
        det.set_min_frames_below(0),
        Err(ConfigError::InvalidDebounce { value: 0 })
    );
    feed(&mut det, &[Some(400.0), Some(400.0)]);
    det.set_min_frames_below(3).unwrap();
    let result = det.update(Some(TrackedSignal::new(400.0)));
    assert_eq!(result.phase, Phase::Low);
}

#[test]
fn test_set_require_signal_switches_absent_status() {
    let mut det = detector(200.0, 350.0, 2);
    assert_eq!(det.update(None).status, DetectorStatus::SignalMissing);
    det.set_require_signal(false);
    assert_eq!(det.update(None).status, DetectorStatus::SignalIgnored);
}
