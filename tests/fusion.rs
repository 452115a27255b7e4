//! Fusion pipeline integration tests.
//!
//! Deterministic end-to-end scenarios: initialization from either sensor,
//! velocity convergence on a straight track, and recovery behavior around
//! rejected measurements.

use fusion_ekf_rs::{FilterError, FusionConfig, FusionOrchestrator, Measurement, StepOutcome};

fn orchestrator() -> FusionOrchestrator {
    FusionOrchestrator::new(FusionConfig::default()).unwrap()
}

#[test]
fn laser_sequence_converges_to_track_velocity() {
    // three laser fixes on a straight line: 1.0 units/s along x,
    // 0.5 units/s along y, sampled every 0.1 s
    let mut fusion = orchestrator();
    fusion.process(&Measurement::laser(0, 1.0, 1.0)).unwrap();
    fusion
        .process(&Measurement::laser(100_000, 1.1, 1.05))
        .unwrap();
    fusion
        .process(&Measurement::laser(200_000, 1.2, 1.1))
        .unwrap();

    let estimate = fusion.current_estimate().unwrap();
    assert!(
        (estimate.state[2] - 1.0).abs() < 0.1,
        "vx = {}",
        estimate.state[2]
    );
    assert!(
        (estimate.state[3] - 0.5).abs() < 0.1,
        "vy = {}",
        estimate.state[3]
    );
    assert!((estimate.state[0] - 1.2).abs() < 0.05);
    assert!((estimate.state[1] - 1.1).abs() < 0.05);
}

#[test]
fn noise_free_mixed_stream_locks_onto_target() {
    // exact measurements of a target starting at (2, 6) with velocity
    // (0.8, -0.4), alternating laser and radar returns every 0.1 s
    let mut fusion = orchestrator();
    let (x0, y0, vx, vy) = (2.0, 6.0, 0.8, -0.4);

    for i in 0..40 {
        let t = i as f64 * 0.1;
        let (px, py) = (x0 + vx * t, y0 + vy * t);
        let timestamp = (i * 100_000) as i64;

        let measurement = if i % 2 == 0 {
            Measurement::laser(timestamp, px, py)
        } else {
            let range = (px * px + py * py).sqrt();
            let bearing = px.atan2(py);
            let range_rate = (px * vx + py * vy) / range;
            Measurement::radar(timestamp, range, bearing, range_rate)
        };

        let outcome = fusion.process(&measurement).unwrap();
        if i == 0 {
            assert!(matches!(outcome, StepOutcome::Initialized));
        } else {
            assert!(matches!(outcome, StepOutcome::Updated));
        }
    }

    let t_final = 39.0 * 0.1;
    let estimate = fusion.current_estimate().unwrap();
    assert!((estimate.state[0] - (x0 + vx * t_final)).abs() < 0.05);
    assert!((estimate.state[1] - (y0 + vy * t_final)).abs() < 0.05);
    assert!((estimate.state[2] - vx).abs() < 0.1);
    assert!((estimate.state[3] - vy).abs() < 0.1);
}

#[test]
fn tracking_continues_after_out_of_order_rejection() {
    let mut fusion = orchestrator();
    fusion.process(&Measurement::laser(0, 1.0, 1.0)).unwrap();
    fusion
        .process(&Measurement::laser(100_000, 1.1, 1.05))
        .unwrap();

    // stale measurement is rejected without disturbing the track
    let result = fusion.process(&Measurement::laser(50_000, 4.0, 4.0));
    assert!(matches!(
        result,
        Err(FilterError::OutOfOrderMeasurement { .. })
    ));

    // the next in-order measurement is processed normally
    let outcome = fusion
        .process(&Measurement::laser(200_000, 1.2, 1.1))
        .unwrap();
    assert!(matches!(outcome, StepOutcome::Updated));

    let estimate = fusion.current_estimate().unwrap();
    assert_eq!(estimate.timestamp_us, 200_000);
    assert!((estimate.state[0] - 1.2).abs() < 0.05);
}

#[test]
fn covariance_tightens_as_measurements_accumulate() {
    let mut fusion = orchestrator();
    fusion.process(&Measurement::laser(0, 0.0, 0.0)).unwrap();
    let initial_trace = fusion.current_estimate().unwrap().covariance.trace();

    for i in 1..20 {
        let t = i as f64 * 0.1;
        fusion
            .process(&Measurement::laser((i * 100_000) as i64, t, 0.5 * t))
            .unwrap();
    }

    let final_trace = fusion.current_estimate().unwrap().covariance.trace();
    assert!(
        final_trace < initial_trace,
        "trace went from {} to {}",
        initial_trace,
        final_trace
    );
}

#[test]
fn radar_only_stream_tracks_range_and_bearing() {
    // radar-only tracking of a target moving along +x at 1 unit/s from (1, 4)
    let mut fusion = orchestrator();
    let (x0, y0, vx, vy) = (1.0, 4.0, 1.0, 0.0);

    for i in 0..30 {
        let t = i as f64 * 0.1;
        let (px, py) = (x0 + vx * t, y0 + vy * t);
        let range = (px * px + py * py).sqrt();
        let bearing = px.atan2(py);
        let range_rate = (px * vx + py * vy) / range;
        fusion
            .process(&Measurement::radar((i * 100_000) as i64, range, bearing, range_rate))
            .unwrap();
    }

    let t_final = 29.0 * 0.1;
    let estimate = fusion.current_estimate().unwrap();
    assert!((estimate.state[0] - (x0 + vx * t_final)).abs() < 0.15);
    assert!((estimate.state[1] - y0).abs() < 0.15);
    assert!((estimate.state[2] - vx).abs() < 0.2);
}
