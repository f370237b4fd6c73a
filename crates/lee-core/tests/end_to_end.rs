//! End-to-end correction tests: calibration → coefficient fit → global p-value.

use std::path::PathBuf;

use lee_config::LeeConfig;
use lee_core::{
    do_lee_correction, expected_euler, get_coefficients, global_pvalue, measure_calibration,
    Advisory, Calibration, CalibrationPoint, Error, LeeCorrector, Surface,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn backgrounds() -> Vec<Surface> {
    ["background_a.json", "background_b.json"]
        .iter()
        .map(|name| Surface::from_file(&fixture(name)).expect("background fixture"))
        .collect()
}

fn synthetic_calibration(n1: f64, n2: f64) -> Calibration {
    synthetic_calibration_at(1.0, 4.0, n1, n2)
}

fn synthetic_calibration_at(u1: f64, u2: f64, n1: f64, n2: f64) -> Calibration {
    Calibration::new(
        CalibrationPoint::exact(u1, expected_euler(u1, n1, n2).unwrap()),
        CalibrationPoint::exact(u2, expected_euler(u2, n1, n2).unwrap()),
    )
}

#[test]
fn three_sigma_local_becomes_under_two_sigma_global() {
    let calibration = synthetic_calibration(0.5, 0.8);
    let correction = do_lee_correction(
        3.0,
        1.0,
        4.0,
        calibration.first.euler,
        calibration.second.euler,
    )
    .unwrap();

    assert!((correction.coefficients.n1 - 0.5).abs() < 1e-6);
    assert!((correction.coefficients.n2 - 0.8).abs() < 1e-6);
    assert!((correction.local_p_value - 0.0013498980316301).abs() < 1e-12);
    assert!((correction.global_p_value - 0.03491588602416289).abs() < 1e-8);
    assert!((correction.global_significance - 1.8130).abs() < 1e-3);
    assert!((correction.trials_factor - 25.866).abs() < 1e-2);
    assert!(correction.advisories.is_empty());
    assert!(correction.solver.converged);
}

#[test]
fn background_fixtures_calibrate_and_correct() {
    let calibration = measure_calibration(&backgrounds(), 1.0, 4.0).unwrap();
    assert_eq!(calibration.first.samples, 2);
    assert_eq!(calibration.first.euler, 3.0);
    assert_eq!(calibration.second.euler, 1.0);
    assert_eq!(calibration.second.std_error, 0.0);

    let corrector = LeeCorrector::from_config(&LeeConfig::default());
    let correction = corrector.correct(3.0, &calibration).unwrap();
    assert!((correction.coefficients.n1 - 1.793162360255967).abs() < 1e-6);
    assert!((correction.coefficients.n2 - 2.629844868114171).abs() < 1e-6);
    assert!((correction.global_p_value - 0.110264843123834).abs() < 1e-8);
}

#[test]
fn observed_surface_peak_feeds_the_correction() {
    let observed = Surface::from_file(&fixture("reference_surface.json")).unwrap();
    let calibration = synthetic_calibration(0.5, 0.8);
    let correction = LeeCorrector::default()
        .correct(observed.max_local_significance(), &calibration)
        .unwrap();
    assert!((correction.threshold - 9.0).abs() < 1e-12);
    assert!((correction.global_p_value - 0.03491588602416289).abs() < 1e-8);
}

#[test]
fn coefficients_recover_known_values() {
    let (n1, n2) = (3.2, 0.05);
    let phi1 = expected_euler(2.0, n1, n2).unwrap();
    let phi2 = expected_euler(6.0, n1, n2).unwrap();
    let c = get_coefficients(2.0, 6.0, phi1, phi2).unwrap();
    assert!((c.n1 - n1).abs() < 1e-6);
    assert!((c.n2 - n2).abs() < 1e-6);
}

#[test]
fn global_pvalue_at_zero_is_one_for_any_shape() {
    for n2 in [0.0, 1.0, 250.0] {
        assert_eq!(global_pvalue(0.0, 0.0, n2).unwrap(), 1.0);
    }
}

#[test]
fn small_significance_raises_p_value_advisory() {
    let calibration = synthetic_calibration(0.5, 0.8);
    let correction = LeeCorrector::default().correct(0.5, &calibration).unwrap();
    assert!(correction.global_p_value > 1.0);
    assert!(correction.global_significance.is_nan());
    assert!(correction
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::PValueOutOfRange { .. })));
}

#[test]
fn strict_mode_turns_advisories_into_errors() {
    let calibration = synthetic_calibration(0.5, 0.8);
    let err = LeeCorrector::default()
        .strict(true)
        .correct(0.5, &calibration)
        .unwrap_err();
    match err {
        Error::OutOfRangeResult { advisories } => assert!(!advisories.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn negative_coefficients_are_advisory_not_fatal() {
    // More upcrossings at the higher level than the model allows with n ≥ 0.
    let correction = do_lee_correction(3.0, 1.0, 4.0, 0.4, 0.9).unwrap();
    assert!(correction.coefficients.is_unphysical());
    assert!(correction
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::NegativeCoefficients { .. })));
}

#[test]
fn equal_thresholds_are_degenerate() {
    let err = do_lee_correction(3.0, 2.0, 2.0, 1.0, 1.0).unwrap_err();
    assert!(matches!(err, Error::DegenerateSystem { .. }));
    assert_eq!(err.code(), 20);
}

#[test]
fn invalid_inputs_are_rejected_before_solving() {
    assert!(matches!(
        do_lee_correction(-1.0, 1.0, 4.0, 0.5, 0.2),
        Err(Error::InvalidSignificance { .. })
    ));
    assert!(matches!(
        do_lee_correction(f64::NAN, 1.0, 4.0, 0.5, 0.2),
        Err(Error::InvalidSignificance { .. })
    ));
    assert!(matches!(
        do_lee_correction(3.0, -1.0, 4.0, 0.5, 0.2),
        Err(Error::InvalidThreshold { .. })
    ));
}

#[test]
fn overflowing_calibration_does_not_converge() {
    let calibration = Calibration::new(
        CalibrationPoint::exact(4.0, 1e308),
        CalibrationPoint::exact(9.0, 0.3),
    );
    let err = LeeCorrector::default().correct(3.0, &calibration).unwrap_err();
    assert!(matches!(err, Error::NonConvergence { .. }), "{err:?}");
}

#[test]
fn high_threshold_calibration_round_trips() {
    let calibration = synthetic_calibration_at(50.0, 60.0, 0.5, 0.8);
    let correction = LeeCorrector::default().correct(8.0, &calibration).unwrap();
    assert!((correction.coefficients.n1 - 0.5).abs() < 1e-6, "{correction:?}");
    assert!((correction.coefficients.n2 - 0.8).abs() < 1e-6, "{correction:?}");
    assert!(correction.solver.iterations >= 1);
}

#[test]
fn channels_fail_independently() {
    let channels = vec![
        ("diphoton".to_string(), 3.0),
        ("broken".to_string(), -2.0),
        ("dilepton".to_string(), 4.0),
    ];
    let batch = LeeCorrector::default()
        .correct_channels(&channels, &synthetic_calibration(0.5, 0.8))
        .unwrap();

    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.succeeded, 2);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].item_id, "broken");
    assert_eq!(batch.succeeded[0].channel, "diphoton");
    assert!(batch.succeeded[1].correction.global_p_value < batch.succeeded[0].correction.global_p_value);
}
