//! Quality Analysis Testing
//!
//! Estimator behaviour on synthetic frames:
//! - Brightness band scoring
//! - Contrast and sharpness on textured versus flat frames
//! - Composite score, grade and guidance
//! - Rejection of frames that are not ready

use crabcapture::quality::{
    BrightnessAnalyzer, ContrastAnalyzer, EstimatorConfig, SharpnessAnalyzer,
};
use crabcapture::testing::{
    checkerboard_frame, gradient_frame, stripes_frame, synthetic_face_frame, uniform_frame,
};
use crabcapture::{CaptureError, Guidance, QualityEstimator, QualityGrade, VideoFrame};

#[test]
fn test_mid_gray_brightness() {
    let metrics = QualityEstimator::default()
        .analyze(&uniform_frame(32, 32, 128))
        .unwrap();
    assert_eq!(metrics.brightness, 70);
    assert_eq!(metrics.contrast, 0);
    assert_eq!(metrics.sharpness, 0);
    assert_eq!(metrics.overall, 23);
    assert_eq!(metrics.grade(), QualityGrade::Poor);
}

#[test]
fn test_dark_frame_asks_for_light() {
    let metrics = QualityEstimator::default()
        .analyze(&uniform_frame(32, 32, 20))
        .unwrap();
    assert!(metrics.brightness < 20);
    assert!(metrics.guidance(70).contains(&Guidance::MoveToBrighterPlace));
}

#[test]
fn test_overexposed_frame_falls_back_towards_fifty() {
    let analyzer = BrightnessAnalyzer::default();
    let score = analyzer.analyze(&uniform_frame(16, 16, 250));
    assert!(score > 50.0 && score < 60.0, "score {}", score);
    assert!((analyzer.score_mean(255.0) - 50.0).abs() < 1e-9);
    assert!((analyzer.score_mean(200.0) - 100.0).abs() < 1e-9);
}

#[test]
fn test_checkerboard_is_sharp_and_contrasty() {
    let metrics = QualityEstimator::default()
        .analyze(&checkerboard_frame(64, 64, 1))
        .unwrap();
    assert_eq!(metrics.contrast, 100);
    assert_eq!(metrics.sharpness, 100);
    assert!(metrics.overall >= 85);
    assert!(metrics.meets(70));
    assert!(metrics.guidance(70).is_empty());
}

#[test]
fn test_wide_stripes_have_lower_contrast_than_fine_stripes() {
    let contrast = ContrastAnalyzer::default();
    let fine = contrast.analyze(&stripes_frame(64, 16, 1, 100, 140));
    let wide = contrast.analyze(&stripes_frame(64, 16, 16, 100, 140));
    assert!(fine > wide);
    assert!((fine - 80.0).abs() < 1e-6, "fine stripes {}", fine);
}

#[test]
fn test_gradient_is_soft() {
    let sharpness = SharpnessAnalyzer::default();
    assert!(sharpness.analyze(&gradient_frame(128, 32)) < 5.0);
    assert_eq!(SharpnessAnalyzer::edge_energy(&uniform_frame(2, 2, 255)), 0.0);
}

#[test]
fn test_synthetic_face_clears_threshold() {
    let metrics = QualityEstimator::default()
        .analyze(&synthetic_face_frame(160, 120))
        .unwrap();
    assert!(metrics.overall >= 80, "overall {}", metrics.overall);
    assert_eq!(metrics.grade(), QualityGrade::Good);
    assert!(metrics.brightness >= 50);
}

#[test]
fn test_blur_lowers_sharpness() {
    let estimator = QualityEstimator::default();
    let sharp = synthetic_face_frame(160, 120).to_rgb_image().unwrap();
    let blurred = image::imageops::blur(&sharp, 3.0);

    let sharp_metrics = estimator.analyze_image(&sharp).unwrap();
    let blurred_metrics = estimator.analyze_image(&blurred).unwrap();

    assert!(blurred_metrics.sharpness < 30);
    assert!(blurred_metrics.sharpness < sharp_metrics.sharpness);
    assert!(!blurred_metrics.meets(70));
    assert!(blurred_metrics.guidance(70).contains(&Guidance::HoldStill));
}

#[test]
fn test_custom_band_changes_brightness() {
    let strict = QualityEstimator::new(EstimatorConfig {
        brightness_low: 150.0,
        brightness_high: 220.0,
        ..EstimatorConfig::default()
    });
    let frame = uniform_frame(16, 16, 128);
    let default_score = QualityEstimator::default().analyze(&frame).unwrap().brightness;
    let strict_score = strict.analyze(&frame).unwrap().brightness;
    assert!(strict_score < default_score);
    assert!(strict_score < 50);
}

#[test]
fn test_frames_not_ready_are_rejected() {
    let estimator = QualityEstimator::default();

    let err = estimator.analyze(&VideoFrame::empty()).unwrap_err();
    assert!(matches!(err, CaptureError::QualitySampling(_)));

    let short = VideoFrame::new(vec![0u8; 10], 4, 4);
    assert!(matches!(
        estimator.analyze(&short),
        Err(CaptureError::QualitySampling(_))
    ));
}

#[test]
fn test_grade_thresholds() {
    assert_eq!(QualityGrade::from_score(100), QualityGrade::Good);
    assert_eq!(QualityGrade::from_score(80), QualityGrade::Good);
    assert_eq!(QualityGrade::from_score(79), QualityGrade::Fair);
    assert_eq!(QualityGrade::from_score(60), QualityGrade::Fair);
    assert_eq!(QualityGrade::from_score(59), QualityGrade::Poor);
    assert_eq!(QualityGrade::from_score(0), QualityGrade::Poor);
}
