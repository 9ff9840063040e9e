use crabcapture::quality::QualityMetrics;
use crabcapture::types::{
    CaptureMetadata, CaptureState, CapturedImage, FaceBox, FacePresence, Phase, Resolution,
    VideoConstraints, VideoFrame,
};

#[test]
fn test_phase_status_messages() {
    assert_eq!(Phase::Countdown.status_message(Some(2)), "Capturing in 2s");
    assert_eq!(Phase::Idle.as_str(), "idle");
    assert!(Phase::Capturing.is_busy());
    assert!(Phase::Complete.is_busy());
    assert!(!Phase::Preparing.is_busy());
    assert!(!Phase::Detecting.is_busy());
}

#[test]
fn test_capture_state_default() {
    let state = CaptureState::default();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.countdown, None);
    assert!(!state.face_stable);
    assert!(!state.can_capture);
    assert_eq!(state.quality_score, 0);
}

#[test]
fn test_capture_state_serializes_snake_case() {
    let state = CaptureState {
        phase: Phase::Countdown,
        countdown: Some(3),
        ..CaptureState::default()
    };
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["phase"], "countdown");
    assert_eq!(json["countdown"], 3);
}

#[test]
fn test_video_constraints_default() {
    let constraints = VideoConstraints::default();
    assert_eq!(constraints.ideal, Resolution::new(1280, 720));
    assert_eq!(constraints.min, Resolution::new(640, 480));
    assert_eq!(constraints.frame_rate, 30);
}

#[test]
fn test_frame_readiness() {
    assert!(!VideoFrame::empty().is_ready());
    assert!(!VideoFrame::new(vec![0; 5], 2, 2).is_ready());
    let frame = VideoFrame::new(vec![7; 12], 2, 2);
    assert!(frame.is_ready());
    assert_eq!(frame.resolution().to_string(), "2x2");
    let img = frame.to_rgb_image().unwrap();
    assert_eq!(VideoFrame::from_rgb_image(img), frame);
}

#[test]
fn test_face_presence_constructors() {
    assert!(!FacePresence::absent().present);
    assert!(FacePresence::stable().stable);
    let reading = FacePresence::unstable().with_face_box(FaceBox::new(0.0, 0.0, 0.5, 0.5));
    assert!(reading.present && !reading.stable);
    assert_eq!(reading.face_box.map(|b| b.coverage_percent()), Some(25));
}

#[test]
fn test_captured_image_metadata_json_skips_bytes() {
    let image = CapturedImage {
        id: "abc".to_string(),
        mime_type: "image/jpeg".to_string(),
        data: vec![1, 2, 3],
        metadata: CaptureMetadata {
            quality: QualityMetrics::default(),
            timestamp: chrono::Utc::now(),
            resolution: Resolution::new(4, 4),
            mirrored: true,
        },
    };
    assert_eq!(image.size_bytes(), 3);
    let json = image.metadata_json().unwrap();
    assert!(json.contains("\"mirrored\":true") || json.contains("\"mirrored\": true"));
    assert!(!json.contains("\"data\""));
}
