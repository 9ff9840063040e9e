/// Frame quality estimation
///
/// Cheap per-frame heuristics (brightness, contrast, sharpness) combined into
/// a single 0-100 score that gates auto-capture. The constants are tunable;
/// the scores are not calibrated measurements.
pub mod blur;
pub mod contrast;
pub mod estimator;
pub mod exposure;

pub use blur::SharpnessAnalyzer;
pub use contrast::ContrastAnalyzer;
pub use estimator::{EstimatorConfig, Guidance, QualityEstimator, QualityGrade, QualityMetrics};
pub use exposure::BrightnessAnalyzer;

use crate::types::VideoFrame;

/// ITU-R BT.601 luma of an RGB pixel.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Luma plane of a ready frame, row-major.
pub(crate) fn luma_plane(frame: &VideoFrame) -> Vec<f32> {
    frame
        .data
        .chunks_exact(3)
        .take(frame.pixel_count())
        .map(|px| luma(px[0], px[1], px[2]))
        .collect()
}

#[inline]
pub(crate) fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
