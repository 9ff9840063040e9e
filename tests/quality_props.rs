//! Property-Based Tests for the quality estimator
//!
//! Run with: cargo test --test quality_props

use crabcapture::quality::{luma, BrightnessAnalyzer};
use crabcapture::testing::uniform_frame;
use crabcapture::{QualityEstimator, VideoFrame};
use proptest::prelude::*;

fn arbitrary_frame() -> impl Strategy<Value = VideoFrame> {
    (1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 3) as usize)
            .prop_map(move |data| VideoFrame::new(data, w, h))
    })
}

/// Colored pixel whose luma lies inside the 80-200 target band.
fn in_band_pixel() -> impl Strategy<Value = [u8; 3]> {
    (any::<u8>(), any::<u8>(), any::<u8>())
        .prop_filter("luma inside band", |&(r, g, b)| {
            (80.5f32..=199.5).contains(&luma(r, g, b))
        })
        .prop_map(|(r, g, b)| [r, g, b])
}

/// Non-uniform frame with every pixel's luma inside the target band.
fn in_band_frame() -> impl Strategy<Value = VideoFrame> {
    (1u32..20, 1u32..20).prop_flat_map(|(w, h)| {
        prop::collection::vec(in_band_pixel(), (w * h) as usize)
            .prop_map(move |pixels| VideoFrame::new(pixels.concat(), w, h))
    })
}

proptest! {
    /// INVARIANT: Every score stays within 0-100 for any ready frame
    #[test]
    fn scores_are_bounded(frame in arbitrary_frame()) {
        let m = QualityEstimator::default().analyze(&frame).unwrap();
        prop_assert!(m.brightness <= 100);
        prop_assert!(m.contrast <= 100);
        prop_assert!(m.sharpness <= 100);
        prop_assert!(m.overall <= 100);
    }

    /// INVARIANT: Overall is the mean of the three sub-scores, up to rounding
    #[test]
    fn overall_is_mean_of_parts(frame in arbitrary_frame()) {
        let m = QualityEstimator::default().analyze(&frame).unwrap();
        let mean = (m.brightness as f64 + m.contrast as f64 + m.sharpness as f64) / 3.0;
        prop_assert!((m.overall as f64 - mean).abs() <= 1.0,
            "overall {} vs mean {}", m.overall, mean);
    }

    /// INVARIANT: Mean luma inside the target band scores at least 50
    #[test]
    fn in_band_brightness_scores_at_least_fifty(level in 80u8..=200) {
        let m = QualityEstimator::default().analyze(&uniform_frame(8, 8, level)).unwrap();
        prop_assert!(m.brightness >= 50, "level {} scored {}", level, m.brightness);
    }

    /// INVARIANT: Any frame whose pixels all sit inside the band scores at least 50
    #[test]
    fn in_band_textured_frames_score_at_least_fifty(frame in in_band_frame()) {
        let raw = BrightnessAnalyzer::default().analyze(&frame);
        prop_assert!(raw >= 50.0, "raw brightness {}", raw);
        let m = QualityEstimator::default().analyze(&frame).unwrap();
        prop_assert!(m.brightness >= 50, "brightness {}", m.brightness);
    }

    /// INVARIANT: Below the band the score ramps under 50; above it falls back towards 50
    #[test]
    fn out_of_band_brightness_ramps(mean in prop_oneof![0.0f64..80.0, 200.0f64..=255.0]) {
        let score = BrightnessAnalyzer::default().score_mean(mean);
        if mean < 80.0 {
            prop_assert!(score < 50.0);
        } else {
            prop_assert!(score >= 50.0 && score <= 100.0);
        }
    }

    /// INVARIANT: Brightness rises monotonically up to the top of the band
    #[test]
    fn brightness_monotone_below_high(a in 0.0f64..200.0, b in 0.0f64..200.0) {
        let analyzer = BrightnessAnalyzer::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(analyzer.score_mean(lo) <= analyzer.score_mean(hi) + 1e-9);
    }
}
