//! Brightness scoring from mean luma.

use super::{clamp_score, luma_plane};
use crate::types::VideoFrame;

/// Scores mean luma against a target band.
///
/// Below `low` the score ramps 0..50, inside the band 50..100, above `high`
/// it falls back from 100 towards 50 at pure white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessAnalyzer {
    pub low: f64,
    pub high: f64,
}

impl Default for BrightnessAnalyzer {
    fn default() -> Self {
        Self {
            low: 80.0,
            high: 200.0,
        }
    }
}

impl BrightnessAnalyzer {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn mean_luma(frame: &VideoFrame) -> f64 {
        let plane = luma_plane(frame);
        if plane.is_empty() {
            return 0.0;
        }
        plane.iter().map(|&l| l as f64).sum::<f64>() / plane.len() as f64
    }

    pub fn score_mean(&self, mean: f64) -> f64 {
        let score = if mean < self.low {
            mean / self.low * 50.0
        } else if mean > self.high {
            50.0 + (255.0 - mean) / (255.0 - self.high) * 50.0
        } else {
            50.0 + (mean - self.low) / (self.high - self.low) * 50.0
        };
        clamp_score(score)
    }

    pub fn analyze(&self, frame: &VideoFrame) -> f64 {
        self.score_mean(Self::mean_luma(frame))
    }
}
