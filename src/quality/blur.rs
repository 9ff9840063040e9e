//! Sharpness from Laplacian edge energy.

use super::{clamp_score, luma_plane};
use crate::types::VideoFrame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpnessAnalyzer {
    /// Mean absolute Laplacian that maps to a score of 100
    pub normalization: f64,
}

impl Default for SharpnessAnalyzer {
    fn default() -> Self {
        Self { normalization: 50.0 }
    }
}

impl SharpnessAnalyzer {
    pub fn new(normalization: f64) -> Self {
        Self { normalization }
    }

    /// Mean |4-neighbour Laplacian| over interior luma pixels. Frames smaller
    /// than 3x3 have no interior and return 0.
    pub fn edge_energy(frame: &VideoFrame) -> f64 {
        let width = frame.width as usize;
        let height = frame.height as usize;
        if width < 3 || height < 3 || !frame.is_ready() {
            return 0.0;
        }

        let gray = luma_plane(frame);
        let mut sum = 0.0f64;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;
                let lap = -4.0 * gray[idx]
                    + gray[idx - 1]
                    + gray[idx + 1]
                    + gray[idx - width]
                    + gray[idx + width];
                sum += lap.abs() as f64;
            }
        }

        sum / ((width - 2) * (height - 2)) as f64
    }

    pub fn analyze(&self, frame: &VideoFrame) -> f64 {
        clamp_score(Self::edge_energy(frame) / self.normalization * 100.0)
    }
}
