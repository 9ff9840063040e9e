//! Local contrast from horizontally adjacent pixels.

use super::clamp_score;
use crate::types::VideoFrame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastAnalyzer {
    /// Mean neighbour difference that maps to a score of 100
    pub normalization: f64,
}

impl Default for ContrastAnalyzer {
    fn default() -> Self {
        Self { normalization: 50.0 }
    }
}

impl ContrastAnalyzer {
    pub fn new(normalization: f64) -> Self {
        Self { normalization }
    }

    /// Mean absolute difference of channel-mean intensity between each pixel
    /// and its right-hand neighbour.
    pub fn mean_neighbor_difference(frame: &VideoFrame) -> f64 {
        let width = frame.width as usize;
        let height = frame.height as usize;
        if width < 2 || height == 0 || !frame.is_ready() {
            return 0.0;
        }

        let intensity = |idx: usize| -> f64 {
            let px = &frame.data[idx * 3..idx * 3 + 3];
            (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0
        };

        let mut sum = 0.0;
        for y in 0..height {
            let row = y * width;
            let mut prev = intensity(row);
            for x in 1..width {
                let current = intensity(row + x);
                sum += (current - prev).abs();
                prev = current;
            }
        }

        sum / (height * (width - 1)) as f64
    }

    pub fn analyze(&self, frame: &VideoFrame) -> f64 {
        clamp_score(Self::mean_neighbor_difference(frame) / self.normalization * 100.0)
    }
}
