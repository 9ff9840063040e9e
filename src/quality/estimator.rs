use super::{BrightnessAnalyzer, ContrastAnalyzer, SharpnessAnalyzer};
use crate::errors::CaptureError;
use crate::types::VideoFrame;
use serde::{Deserialize, Serialize};

/// Per-frame quality scores, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub brightness: u8,
    pub contrast: u8,
    pub sharpness: u8,
    pub overall: u8,
    /// Share of the frame covered by the detected face, when a detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_size: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            QualityGrade::Good
        } else if score >= 60 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }
}

/// Hint shown to the subject when the frame is not good enough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guidance {
    MoveToBrighterPlace,
    HoldStill,
    IncreaseBackgroundContrast,
}

impl Guidance {
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::MoveToBrighterPlace => "Move to a brighter place",
            Guidance::HoldStill => "Hold the camera steady and stay still",
            Guidance::IncreaseBackgroundContrast => "Use a background that contrasts with your face",
        }
    }
}

const GUIDANCE_CUTOFF: u8 = 60;

impl QualityMetrics {
    pub fn grade(&self) -> QualityGrade {
        QualityGrade::from_score(self.overall)
    }

    pub fn meets(&self, threshold: u8) -> bool {
        self.overall >= threshold
    }

    /// Hints for the weak sub-scores. Empty once the overall score clears `threshold`.
    pub fn guidance(&self, threshold: u8) -> Vec<Guidance> {
        if self.meets(threshold) {
            return Vec::new();
        }
        let mut hints = Vec::new();
        if self.brightness < GUIDANCE_CUTOFF {
            hints.push(Guidance::MoveToBrighterPlace);
        }
        if self.sharpness < GUIDANCE_CUTOFF {
            hints.push(Guidance::HoldStill);
        }
        if self.contrast < GUIDANCE_CUTOFF {
            hints.push(Guidance::IncreaseBackgroundContrast);
        }
        hints
    }
}

/// Tunable estimator constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub brightness_low: f64,
    pub brightness_high: f64,
    pub contrast_normalization: f64,
    pub sharpness_normalization: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            brightness_low: 80.0,
            brightness_high: 200.0,
            contrast_normalization: 50.0,
            sharpness_normalization: 50.0,
        }
    }
}

/// Composite quality estimator
#[derive(Debug, Clone, Default)]
pub struct QualityEstimator {
    brightness: BrightnessAnalyzer,
    contrast: ContrastAnalyzer,
    sharpness: SharpnessAnalyzer,
}

impl QualityEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            brightness: BrightnessAnalyzer::new(config.brightness_low, config.brightness_high),
            contrast: ContrastAnalyzer::new(config.contrast_normalization),
            sharpness: SharpnessAnalyzer::new(config.sharpness_normalization),
        }
    }

    /// Score a single frame. Fails on frames with no pixels or a short buffer.
    pub fn analyze(&self, frame: &VideoFrame) -> Result<QualityMetrics, CaptureError> {
        if !frame.is_ready() {
            return Err(CaptureError::QualitySampling(format!(
                "frame not ready: {}x{} with {} bytes",
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }

        let brightness = self.brightness.analyze(frame);
        let contrast = self.contrast.analyze(frame);
        let sharpness = self.sharpness.analyze(frame);
        let overall = (brightness + contrast + sharpness) / 3.0;

        Ok(QualityMetrics {
            brightness: brightness.round() as u8,
            contrast: contrast.round() as u8,
            sharpness: sharpness.round() as u8,
            overall: overall.round() as u8,
            face_size: None,
        })
    }

    pub fn analyze_image(&self, image: &image::RgbImage) -> Result<QualityMetrics, CaptureError> {
        self.analyze(&VideoFrame::from_rgb_image(image.clone()))
    }
}
