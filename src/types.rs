//! Core data types shared by the controller, the estimator and media sources.

use crate::errors::CaptureError;
use crate::quality::QualityMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete phase of the capture state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Detecting,
    Preparing,
    Countdown,
    Capturing,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Detecting => "detecting",
            Phase::Preparing => "preparing",
            Phase::Countdown => "countdown",
            Phase::Capturing => "capturing",
            Phase::Complete => "complete",
        }
    }

    /// User-facing status line for this phase.
    pub fn status_message(&self, countdown: Option<u32>) -> String {
        match self {
            Phase::Idle => "Position your face in the frame".to_string(),
            Phase::Detecting => "Detecting face".to_string(),
            Phase::Preparing => "Ready to capture".to_string(),
            Phase::Countdown => match countdown {
                Some(n) => format!("Capturing in {}s", n),
                None => "Capturing shortly".to_string(),
            },
            Phase::Capturing => "Capturing".to_string(),
            Phase::Complete => "Capture complete".to_string(),
        }
    }

    /// A capture sequence is in flight and must finish or be cancelled first.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Countdown | Phase::Capturing | Phase::Complete)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of a capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CaptureState {
    pub phase: Phase,
    /// Seconds remaining; only `Some` while `phase == Countdown`
    pub countdown: Option<u32>,
    pub face_stable: bool,
    /// Last known overall quality, 0-100
    pub quality_score: u8,
    /// Quality at or above threshold and a stable face
    pub can_capture: bool,
}

impl CaptureState {
    pub fn status_message(&self) -> String {
        self.phase.status_message(self.countdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

/// Stream request passed to a [`MediaSource`](crate::source::MediaSource)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal: Resolution,
    pub min: Resolution,
    pub frame_rate: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal: Resolution::new(1280, 720),
            min: Resolution::new(640, 480),
            frame_rate: 30,
        }
    }
}

/// One reading from an external face detector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FacePresence {
    pub present: bool,
    pub stable: bool,
    pub face_box: Option<FaceBox>,
}

impl FacePresence {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn stable() -> Self {
        Self {
            present: true,
            stable: true,
            face_box: None,
        }
    }

    pub fn unstable() -> Self {
        Self {
            present: true,
            stable: false,
            face_box: None,
        }
    }

    pub fn with_face_box(mut self, face_box: FaceBox) -> Self {
        self.face_box = Some(face_box);
        self
    }
}

/// Face bounding box in normalised frame coordinates (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Percentage of the frame covered by the box, 0-100.
    pub fn coverage_percent(&self) -> u8 {
        let area = self.width.clamp(0.0, 1.0) * self.height.clamp(0.0, 1.0);
        (area * 100.0).round() as u8
    }
}

/// Raw RGB8 frame pulled from a video stream
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Frame with no pixels, as reported by a stream that is not ready yet.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Non-zero dimensions backed by a complete RGB8 buffer.
    pub fn is_ready(&self) -> bool {
        self.pixel_count() > 0 && self.data.len() >= self.pixel_count() * 3
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if !self.is_ready() {
            return None;
        }
        let len = self.pixel_count() * 3;
        image::RgbImage::from_raw(self.width, self.height, self.data[..len].to_vec())
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }
}

/// Metadata handed to the caller alongside the encoded still
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub quality: QualityMetrics,
    pub timestamp: DateTime<Utc>,
    pub resolution: Resolution,
    pub mirrored: bool,
}

/// JPEG-encoded still produced by a successful capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub id: String,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub metadata: CaptureMetadata,
}

impl CapturedImage {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Decode the JPEG payload back into pixels.
    pub fn decode(&self) -> Result<image::DynamicImage, CaptureError> {
        image::load_from_memory_with_format(&self.data, image::ImageFormat::Jpeg)
            .map_err(|e| CaptureError::Encoding(format!("Failed to decode capture: {}", e)))
    }

    pub fn metadata_json(&self) -> Result<String, CaptureError> {
        serde_json::to_string(&self.metadata)
            .map_err(|e| CaptureError::Encoding(format!("Failed to serialize metadata: {}", e)))
    }
}
