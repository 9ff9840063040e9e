//! CrabCapture: quality-gated auto-capture for face and skin photography
//!
//! Owns a camera stream, samples frames on a timer to estimate brightness,
//! contrast and sharpness, and when an external face detector reports a
//! stable face at sufficient quality runs a countdown and captures a mirrored
//! JPEG still for upload to an analysis backend.
//!
//! # Usage
//! ```rust,ignore
//! use crabcapture::{CaptureController, ControllerSettings};
//! use crabcapture::platform::NativeCameraSource;
//!
//! let controller = CaptureController::new(NativeCameraSource::default(), ControllerSettings::default());
//! controller.on_capture(|image| upload(&image.data, &image.metadata));
//! controller.start().await?;
//! // feed detector readings
//! controller.on_face_presence(true, true);
//! ```
pub mod config;
pub mod errors;
pub mod platform;
pub mod quality;
pub mod session;
pub mod source;
pub mod testing;
pub mod types;

// Re-exports for convenience
pub use config::{ControllerSettings, CrabCaptureConfig};
pub use errors::{CaptureError, MediaAccessKind};
pub use quality::{Guidance, QualityEstimator, QualityGrade, QualityMetrics};
pub use session::CaptureController;
pub use source::{FacePresenceSource, MediaSource, VideoStream};
pub use types::{
    CaptureMetadata, CaptureState, CapturedImage, FaceBox, FacePresence, Phase, Resolution,
    VideoConstraints, VideoFrame,
};

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabcapture=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        native_camera: cfg!(feature = "native"),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub native_camera: bool,
}
