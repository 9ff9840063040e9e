//! Configuration management for CrabCapture
//!
//! TOML-backed settings for the camera request, quality gating and the
//! capture sequence, plus conversion into the runtime [`ControllerSettings`].

use crate::errors::CaptureError;
use crate::quality::EstimatorConfig;
use crate::types::{FacingMode, Resolution, VideoConstraints};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CrabCaptureConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Camera request configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Preferred resolution [width, height]
    pub ideal_resolution: [u32; 2],
    /// Smallest acceptable resolution [width, height]
    pub min_resolution: [u32; 2],
    pub frame_rate: u32,
    pub facing_mode: FacingMode,
    /// How long to wait for stream metadata before giving up
    pub init_timeout_ms: u64,
}

/// Quality gating configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Periodically sample frames for quality
    pub enabled: bool,
    /// Minimum overall score (0-100) required to auto-capture
    pub threshold: u8,
    pub sample_interval_ms: u64,
    pub brightness_low: f64,
    pub brightness_high: f64,
    pub contrast_normalization: f64,
    pub sharpness_normalization: f64,
}

/// Capture sequence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Start the countdown automatically once quality and stability line up
    pub auto_capture: bool,
    pub countdown_secs: u32,
    /// Delay after a capture before the session returns to idle
    pub cooldown_ms: u64,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Flip horizontally so the still matches the mirrored preview
    pub mirror: bool,
    /// Poll interval for an attached face detector
    pub presence_interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_resolution: [1280, 720],
            min_resolution: [640, 480],
            frame_rate: 30,
            facing_mode: FacingMode::User,
            init_timeout_ms: 10_000,
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        let estimator = EstimatorConfig::default();
        Self {
            enabled: true,
            threshold: 70,
            sample_interval_ms: 1000,
            brightness_low: estimator.brightness_low,
            brightness_high: estimator.brightness_high,
            contrast_normalization: estimator.contrast_normalization,
            sharpness_normalization: estimator.sharpness_normalization,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            auto_capture: true,
            countdown_secs: 3,
            cooldown_ms: 2000,
            jpeg_quality: 95,
            mirror: true,
            presence_interval_ms: 500,
        }
    }
}

impl CrabCaptureConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: CrabCaptureConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CaptureError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = self.to_toml()?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CaptureError> {
        toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabcapture.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), CaptureError> {
        let invalid = |msg: &str| Err(CaptureError::Config(msg.to_string()));

        let [w, h] = self.camera.ideal_resolution;
        if w == 0 || h == 0 {
            return invalid("Invalid ideal resolution");
        }
        let [min_w, min_h] = self.camera.min_resolution;
        if min_w > w || min_h > h {
            return invalid("Minimum resolution exceeds ideal resolution");
        }
        if self.camera.frame_rate == 0 || self.camera.frame_rate > 240 {
            return invalid("Invalid frame rate (must be 1-240)");
        }
        if self.camera.init_timeout_ms == 0 {
            return invalid("Init timeout must be non-zero");
        }

        if self.quality.threshold > 100 {
            return invalid("Quality threshold must be between 0 and 100");
        }
        if self.quality.sample_interval_ms == 0 {
            return invalid("Sample interval must be non-zero");
        }
        if !(0.0..255.0).contains(&self.quality.brightness_low)
            || self.quality.brightness_high <= self.quality.brightness_low
            || self.quality.brightness_high >= 255.0
        {
            return invalid("Brightness band must satisfy 0 <= low < high < 255");
        }
        if self.quality.contrast_normalization <= 0.0 || self.quality.sharpness_normalization <= 0.0
        {
            return invalid("Normalization constants must be positive");
        }

        if self.capture.countdown_secs == 0 || self.capture.countdown_secs > 60 {
            return invalid("Countdown must be between 1 and 60 seconds");
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return invalid("JPEG quality must be between 1 and 100");
        }
        if self.capture.presence_interval_ms == 0 {
            return invalid("Presence interval must be non-zero");
        }

        Ok(())
    }

    /// Runtime settings for a [`CaptureController`](crate::session::CaptureController).
    pub fn settings(&self) -> ControllerSettings {
        ControllerSettings {
            constraints: VideoConstraints {
                facing_mode: self.camera.facing_mode,
                ideal: Resolution::new(
                    self.camera.ideal_resolution[0],
                    self.camera.ideal_resolution[1],
                ),
                min: Resolution::new(self.camera.min_resolution[0], self.camera.min_resolution[1]),
                frame_rate: self.camera.frame_rate,
            },
            init_timeout: Duration::from_millis(self.camera.init_timeout_ms),
            quality_threshold: self.quality.threshold,
            sampling_enabled: self.quality.enabled,
            sample_interval: Duration::from_millis(self.quality.sample_interval_ms),
            estimator: EstimatorConfig {
                brightness_low: self.quality.brightness_low,
                brightness_high: self.quality.brightness_high,
                contrast_normalization: self.quality.contrast_normalization,
                sharpness_normalization: self.quality.sharpness_normalization,
            },
            auto_capture: self.capture.auto_capture,
            countdown_secs: self.capture.countdown_secs,
            cooldown: Duration::from_millis(self.capture.cooldown_ms),
            jpeg_quality: self.capture.jpeg_quality,
            mirror: self.capture.mirror,
            presence_interval: Duration::from_millis(self.capture.presence_interval_ms),
        }
    }
}

/// Runtime knobs consumed by the capture controller
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub constraints: VideoConstraints,
    pub init_timeout: Duration,
    pub quality_threshold: u8,
    pub sampling_enabled: bool,
    pub sample_interval: Duration,
    pub estimator: EstimatorConfig,
    pub auto_capture: bool,
    pub countdown_secs: u32,
    pub cooldown: Duration,
    pub jpeg_quality: u8,
    pub mirror: bool,
    pub presence_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        CrabCaptureConfig::default().settings()
    }
}

/// Shortest period accepted for the sampler and presence polling tasks.
pub const MIN_TASK_INTERVAL: Duration = Duration::from_millis(10);

impl ControllerSettings {
    /// Clamp values the timer tasks cannot run with. Settings built from a
    /// validated [`CrabCaptureConfig`] pass through unchanged.
    pub fn sanitized(mut self) -> Self {
        for (name, interval) in [
            ("sample_interval", &mut self.sample_interval),
            ("presence_interval", &mut self.presence_interval),
        ] {
            if *interval < MIN_TASK_INTERVAL {
                log::warn!(
                    "{} of {:?} is too short, using {:?}",
                    name,
                    interval,
                    MIN_TASK_INTERVAL
                );
                *interval = MIN_TASK_INTERVAL;
            }
        }
        self.quality_threshold = self.quality_threshold.min(100);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }
}
