//! Camera backend built on nokhwa.

use crate::errors::CaptureError;
use crate::source::{MediaSource, VideoStream};
use crate::types::{FacingMode, Resolution, VideoConstraints, VideoFrame};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution as NokhwaResolution,
    },
    CallbackCamera, NokhwaError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Local camera selected by index
#[derive(Debug, Clone)]
pub struct NativeCameraSource {
    device_index: u32,
}

impl NativeCameraSource {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl Default for NativeCameraSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MediaSource for NativeCameraSource {
    type Stream = NativeStream;

    async fn acquire(&mut self, constraints: &VideoConstraints) -> Result<NativeStream, CaptureError> {
        let index = self.device_index;
        let constraints = constraints.clone();
        tokio::task::spawn_blocking(move || open_camera(index, &constraints))
            .await
            .map_err(|e| CaptureError::backend(format!("Task join error: {}", e)))?
    }
}

fn open_camera(index: u32, constraints: &VideoConstraints) -> Result<NativeStream, CaptureError> {
    let devices = query(ApiBackend::Auto).map_err(map_nokhwa_error)?;
    if devices.is_empty() {
        return Err(CaptureError::no_device("no cameras found"));
    }
    if constraints.facing_mode != FacingMode::User {
        log::debug!("Facing mode {:?} ignored by desktop backend", constraints.facing_mode);
    }

    let format = CameraFormat::new(
        NokhwaResolution::new(constraints.ideal.width, constraints.ideal.height),
        FrameFormat::MJPEG,
        constraints.frame_rate,
    );
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

    let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested, |_| {})
        .map_err(map_nokhwa_error)?;
    camera.open_stream().map_err(map_nokhwa_error)?;

    log::info!("Opened camera {} ({} found)", index, devices.len());
    Ok(NativeStream {
        camera: Arc::new(Mutex::new(camera)),
        min: constraints.min,
        stopped: AtomicBool::new(false),
    })
}

fn map_nokhwa_error(error: NokhwaError) -> CaptureError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        return CaptureError::permission_denied(message);
    }
    match error {
        NokhwaError::OpenDeviceError(..) => CaptureError::no_device(message),
        _ => CaptureError::backend(message),
    }
}

pub struct NativeStream {
    camera: Arc<Mutex<CallbackCamera>>,
    min: Resolution,
    stopped: AtomicBool,
}

fn poll_frame(camera: &Mutex<CallbackCamera>) -> Result<VideoFrame, CaptureError> {
    let mut camera = camera
        .lock()
        .map_err(|_| CaptureError::Capture("Failed to lock camera".to_string()))?;
    let buffer = camera
        .poll_frame()
        .map_err(|e| CaptureError::Capture(format!("Failed to capture frame: {}", e)))?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CaptureError::Capture(format!("Failed to decode frame: {}", e)))?;
    let (width, height) = (decoded.width(), decoded.height());
    Ok(VideoFrame::new(decoded.into_raw(), width, height))
}

impl VideoStream for NativeStream {
    async fn wait_ready(&self) -> Result<Resolution, CaptureError> {
        loop {
            let camera = self.camera.clone();
            let frame = tokio::task::spawn_blocking(move || poll_frame(&camera))
                .await
                .map_err(|e| CaptureError::backend(format!("Task join error: {}", e)))?;

            match frame {
                Ok(frame) if frame.is_ready() => {
                    let resolution = frame.resolution();
                    if resolution.width < self.min.width || resolution.height < self.min.height {
                        log::warn!(
                            "Camera delivered {} below requested minimum {}",
                            resolution,
                            self.min
                        );
                    }
                    return Ok(resolution);
                }
                Ok(_) => {}
                Err(e) => log::debug!("Waiting for first frame: {}", e),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Blocks until nokhwa hands over the next frame.
    fn current_frame(&self) -> Result<VideoFrame, CaptureError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CaptureError::Capture("stream stopped".to_string()));
        }
        poll_frame(&self.camera)
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.camera.lock() {
            Ok(mut camera) => {
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop camera stream: {}", e);
                }
            }
            Err(_) => log::warn!("Camera lock poisoned while stopping stream"),
        }
    }
}
