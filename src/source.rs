//! Capabilities the capture controller depends on.
//!
//! A [`MediaSource`] hands out a [`VideoStream`]; a [`FacePresenceSource`]
//! wraps whatever face detector the application uses. Neither is implemented
//! by the controller itself.

use crate::errors::CaptureError;
use crate::types::{FacePresence, Resolution, VideoConstraints, VideoFrame};
use std::future::Future;

/// Something that can open a camera stream.
pub trait MediaSource: Send + 'static {
    type Stream: VideoStream;

    /// Request a stream. Permission and device failures map to
    /// [`CaptureError::MediaAccess`].
    fn acquire(
        &mut self,
        constraints: &VideoConstraints,
    ) -> impl Future<Output = Result<Self::Stream, CaptureError>> + Send;
}

/// A live stream owned exclusively by one controller.
///
/// The controller shares the stream with blocking worker threads, so methods
/// take `&self` and implementations use interior mutability.
pub trait VideoStream: Send + Sync + 'static {
    /// Resolves once the stream reports its dimensions.
    fn wait_ready(&self) -> impl Future<Output = Result<Resolution, CaptureError>> + Send;

    /// Current frame. May block until the device delivers one, so callers run
    /// it off the async runtime. A stream that is not producing yet returns a
    /// frame with zero dimensions rather than an error.
    fn current_frame(&self) -> Result<VideoFrame, CaptureError>;

    /// Stop all tracks. Repeated calls are no-ops.
    fn stop(&self);
}

/// External face detector polled by the controller.
pub trait FacePresenceSource: Send + 'static {
    fn detect(
        &mut self,
        frame: &VideoFrame,
    ) -> impl Future<Output = Result<FacePresence, CaptureError>> + Send;
}
