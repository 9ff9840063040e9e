//! In-memory media and presence sources.

use crate::errors::CaptureError;
use crate::source::{FacePresenceSource, MediaSource, VideoStream};
use crate::types::{FacePresence, Resolution, VideoConstraints, VideoFrame};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireOutcome {
    Grant,
    Deny,
    NoDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    After(Duration),
    Never,
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    stopped: AtomicUsize,
    frames_read: AtomicUsize,
}

/// Media source serving a replaceable in-memory frame.
///
/// Clones share the frame and the counters, so a test can keep one clone
/// while the controller owns another.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    outcome: AcquireOutcome,
    readiness: Readiness,
    frame_delay: Duration,
    frame: Arc<Mutex<VideoFrame>>,
    counters: Arc<Counters>,
}

impl SyntheticSource {
    pub fn new(frame: VideoFrame) -> Self {
        Self {
            outcome: AcquireOutcome::Grant,
            readiness: Readiness::After(Duration::ZERO),
            frame_delay: Duration::ZERO,
            frame: Arc::new(Mutex::new(frame)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Source whose permission prompt is always refused.
    pub fn denied() -> Self {
        Self {
            outcome: AcquireOutcome::Deny,
            ..Self::new(VideoFrame::empty())
        }
    }

    pub fn no_device() -> Self {
        Self {
            outcome: AcquireOutcome::NoDevice,
            ..Self::new(VideoFrame::empty())
        }
    }

    pub fn with_ready_delay(mut self, delay: Duration) -> Self {
        self.readiness = Readiness::After(delay);
        self
    }

    /// Every frame read blocks the calling thread for `delay`, like a device
    /// waiting on its next frame.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Stream metadata never arrives.
    pub fn never_ready(mut self) -> Self {
        self.readiness = Readiness::Never;
        self
    }

    pub fn set_frame(&self, frame: VideoFrame) {
        *self.frame.lock().unwrap_or_else(|e| e.into_inner()) = frame;
    }

    pub fn acquire_count(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.counters.stopped.load(Ordering::SeqCst)
    }

    pub fn frames_read(&self) -> usize {
        self.counters.frames_read.load(Ordering::SeqCst)
    }
}

impl MediaSource for SyntheticSource {
    type Stream = SyntheticStream;

    async fn acquire(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<SyntheticStream, CaptureError> {
        match self.outcome {
            AcquireOutcome::Deny => Err(CaptureError::permission_denied(
                "camera permission was denied",
            )),
            AcquireOutcome::NoDevice => Err(CaptureError::no_device(format!(
                "no {:?}-facing camera found",
                constraints.facing_mode
            ))),
            AcquireOutcome::Grant => {
                self.counters.acquired.fetch_add(1, Ordering::SeqCst);
                Ok(SyntheticStream {
                    readiness: self.readiness,
                    frame_delay: self.frame_delay,
                    frame: self.frame.clone(),
                    counters: self.counters.clone(),
                    stopped: AtomicBool::new(false),
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct SyntheticStream {
    readiness: Readiness,
    frame_delay: Duration,
    frame: Arc<Mutex<VideoFrame>>,
    counters: Arc<Counters>,
    stopped: AtomicBool,
}

impl VideoStream for SyntheticStream {
    async fn wait_ready(&self) -> Result<Resolution, CaptureError> {
        match self.readiness {
            Readiness::Never => std::future::pending().await,
            Readiness::After(delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
        let frame = self.frame.lock().unwrap_or_else(|e| e.into_inner());
        Ok(frame.resolution())
    }

    fn current_frame(&self) -> Result<VideoFrame, CaptureError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CaptureError::Capture("stream stopped".to_string()));
        }
        if !self.frame_delay.is_zero() {
            std::thread::sleep(self.frame_delay);
        }
        self.counters.frames_read.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Presence source replaying a fixed script; the last reading repeats.
#[derive(Debug, Clone)]
pub struct ScriptedPresence {
    script: VecDeque<FacePresence>,
    last: FacePresence,
}

impl ScriptedPresence {
    pub fn new(script: impl IntoIterator<Item = FacePresence>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: FacePresence::absent(),
        }
    }
}

impl FacePresenceSource for ScriptedPresence {
    async fn detect(&mut self, _frame: &VideoFrame) -> Result<FacePresence, CaptureError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last)
    }
}
