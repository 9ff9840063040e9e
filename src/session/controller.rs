use super::tasks::{run_cooldown, run_countdown, run_presence, run_sampler, Timers};
use crate::config::ControllerSettings;
use crate::errors::CaptureError;
use crate::quality::{Guidance, QualityEstimator, QualityMetrics};
use crate::source::{FacePresenceSource, MediaSource, VideoStream};
use crate::types::{
    CaptureMetadata, CaptureState, CapturedImage, FaceBox, Phase, Resolution, VideoFrame,
};
use image::codecs::jpeg::JpegEncoder;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

pub type CaptureCallback = Arc<dyn Fn(&CapturedImage) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&CaptureError) + Send + Sync>;

/// Outcome of one countdown second.
pub(crate) enum Tick {
    Continue,
    Fire,
    Stale,
}

struct Core<T> {
    state: CaptureState,
    metrics: QualityMetrics,
    /// Shared with blocking frame reads; never read under the lock
    stream: Option<Arc<T>>,
    resolution: Option<Resolution>,
    timers: Timers,
    /// Bumped by `stop()`; session-scoped tasks and pending starts compare against it
    epoch: u64,
    /// Bumped whenever a capture sequence starts or is cancelled
    sequence: u64,
    /// Single-use token set when a countdown expires, consumed by `capture_photo`
    capture_armed: bool,
    starting: bool,
}

impl<T> Core<T> {
    fn new() -> Self {
        Self {
            state: CaptureState::default(),
            metrics: QualityMetrics::default(),
            stream: None,
            resolution: None,
            timers: Timers::default(),
            epoch: 0,
            sequence: 0,
            capture_armed: false,
            starting: false,
        }
    }

    fn refresh_can_capture(&mut self, threshold: u8) {
        self.state.can_capture = self.state.face_stable && self.metrics.meets(threshold);
    }
}

pub(crate) struct Inner<S: MediaSource> {
    settings: ControllerSettings,
    estimator: QualityEstimator,
    source: tokio::sync::Mutex<S>,
    core: Mutex<Core<S::Stream>>,
    state_tx: watch::Sender<CaptureState>,
    on_capture: Mutex<Option<CaptureCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
}

/// Drives one camera session through detection, countdown and capture.
///
/// All timers run as tokio tasks; the controller must be used from within a
/// tokio runtime. Dropping it releases the camera.
pub struct CaptureController<S: MediaSource> {
    inner: Arc<Inner<S>>,
}

impl<S: MediaSource> CaptureController<S> {
    pub fn new(source: S, settings: ControllerSettings) -> Self {
        let settings = settings.sanitized();
        let (state_tx, _) = watch::channel(CaptureState::default());
        Self {
            inner: Arc::new(Inner {
                estimator: QualityEstimator::new(settings.estimator),
                settings,
                source: tokio::sync::Mutex::new(source),
                core: Mutex::new(Core::new()),
                state_tx,
                on_capture: Mutex::new(None),
                on_error: Mutex::new(None),
            }),
        }
    }

    /// Register the callback invoked once per successful capture.
    pub fn on_capture<F>(&self, callback: F)
    where
        F: Fn(&CapturedImage) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_capture) = Some(Arc::new(callback));
    }

    /// Register the callback invoked on camera and capture failures.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&CaptureError) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_error) = Some(Arc::new(callback));
    }

    /// Acquire the camera and begin quality sampling.
    pub async fn start(&self) -> Result<Resolution, CaptureError> {
        self.inner.start().await
    }

    /// Release the camera and cancel every pending timer. Safe to call repeatedly.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn on_face_presence(&self, present: bool, stable: bool) {
        self.inner.on_face_presence(present, stable);
    }

    pub fn on_face_lost(&self) {
        self.inner.on_face_lost();
    }

    pub fn update_face_box(&self, face_box: FaceBox) {
        self.inner.update_face_box(face_box);
    }

    /// Record a quality sample produced outside the built-in sampler.
    pub fn update_quality(&self, metrics: QualityMetrics) {
        self.inner.record_quality(None, metrics);
    }

    /// Start a countdown on request, provided the face is stable and quality
    /// is sufficient. Returns whether a countdown was started.
    pub fn manual_capture(&self) -> bool {
        self.inner.manual_capture()
    }

    /// Capture the current frame. Only acts once per expired countdown; any
    /// other call returns `Ok(None)` and emits nothing.
    pub async fn capture_photo(&self) -> Result<Option<CapturedImage>, CaptureError> {
        self.inner.capture_photo().await
    }

    /// Poll `detector` for face presence while the session runs.
    pub fn attach_presence_source<P: FacePresenceSource>(
        &self,
        detector: P,
    ) -> Result<(), CaptureError> {
        self.inner.attach_presence_source(detector)
    }

    pub fn state(&self) -> CaptureState {
        self.inner.core().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.core().state.phase
    }

    pub fn metrics(&self) -> QualityMetrics {
        self.inner.core().metrics
    }

    pub fn guidance(&self) -> Vec<Guidance> {
        self.metrics().guidance(self.inner.settings.quality_threshold)
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.inner.core().resolution
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.core().stream.is_some()
    }

    /// Number of timer or polling tasks currently held.
    pub fn active_timers(&self) -> usize {
        self.inner.core().timers.active()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.inner.state_tx.subscribe()
    }
}

impl<S: MediaSource> Drop for CaptureController<S> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

/// Read a frame on the blocking pool so device I/O never stalls a runtime worker.
async fn read_frame<T: VideoStream>(stream: Arc<T>) -> Result<VideoFrame, CaptureError> {
    tokio::task::spawn_blocking(move || stream.current_frame())
        .await
        .map_err(|e| CaptureError::Capture(format!("Frame task join error: {}", e)))?
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State stays consistent across a panicking callback since callbacks run
    // outside the lock.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: MediaSource> Inner<S> {
    fn core(&self) -> MutexGuard<'_, Core<S::Stream>> {
        lock(&self.core)
    }

    fn publish(&self, core: &Core<S::Stream>) {
        self.state_tx.send_replace(core.state.clone());
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        let core = self.core();
        core.epoch == epoch && core.stream.is_some()
    }

    async fn start(self: &Arc<Self>) -> Result<Resolution, CaptureError> {
        let epoch = {
            let mut core = self.core();
            if core.stream.is_some() || core.starting {
                return Err(CaptureError::AlreadyStarted);
            }
            core.starting = true;
            core.epoch
        };

        log::info!(
            "Starting capture session: {:?} camera, ideal {} @ {}fps",
            self.settings.constraints.facing_mode,
            self.settings.constraints.ideal,
            self.settings.constraints.frame_rate
        );

        let opened = self.open_stream().await;

        let mut core = self.core();
        core.starting = false;

        let (stream, resolution) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                drop(core);
                log::error!("Failed to start capture session: {}", e);
                self.notify_error(&e);
                return Err(e);
            }
        };

        if core.epoch != epoch {
            drop(core);
            stream.stop();
            log::info!("Capture session start cancelled by stop()");
            return Err(CaptureError::Cancelled);
        }

        core.stream = Some(Arc::new(stream));
        core.resolution = Some(resolution);
        core.state.phase = Phase::Detecting;

        if self.settings.sampling_enabled {
            let task = run_sampler(Arc::downgrade(self), epoch, self.settings.sample_interval);
            core.timers.sampler = Some(tokio::spawn(task));
        }

        self.publish(&core);
        log::info!("Capture session started at {}", resolution);
        Ok(resolution)
    }

    async fn open_stream(&self) -> Result<(S::Stream, Resolution), CaptureError> {
        let stream = {
            let mut source = self.source.lock().await;
            source.acquire(&self.settings.constraints).await?
        };

        let timeout = self.settings.init_timeout;
        let ready = tokio::time::timeout(timeout, stream.wait_ready()).await;
        match ready {
            Ok(Ok(resolution)) => Ok((stream, resolution)),
            Ok(Err(e)) => {
                stream.stop();
                Err(e)
            }
            Err(_) => {
                stream.stop();
                Err(CaptureError::InitializationTimeout(timeout))
            }
        }
    }

    fn stop(&self) {
        let stream = {
            let mut core = self.core();
            core.epoch += 1;
            core.sequence += 1;
            core.timers.cancel_all();
            core.capture_armed = false;
            core.resolution = None;
            core.state = CaptureState::default();
            core.metrics = QualityMetrics::default();
            let stream = core.stream.take();
            self.publish(&core);
            stream
        };

        if let Some(stream) = stream {
            stream.stop();
            log::info!("Capture session stopped, camera released");
        }
    }

    /// Take one quality sample. Returns false once the task is stale.
    pub(crate) async fn sample_quality(self: &Arc<Self>, epoch: u64) -> bool {
        let stream = {
            let core = self.core();
            if core.epoch != epoch {
                return false;
            }
            if core.state.phase == Phase::Capturing {
                return true;
            }
            match core.stream.as_ref() {
                Some(stream) => Arc::clone(stream),
                None => return false,
            }
        };

        let estimator = self.estimator.clone();
        let metrics = tokio::task::spawn_blocking(move || {
            stream
                .current_frame()
                .and_then(|frame| estimator.analyze(&frame))
        })
        .await
        .map_err(|e| CaptureError::QualitySampling(format!("Sampling task join error: {}", e)))
        .and_then(|result| result);

        match metrics {
            Ok(metrics) => {
                log::debug!(
                    "Quality sample: overall={} (brightness={}, contrast={}, sharpness={})",
                    metrics.overall,
                    metrics.brightness,
                    metrics.contrast,
                    metrics.sharpness
                );
                self.record_quality(Some(epoch), metrics);
            }
            Err(e) => log::debug!("Quality sample skipped, keeping previous score: {}", e),
        }
        true
    }

    pub(crate) fn record_quality(self: &Arc<Self>, epoch: Option<u64>, metrics: QualityMetrics) {
        let mut core = self.core();
        if epoch.is_some_and(|epoch| epoch != core.epoch) {
            return;
        }
        let face_size = core.metrics.face_size;
        core.metrics = QualityMetrics {
            face_size,
            ..metrics
        };
        if core.state.phase != Phase::Complete {
            core.state.quality_score = metrics.overall;
        }
        core.refresh_can_capture(self.settings.quality_threshold);
        if core.stream.is_some() {
            self.apply_gate(&mut core);
        }
        self.publish(&core);
    }

    pub(crate) fn on_face_presence(self: &Arc<Self>, present: bool, stable: bool) {
        if !present {
            self.on_face_lost();
            return;
        }

        let mut core = self.core();
        if core.stream.is_none() {
            log::debug!("Face presence ignored, session not started");
            return;
        }

        if core.state.phase == Phase::Idle {
            core.state.phase = Phase::Detecting;
        }
        core.state.face_stable = stable;
        core.refresh_can_capture(self.settings.quality_threshold);
        self.apply_gate(&mut core);
        self.publish(&core);
    }

    pub(crate) fn on_face_lost(&self) {
        let mut core = self.core();
        if core.state.phase == Phase::Countdown {
            // Cancel before touching state so the timer cannot fire afterwards.
            core.sequence += 1;
            core.timers.cancel_countdown();
            core.capture_armed = false;

            core.state.phase = Phase::Idle;
            core.state.countdown = None;
            core.state.face_stable = false;
            core.state.can_capture = false;
            log::info!("Face lost during countdown, capture cancelled");
        } else {
            core.state.face_stable = false;
            core.state.can_capture = false;
            if core.state.phase == Phase::Preparing {
                core.state.phase = Phase::Detecting;
            }
        }
        self.publish(&core);
    }

    pub(crate) fn update_face_box(&self, face_box: FaceBox) {
        self.core().metrics.face_size = Some(face_box.coverage_percent());
    }

    fn manual_capture(self: &Arc<Self>) -> bool {
        let mut core = self.core();
        if core.stream.is_none() || core.state.phase.is_busy() {
            return false;
        }
        if !(core.state.face_stable && core.state.can_capture) {
            return false;
        }
        self.begin_countdown(&mut core);
        self.publish(&core);
        true
    }

    /// Move between detecting, preparing and countdown from the current
    /// stability and quality readings.
    fn apply_gate(self: &Arc<Self>, core: &mut Core<S::Stream>) {
        if core.state.phase.is_busy() {
            return;
        }
        if core.state.can_capture {
            if self.settings.auto_capture {
                self.begin_countdown(core);
            } else {
                core.state.phase = Phase::Preparing;
            }
        } else if core.state.phase == Phase::Preparing {
            core.state.phase = Phase::Detecting;
        }
    }

    fn begin_countdown(self: &Arc<Self>, core: &mut Core<S::Stream>) {
        core.sequence += 1;
        let sequence = core.sequence;
        core.timers.cancel_countdown();
        core.state.phase = Phase::Countdown;
        core.state.countdown = Some(self.settings.countdown_secs);
        core.timers.countdown = Some(tokio::spawn(run_countdown(Arc::downgrade(self), sequence)));
        log::info!(
            "Face stable at quality {}, capturing in {}s",
            core.metrics.overall,
            self.settings.countdown_secs
        );
    }

    pub(crate) fn countdown_tick(&self, sequence: u64) -> Tick {
        let mut core = self.core();
        if core.sequence != sequence || core.state.phase != Phase::Countdown {
            return Tick::Stale;
        }

        let remaining = core.state.countdown.unwrap_or(0).saturating_sub(1);
        if remaining > 0 {
            core.state.countdown = Some(remaining);
            log::debug!("Countdown: {}", remaining);
            self.publish(&core);
            return Tick::Continue;
        }

        // The running task owns this handle; dropping it detaches rather than aborts.
        core.timers.countdown.take();
        core.state.countdown = None;
        core.state.phase = Phase::Capturing;
        core.capture_armed = true;
        self.publish(&core);
        Tick::Fire
    }

    pub(crate) async fn capture_photo(
        self: &Arc<Self>,
    ) -> Result<Option<CapturedImage>, CaptureError> {
        let (stream, sequence) = {
            let mut core = self.core();
            if !core.capture_armed || core.state.phase != Phase::Capturing {
                log::debug!(
                    "capture_photo ignored in phase {} without an expired countdown",
                    core.state.phase
                );
                return Ok(None);
            }
            core.capture_armed = false;
            (core.stream.clone(), core.sequence)
        };

        let encoded = match stream {
            Some(stream) => {
                let this = Arc::clone(self);
                tokio::task::spawn_blocking(move || {
                    stream.current_frame().and_then(|frame| this.encode(frame))
                })
                .await
                .map_err(|e| CaptureError::Capture(format!("Capture task join error: {}", e)))
                .and_then(|result| result)
            }
            None => Err(CaptureError::Capture("no active stream".to_string())),
        };

        match encoded {
            Ok(image) => {
                {
                    let mut core = self.core();
                    if core.sequence != sequence || core.state.phase != Phase::Capturing {
                        log::debug!("Capture discarded, session changed while encoding");
                        return Ok(None);
                    }
                    let face_size = core.metrics.face_size;
                    core.metrics = QualityMetrics {
                        face_size,
                        ..image.metadata.quality
                    };
                    core.refresh_can_capture(self.settings.quality_threshold);
                    core.state.phase = Phase::Complete;
                    core.state.quality_score = image.metadata.quality.overall;
                    let cooldown = run_cooldown(Arc::downgrade(self), sequence, self.settings.cooldown);
                    core.timers.cooldown = Some(tokio::spawn(cooldown));
                    self.publish(&core);
                }

                log::info!(
                    "Captured {} still {} ({} bytes, quality {})",
                    image.metadata.resolution,
                    image.id,
                    image.size_bytes(),
                    image.metadata.quality.overall
                );
                self.notify_capture(&image);
                Ok(Some(image))
            }
            Err(e) => {
                {
                    let mut core = self.core();
                    if core.sequence == sequence && core.state.phase == Phase::Capturing {
                        core.state.phase = Phase::Idle;
                        core.state.countdown = None;
                        self.publish(&core);
                    }
                }
                log::error!("Capture failed: {}", e);
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Mirror, score and JPEG-encode a frame.
    fn encode(&self, frame: VideoFrame) -> Result<CapturedImage, CaptureError> {
        let resolution = frame.resolution();
        if resolution.is_empty() {
            return Err(CaptureError::Capture(format!(
                "frame has zero dimensions ({}), stream not ready",
                resolution
            )));
        }

        let mut rgb = frame
            .to_rgb_image()
            .ok_or_else(|| CaptureError::Capture("incomplete frame buffer".to_string()))?;
        if self.settings.mirror {
            image::imageops::flip_horizontal_in_place(&mut rgb);
        }

        let quality = self.estimator.analyze_image(&rgb)?;

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.settings.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| CaptureError::Encoding(format!("JPEG encoding failed: {}", e)))?;

        Ok(CapturedImage {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: "image/jpeg".to_string(),
            data,
            metadata: CaptureMetadata {
                quality,
                timestamp: chrono::Utc::now(),
                resolution,
                mirrored: self.settings.mirror,
            },
        })
    }

    pub(crate) fn finish_cooldown(&self, sequence: u64) {
        let mut core = self.core();
        if core.sequence != sequence || core.state.phase != Phase::Complete {
            return;
        }
        core.timers.cooldown.take();
        core.state = CaptureState {
            quality_score: core.metrics.overall,
            ..CaptureState::default()
        };
        self.publish(&core);
        log::debug!("Cooldown finished, ready for next capture");
    }

    /// Current frame for a session-scoped task, or `None` once the task is stale.
    pub(crate) async fn grab_frame(&self, epoch: u64) -> Option<Result<VideoFrame, CaptureError>> {
        let stream = {
            let core = self.core();
            if core.epoch != epoch {
                return None;
            }
            Arc::clone(core.stream.as_ref()?)
        };
        Some(read_frame(stream).await)
    }

    fn attach_presence_source<P: FacePresenceSource>(
        self: &Arc<Self>,
        detector: P,
    ) -> Result<(), CaptureError> {
        let mut core = self.core();
        if core.stream.is_none() {
            return Err(CaptureError::Capture(
                "cannot attach a face detector before start()".to_string(),
            ));
        }
        if let Some(previous) = core.timers.presence.take() {
            previous.abort();
        }
        let task = run_presence(
            Arc::downgrade(self),
            core.epoch,
            detector,
            self.settings.presence_interval,
        );
        core.timers.presence = Some(tokio::spawn(task));
        Ok(())
    }

    fn notify_capture(&self, image: &CapturedImage) {
        let callback = lock(&self.on_capture).clone();
        if let Some(callback) = callback {
            callback(image);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        let callback = lock(&self.on_error).clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}
