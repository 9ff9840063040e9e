//! Timer-driven tasks spawned by the controller.
//!
//! Every task holds a `Weak` to the controller internals plus the epoch or
//! sequence number it was spawned under, and re-checks that number under the
//! state lock before touching anything. Aborting the handle is the fast path;
//! the number check covers a task that was already past its await point.

use super::controller::{Inner, Tick};
use crate::source::{FacePresenceSource, MediaSource};
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handles of the tasks a controller may have in flight.
#[derive(Debug, Default)]
pub(crate) struct Timers {
    pub sampler: Option<JoinHandle<()>>,
    pub countdown: Option<JoinHandle<()>>,
    pub cooldown: Option<JoinHandle<()>>,
    pub presence: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn active(&self) -> usize {
        [&self.sampler, &self.countdown, &self.cooldown, &self.presence]
            .iter()
            .filter(|h| h.is_some())
            .count()
    }

    pub fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for handle in [
            self.sampler.take(),
            self.countdown.take(),
            self.cooldown.take(),
            self.presence.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

pub(crate) async fn run_sampler<S: MediaSource>(weak: Weak<Inner<S>>, epoch: u64, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.sample_quality(epoch).await {
            break;
        }
    }
}

pub(crate) async fn run_countdown<S: MediaSource>(weak: Weak<Inner<S>>, sequence: u64) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        match inner.countdown_tick(sequence) {
            Tick::Continue => {}
            Tick::Fire => {
                if let Err(e) = inner.capture_photo().await {
                    log::warn!("Auto-capture failed: {}", e);
                }
                return;
            }
            Tick::Stale => return,
        }
    }
}

pub(crate) async fn run_cooldown<S: MediaSource>(
    weak: Weak<Inner<S>>,
    sequence: u64,
    cooldown: Duration,
) {
    tokio::time::sleep(cooldown).await;
    if let Some(inner) = weak.upgrade() {
        inner.finish_cooldown(sequence);
    }
}

pub(crate) async fn run_presence<S: MediaSource, P: FacePresenceSource>(
    weak: Weak<Inner<S>>,
    epoch: u64,
    mut detector: P,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let frame = {
            let Some(inner) = weak.upgrade() else {
                break;
            };
            match inner.grab_frame(epoch).await {
                None => break,
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    log::debug!("Presence poll skipped, no frame: {}", e);
                    continue;
                }
            }
        };

        let reading = detector.detect(&frame).await;

        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.is_current(epoch) {
            break;
        }
        match reading {
            Ok(presence) => {
                if let Some(face_box) = presence.face_box {
                    inner.update_face_box(face_box);
                }
                inner.on_face_presence(presence.present, presence.stable);
            }
            Err(e) => log::warn!("Face detector failed, skipping poll: {}", e),
        }
    }
}
