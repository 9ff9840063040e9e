//! Capture session controller
//!
//! Owns the camera stream for one session and sequences
//! idle -> detecting -> preparing -> countdown -> capturing -> complete,
//! gating the countdown on quality and face stability.

mod controller;
mod tasks;

pub use controller::{CaptureCallback, CaptureController, ErrorCallback};
