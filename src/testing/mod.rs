//! Testing utilities for CrabCapture
//!
//! Synthetic frames with known quality characteristics plus in-memory media
//! and presence sources, for offline testing without a camera.

pub mod source;
pub mod synthetic_data;

pub use source::{ScriptedPresence, SyntheticSource, SyntheticStream};
pub use synthetic_data::{
    checkerboard_frame, gradient_frame, split_frame, stripes_frame, synthetic_face_frame,
    uniform_frame,
};
