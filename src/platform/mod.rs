//! Platform camera backends
//!
//! The `native` feature enables a [`MediaSource`](crate::source::MediaSource)
//! backed by the host's capture stack via nokhwa.

#[cfg(feature = "native")]
mod native;

#[cfg(feature = "native")]
pub use native::{NativeCameraSource, NativeStream};
