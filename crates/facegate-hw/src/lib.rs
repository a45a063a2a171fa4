//! facegate-hw — Hardware abstraction for camera capture.
//!
//! V4L2 camera access behind the [`FrameSource`] seam the scan loop
//! consumes. Everything above this crate sees grayscale frames only.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, FrameSource, PixelFormat};
pub use frame::Frame;
