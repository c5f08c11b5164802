//! RGBD-Capture: timed color/depth session recording for depth cameras
//!
//! This library provides trait-based abstractions over RGB-D frame
//! acquisition and a timed acquisition loop that persists synchronized
//! frame pairs to disk, enabling both production use with real hardware
//! and testing with mock sources.

pub mod encoder;
pub mod preview;
pub mod session;
pub mod traits;

#[cfg(feature = "realsense")]
pub mod device;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "realsense")]
pub use device::RealSenseSource;
pub use session::{
    record_session, record_session_with, Phase, Recorder, SessionDirs, SessionSummary, StopReason,
};
pub use traits::{
    ColorRaster, DepthRaster, FramePair, FrameSource, Intrinsics, MonotonicClock, Preview,
    SessionClock,
};
