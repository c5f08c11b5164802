//! Core traits and types for RGB-D capture abstraction.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Packed 8-bit RGB raster for one color frame.
#[derive(Debug, Clone)]
pub struct ColorRaster {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Packed RGB8 samples, row-major, `width * height * 3` bytes.
    pub data: Vec<u8>,
}

/// Single-channel 16-bit depth raster for one depth frame.
#[derive(Debug, Clone)]
pub struct DepthRaster {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Z16 depth samples, row-major, `width * height` entries.
    pub data: Vec<u16>,
}

/// One synchronized color/depth pair produced by a frame source tick.
///
/// Both rasters share the session resolution. Pairs are write-through:
/// encoded immediately and never buffered across ticks.
#[derive(Debug, Clone)]
pub struct FramePair {
    /// Color raster, pre-aligned to the depth raster by the source.
    pub color: ColorRaster,
    /// Depth raster.
    pub depth: DepthRaster,
}

/// Camera parameters reported by the frame source at session start.
///
/// Captured exactly once and immutable for the session. The serialized
/// field order is the sidecar layout downstream pose-estimation tooling
/// expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intrinsics {
    /// Focal length along x, in pixels.
    pub fx: f64,
    /// Focal length along y, in pixels.
    pub fy: f64,
    /// Principal point x coordinate.
    pub ppx: f64,
    /// Principal point y coordinate.
    pub ppy: f64,
    /// Stream height in pixels.
    pub height: u32,
    /// Stream width in pixels.
    pub width: u32,
    /// Physical units per raw depth sample.
    pub depth_scale: f32,
}

/// Error type for capture operations.
#[derive(Debug)]
pub enum Error {
    /// Failed to open or configure the device.
    DeviceOpenFailed(String),
    /// Error during streaming operation.
    StreamError(String),
    /// Waiting for the next frame pair timed out.
    Timeout,
    /// Raster data does not match the declared dimensions.
    ShapeMismatch {
        /// Sample count implied by width and height.
        expected: usize,
        /// Sample count actually supplied.
        actual: usize,
    },
    /// Raster encoding failed.
    Image(image::ImageError),
    /// Intrinsics serialization failed.
    Json(serde_json::Error),
    /// I/O error.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceOpenFailed(msg) => write!(f, "Failed to open device: {msg}"),
            Self::StreamError(msg) => write!(f, "Stream error: {msg}"),
            Self::Timeout => write!(f, "Timed out waiting for frames"),
            Self::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Raster shape mismatch: expected {expected} samples, got {actual}"
                )
            }
            Self::Image(err) => write!(f, "Image encoding error: {err}"),
            Self::Json(err) => write!(f, "Serialization error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Abstraction over a device producing synchronized color/depth pairs.
pub trait FrameSource {
    /// Block until the next frame pair arrives.
    ///
    /// Returns `Ok(None)` when the device delivered an incomplete pair for
    /// this tick. Callers treat that as a transient gap: skip the tick and
    /// retry on the next one.
    fn next_pair(&mut self) -> Result<Option<FramePair>>;

    /// Stream intrinsics and depth scale negotiated at session start.
    fn intrinsics(&self) -> Result<Intrinsics>;

    /// Release the device. Must be idempotent.
    fn stop(&mut self);
}

/// Abstraction over the live preview surface.
///
/// The preview is purely observational: recorded output never depends on
/// what an implementation does with the frames it is shown.
pub trait Preview {
    /// Present one color raster, with overlay text when the current phase
    /// carries a countdown.
    fn show(&mut self, color: &ColorRaster, overlay: Option<&str>) -> Result<()>;

    /// Poll for a user cancellation request. Must not block.
    fn cancel_requested(&mut self) -> bool;
}

/// Monotonic clock measuring elapsed time since session start.
pub trait SessionClock {
    /// Elapsed time since the session began.
    fn elapsed(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock(Instant);

impl MonotonicClock {
    /// Start the clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self(Instant::now())
    }
}

impl SessionClock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}
