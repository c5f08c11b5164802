//! RealSense frame source using the realsense-rust crate.

use realsense_rust::config::Config;
use realsense_rust::context::Context;
use realsense_rust::frame::{ColorFrame, DepthFrame, PixelKind};
use realsense_rust::kind::{Rs2Format, Rs2Option, Rs2StreamKind};
use realsense_rust::pipeline::{ActivePipeline, FrameWaitError, InactivePipeline};

use crate::traits::{
    ColorRaster, DepthRaster, Error, FramePair, FrameSource, Intrinsics, Result,
};
use std::time::Duration;

/// Bound on a single frame-pair wait.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frame source backed by a librealsense2 pipeline.
///
/// Streams color RGB8 and depth Z16 together; the SDK delivers both as
/// one composite per tick. Dropping the source releases the pipeline if
/// `stop` was never reached.
pub struct RealSenseSource {
    pipeline: Option<ActivePipeline>,
    intrinsics: Intrinsics,
}

impl RealSenseSource {
    /// Open the first connected device, streaming color and depth at the
    /// requested resolution and rate.
    pub fn open(width: u32, height: u32, fps: u32) -> Result<Self> {
        let context =
            Context::new().map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;
        let pipeline = InactivePipeline::try_from(&context)
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        let mut config = Config::new();
        config
            .enable_stream(
                Rs2StreamKind::Color,
                None,
                width as usize,
                height as usize,
                Rs2Format::Rgb8,
                fps as usize,
            )
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;
        config
            .enable_stream(
                Rs2StreamKind::Depth,
                None,
                width as usize,
                height as usize,
                Rs2Format::Z16,
                fps as usize,
            )
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        let pipeline = pipeline
            .start(Some(config))
            .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

        let intrinsics = query_intrinsics(&pipeline)?;

        Ok(Self {
            pipeline: Some(pipeline),
            intrinsics,
        })
    }

    fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop();
        }
    }
}

impl FrameSource for RealSenseSource {
    fn next_pair(&mut self) -> Result<Option<FramePair>> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Err(Error::StreamError("source already stopped".to_owned()));
        };

        let frames = pipeline.wait(Some(WAIT_TIMEOUT)).map_err(|err| match err {
            FrameWaitError::DidTimeoutBeforeFrameArrival => Error::Timeout,
            other => Error::StreamError(other.to_string()),
        })?;

        let mut colors = frames.frames_of_type::<ColorFrame>();
        let mut depths = frames.frames_of_type::<DepthFrame>();
        let (Some(color), Some(depth)) = (colors.pop(), depths.pop()) else {
            // One constituent missing this tick: a transient gap, not a failure.
            return Ok(None);
        };

        Ok(Some(FramePair {
            color: convert_color(&color),
            depth: convert_depth(&depth),
        }))
    }

    fn intrinsics(&self) -> Result<Intrinsics> {
        Ok(self.intrinsics.clone())
    }

    fn stop(&mut self) {
        self.release();
    }
}

impl Drop for RealSenseSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Color stream intrinsics plus the depth sensor's unit scale, captured
/// once right after pipeline start.
fn query_intrinsics(pipeline: &ActivePipeline) -> Result<Intrinsics> {
    let profile = pipeline.profile();

    let color_stream = profile
        .streams()
        .into_iter()
        .find(|stream| stream.kind() == Rs2StreamKind::Color)
        .ok_or_else(|| Error::DeviceOpenFailed("no color stream in profile".to_owned()))?;
    let intr = color_stream
        .intrinsics()
        .map_err(|err| Error::DeviceOpenFailed(err.to_string()))?;

    let depth_scale = profile
        .device()
        .sensors()
        .iter()
        .find_map(|sensor| sensor.get_option(Rs2Option::DepthUnits))
        .ok_or_else(|| {
            Error::DeviceOpenFailed("no sensor reported depth units".to_owned())
        })?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Intrinsics {
        fx: f64::from(intr.fx()),
        fy: f64::from(intr.fy()),
        ppx: f64::from(intr.ppx()),
        ppy: f64::from(intr.ppy()),
        height: intr.height() as u32,
        width: intr.width() as u32,
        depth_scale,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn convert_color(frame: &ColorFrame) -> ColorRaster {
    let width = frame.width() as u32;
    let height = frame.height() as u32;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for pixel in frame.iter() {
        if let PixelKind::Rgb8 { r, g, b } = pixel {
            data.extend_from_slice(&[*r, *g, *b]);
        }
    }
    ColorRaster {
        width,
        height,
        data,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn convert_depth(frame: &DepthFrame) -> DepthRaster {
    let width = frame.width() as u32;
    let height = frame.height() as u32;
    let mut data = Vec::with_capacity((width * height) as usize);
    for pixel in frame.iter() {
        if let PixelKind::Z16 { depth } = pixel {
            data.push(*depth);
        }
    }
    DepthRaster {
        width,
        height,
        data,
    }
}
