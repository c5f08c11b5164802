//! Mock frame source, preview, and clock for testing without hardware.

use crate::traits::{
    ColorRaster, DepthRaster, Error, FramePair, FrameSource, Intrinsics, Preview, Result,
    SessionClock,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Mock source yielding synthetic frame pairs, with scripted gaps.
pub struct MockSource {
    intrinsics: Intrinsics,
    width: u32,
    height: u32,
    pull_count: u32,
    gap_pulls: Vec<u32>,
    fail_intrinsics: bool,
    stop_calls: u32,
}

impl MockSource {
    /// Create a mock source streaming at the given resolution.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            intrinsics: Intrinsics {
                fx: 615.0,
                fy: 615.0,
                ppx: f64::from(width) / 2.0,
                ppy: f64::from(height) / 2.0,
                height,
                width,
                depth_scale: 0.001,
            },
            width,
            height,
            pull_count: 0,
            gap_pulls: Vec::new(),
            fail_intrinsics: false,
            stop_calls: 0,
        }
    }

    /// Script pulls (0-based) that yield an incomplete pair.
    #[must_use]
    pub fn with_gaps(mut self, pulls: &[u32]) -> Self {
        self.gap_pulls = pulls.to_vec();
        self
    }

    /// Make `intrinsics` fail, simulating a device that cannot report its
    /// stream profile.
    #[must_use]
    pub const fn with_intrinsics_error(mut self) -> Self {
        self.fail_intrinsics = true;
        self
    }

    /// Number of times `stop` has been invoked.
    #[must_use]
    pub const fn stop_count(&self) -> u32 {
        self.stop_calls
    }

    /// Generate a pair whose content varies with the pull sequence, so
    /// consecutive frames are distinguishable on disk.
    fn generate_pair(&self, seq: u32) -> FramePair {
        let pixels = (self.width * self.height) as usize;

        let mut color = Vec::with_capacity(pixels * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                #[allow(clippy::cast_possible_truncation)]
                let luma = (((x + y + seq) * 255) / (self.width + self.height)) as u8;
                color.extend_from_slice(&[luma, luma, luma]);
            }
        }

        let mut depth = Vec::with_capacity(pixels);
        for y in 0..self.height {
            for x in 0..self.width {
                #[allow(clippy::cast_possible_truncation)]
                let sample = ((y * self.width + x) + seq * 100) as u16;
                depth.push(sample);
            }
        }

        FramePair {
            color: ColorRaster {
                width: self.width,
                height: self.height,
                data: color,
            },
            depth: DepthRaster {
                width: self.width,
                height: self.height,
                data: depth,
            },
        }
    }
}

impl FrameSource for MockSource {
    fn next_pair(&mut self) -> Result<Option<FramePair>> {
        let seq = self.pull_count;
        self.pull_count += 1;
        if self.gap_pulls.contains(&seq) {
            return Ok(None);
        }
        Ok(Some(self.generate_pair(seq)))
    }

    fn intrinsics(&self) -> Result<Intrinsics> {
        if self.fail_intrinsics {
            return Err(Error::StreamError(
                "mock intrinsics unavailable".to_owned(),
            ));
        }
        Ok(self.intrinsics.clone())
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
    }
}

/// Preview stub recording what was shown, optionally cancelling after a
/// fixed number of renders.
pub struct MockPreview {
    /// Overlay text captured per `show` call.
    pub overlays: Vec<Option<String>>,
    cancel_after: Option<u32>,
    shows: u32,
}

impl Default for MockPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPreview {
    /// Create a preview stub that never cancels.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            overlays: Vec::new(),
            cancel_after: None,
            shows: 0,
        }
    }

    /// Request cancellation once `shows` renders have happened.
    #[must_use]
    pub const fn cancel_after(mut self, shows: u32) -> Self {
        self.cancel_after = Some(shows);
        self
    }
}

impl Preview for MockPreview {
    fn show(&mut self, _color: &ColorRaster, overlay: Option<&str>) -> Result<()> {
        self.overlays.push(overlay.map(str::to_owned));
        self.shows += 1;
        Ok(())
    }

    fn cancel_requested(&mut self) -> bool {
        self.cancel_after.is_some_and(|after| self.shows >= after)
    }
}

/// Scripted session clock: yields its entries in order, then repeats the
/// final entry once exhausted.
pub struct ManualClock {
    ticks: RefCell<VecDeque<Duration>>,
    last: RefCell<Duration>,
}

impl ManualClock {
    /// Create a clock from explicit elapsed durations.
    #[must_use]
    pub fn new(ticks: &[Duration]) -> Self {
        Self {
            ticks: RefCell::new(ticks.iter().copied().collect()),
            last: RefCell::new(ticks.last().copied().unwrap_or_default()),
        }
    }

    /// Create a clock from elapsed milliseconds.
    #[must_use]
    pub fn from_millis(ticks: &[u64]) -> Self {
        let durations: Vec<Duration> = ticks.iter().map(|ms| Duration::from_millis(*ms)).collect();
        Self::new(&durations)
    }
}

impl SessionClock for ManualClock {
    fn elapsed(&self) -> Duration {
        match self.ticks.borrow_mut().pop_front() {
            Some(tick) => {
                *self.last.borrow_mut() = tick;
                tick
            }
            None => *self.last.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_pairs_share_resolution() {
        let mut source = MockSource::new(64, 48);
        let pair = source
            .next_pair()
            .expect("next_pair should succeed")
            .expect("first pull should yield a pair");

        assert_eq!(pair.color.width, 64);
        assert_eq!(pair.color.height, 48);
        assert_eq!(pair.color.data.len(), 64 * 48 * 3);
        assert_eq!(pair.depth.data.len(), 64 * 48);
    }

    #[test]
    fn test_mock_source_consecutive_pairs_differ() {
        let mut source = MockSource::new(16, 16);
        let first = source
            .next_pair()
            .expect("next_pair should succeed")
            .expect("pair expected");
        let second = source
            .next_pair()
            .expect("next_pair should succeed")
            .expect("pair expected");

        assert_ne!(first.depth.data, second.depth.data);
    }

    #[test]
    fn test_mock_source_scripted_gaps() {
        let mut source = MockSource::new(16, 16).with_gaps(&[0, 2]);

        assert!(source.next_pair().expect("pull 0").is_none());
        assert!(source.next_pair().expect("pull 1").is_some());
        assert!(source.next_pair().expect("pull 2").is_none());
        assert!(source.next_pair().expect("pull 3").is_some());
    }

    #[test]
    fn test_mock_source_counts_stops() {
        let mut source = MockSource::new(16, 16);
        assert_eq!(source.stop_count(), 0);
        source.stop();
        source.stop();
        assert_eq!(source.stop_count(), 2);
    }

    #[test]
    fn test_manual_clock_repeats_last_entry() {
        let clock = ManualClock::from_millis(&[100, 200]);
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_mock_preview_cancels_after_threshold() {
        let raster = ColorRaster {
            width: 2,
            height: 2,
            data: vec![0; 12],
        };
        let mut preview = MockPreview::new().cancel_after(2);

        assert!(!preview.cancel_requested());
        preview.show(&raster, None).expect("show should succeed");
        assert!(!preview.cancel_requested());
        preview.show(&raster, Some("3")).expect("show should succeed");
        assert!(preview.cancel_requested());
        assert_eq!(preview.overlays, vec![None, Some("3".to_owned())]);
    }
}
