//! Session layout and the timed acquisition loop.
//!
//! A session runs through three time-driven phases: a warm-up countdown,
//! the recording window during which every complete tick persists one
//! frame pair, and a cooldown that terminates the loop on entry. The
//! frame index counter and clock origin live on a single [`Recorder`]
//! instance per session.

use crate::encoder;
use crate::traits::{
    FrameSource, Intrinsics, MonotonicClock, Preview, Result, SessionClock,
};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Countdown shown before recording begins.
pub const WARMUP: Duration = Duration::from_secs(5);

/// Length of the recording window.
pub const RECORD_LENGTH: Duration = Duration::from_secs(30);

/// Phase of the acquisition loop, derived purely from elapsed session time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Warm-up countdown; nothing is written.
    Countdown,
    /// Active recording; every complete tick persists one frame pair.
    Recording,
    /// Recording window has elapsed; the loop terminates on entry.
    Cooldown,
}

impl Phase {
    /// Phase for a given elapsed session time.
    ///
    /// Recording covers the half-open window
    /// `[WARMUP, WARMUP + RECORD_LENGTH)`; the boundary instant belongs to
    /// `Cooldown` and is not recorded.
    #[must_use]
    pub fn at(elapsed: Duration) -> Self {
        if elapsed < WARMUP {
            Self::Countdown
        } else if elapsed < WARMUP + RECORD_LENGTH {
            Self::Recording
        } else {
            Self::Cooldown
        }
    }

    /// Overlay text composited onto the preview for this phase.
    ///
    /// Countdown shows the whole seconds remaining until recording starts;
    /// cooldown shows the whole seconds remaining in the overrun window
    /// while non-negative. Recording carries no overlay.
    #[must_use]
    pub fn overlay(self, elapsed: Duration) -> Option<String> {
        match self {
            Self::Countdown => {
                let remaining = WARMUP.as_secs().saturating_sub(elapsed.as_secs());
                Some(remaining.to_string())
            }
            Self::Recording => None,
            Self::Cooldown => {
                let total = (WARMUP + RECORD_LENGTH).as_secs();
                (elapsed.as_secs() <= total).then(|| (total - elapsed.as_secs()).to_string())
            }
        }
    }
}

/// Why the acquisition loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The recording window elapsed.
    Completed,
    /// The user requested cancellation through the preview.
    Cancelled,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frame pairs persisted during the recording phase.
    pub frames_written: u32,
    /// Termination cause.
    pub reason: StopReason,
}

/// On-disk layout for one capture session.
#[derive(Debug, Clone)]
pub struct SessionDirs {
    root: PathBuf,
    color_dir: PathBuf,
    depth_dir: PathBuf,
}

impl SessionDirs {
    /// Create the session layout under `root`, making directories as needed.
    pub fn create(root: &Path) -> Result<Self> {
        let color_dir = root.join("JPEGImages");
        let depth_dir = root.join("depth");
        fs::create_dir_all(&color_dir)?;
        fs::create_dir_all(&depth_dir)?;
        Ok(Self {
            root: root.to_path_buf(),
            color_dir,
            depth_dir,
        })
    }

    /// Path of the intrinsics sidecar.
    #[must_use]
    pub fn intrinsics_path(&self) -> PathBuf {
        self.root.join("intrinsics.json")
    }

    /// Color file path for a frame index.
    #[must_use]
    pub fn color_path(&self, index: u32) -> PathBuf {
        self.color_dir.join(format!("{index}.jpg"))
    }

    /// Depth file path for a frame index.
    #[must_use]
    pub fn depth_path(&self, index: u32) -> PathBuf {
        self.depth_dir.join(format!("{index}.png"))
    }
}

/// Persist stream intrinsics as the session's JSON sidecar.
///
/// The file is flushed before returning, so it is durable before frame 0
/// is written.
pub fn write_intrinsics(path: &Path, intrinsics: &Intrinsics) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, intrinsics)?;
    writer.flush()?;
    Ok(())
}

/// Signal from one tick to the driving loop.
enum TickOutcome {
    Continue,
    Stop(StopReason),
}

/// The acquisition state machine.
///
/// Owns the frame index counter and drives the per-tick contract: pull a
/// pair, compute the phase, write during recording, render the preview,
/// poll cancellation, stop on cooldown entry.
pub struct Recorder<'a> {
    dirs: &'a SessionDirs,
    frame_index: u32,
}

impl<'a> Recorder<'a> {
    /// Create a recorder writing into `dirs`, starting at frame 0.
    #[must_use]
    pub const fn new(dirs: &'a SessionDirs) -> Self {
        Self {
            dirs,
            frame_index: 0,
        }
    }

    /// Number of frame pairs written so far.
    #[must_use]
    pub const fn frames_written(&self) -> u32 {
        self.frame_index
    }

    /// Drive the tick loop until the recording window elapses or the user
    /// cancels.
    ///
    /// Does not release the source; callers that own the device should go
    /// through [`record_session`], which guarantees release on every exit
    /// path.
    pub fn run<S, P, C>(&mut self, source: &mut S, preview: &mut P, clock: &C) -> Result<StopReason>
    where
        S: FrameSource + ?Sized,
        P: Preview + ?Sized,
        C: SessionClock + ?Sized,
    {
        loop {
            match self.tick(source, preview, clock.elapsed())? {
                TickOutcome::Continue => {}
                TickOutcome::Stop(reason) => return Ok(reason),
            }
        }
    }

    fn tick<S, P>(
        &mut self,
        source: &mut S,
        preview: &mut P,
        elapsed: Duration,
    ) -> Result<TickOutcome>
    where
        S: FrameSource + ?Sized,
        P: Preview + ?Sized,
    {
        let Some(pair) = source.next_pair()? else {
            // Transient gap: no state advance, no write, retry next tick.
            debug!(?elapsed, "incomplete frame pair, skipping tick");
            return Ok(TickOutcome::Continue);
        };

        let phase = Phase::at(elapsed);
        if phase == Phase::Recording {
            let index = self.frame_index;
            encoder::write_color_jpeg(&self.dirs.color_path(index), &pair.color)?;
            encoder::write_depth_png(&self.dirs.depth_path(index), &pair.depth)?;
            // Both files are on disk; the index is now spent.
            self.frame_index += 1;
            debug!(index, "frame pair written");
        }

        preview.show(&pair.color, phase.overlay(elapsed).as_deref())?;

        if preview.cancel_requested() {
            return Ok(TickOutcome::Stop(StopReason::Cancelled));
        }
        if phase == Phase::Cooldown {
            return Ok(TickOutcome::Stop(StopReason::Completed));
        }
        Ok(TickOutcome::Continue)
    }
}

/// Run a full capture session against `source` on a wall clock: persist
/// intrinsics, then drive the tick loop.
///
/// The source is stopped exactly once on every exit path, including error
/// propagation out of the loop.
pub fn record_session<S, P>(
    source: &mut S,
    preview: &mut P,
    dirs: &SessionDirs,
) -> Result<SessionSummary>
where
    S: FrameSource,
    P: Preview,
{
    let clock = MonotonicClock::start();
    record_session_with(source, preview, dirs, &clock)
}

/// [`record_session`] with a caller-supplied session clock.
pub fn record_session_with<S, P, C>(
    source: &mut S,
    preview: &mut P,
    dirs: &SessionDirs,
    clock: &C,
) -> Result<SessionSummary>
where
    S: FrameSource,
    P: Preview,
    C: SessionClock,
{
    let outcome = run_session(source, preview, dirs, clock);
    source.stop();
    outcome
}

fn run_session<S, P, C>(
    source: &mut S,
    preview: &mut P,
    dirs: &SessionDirs,
    clock: &C,
) -> Result<SessionSummary>
where
    S: FrameSource,
    P: Preview,
    C: SessionClock,
{
    let intrinsics = source.intrinsics()?;
    write_intrinsics(&dirs.intrinsics_path(), &intrinsics)?;
    info!(
        width = intrinsics.width,
        height = intrinsics.height,
        depth_scale = intrinsics.depth_scale,
        "intrinsics persisted"
    );

    let mut recorder = Recorder::new(dirs);
    let reason = recorder.run(source, preview, clock)?;
    let frames_written = recorder.frames_written();
    info!(frames_written, ?reason, "session finished");

    Ok(SessionSummary {
        frames_written,
        reason,
    })
}
