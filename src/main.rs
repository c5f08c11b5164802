//! rgbd-record binary: capture a timed RGB-D session into a folder.

use rgbd_capture::preview::{TerminalPreview, CANCEL_KEY};
use rgbd_capture::session::{record_session, SessionDirs};
use rgbd_capture::RealSenseSource;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STREAM_WIDTH: u32 = 640;
const STREAM_HEIGHT: u32 = 480;
const STREAM_FPS: u32 = 30;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(folder) = std::env::args().nth(1) else {
        print_usage();
        std::process::exit(1);
    };

    if let Err(err) = run(Path::new(&folder)) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Usage: rgbd-record <foldername>");
    println!("foldername: path where the recorded data should be stored at");
    println!("e.g., rgbd-record LINEMOD/mug");
}

fn run(folder: &Path) -> rgbd_capture::traits::Result<()> {
    let dirs = SessionDirs::create(folder)?;
    let mut source = RealSenseSource::open(STREAM_WIDTH, STREAM_HEIGHT, STREAM_FPS)?;
    let mut preview = TerminalPreview::new();

    println!("Press {CANCEL_KEY} then Enter to stop early");
    let summary = record_session(&mut source, &mut preview, &dirs)?;

    println!(
        "Recorded {} frames to {} ({:?})",
        summary.frames_written,
        folder.display(),
        summary.reason
    );
    Ok(())
}
