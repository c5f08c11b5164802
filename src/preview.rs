//! Preview implementations for live session feedback.
//!
//! The preview surface is observational only; recorded output never
//! depends on it. [`TerminalPreview`] reports through structured logging
//! and listens for the cancel key on stdin; [`NullPreview`] is inert for
//! headless runs.

use crate::traits::{ColorRaster, Preview, Result};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::info;

/// Line that cancels a running session when entered on stdin.
pub const CANCEL_KEY: &str = "q";

/// Terminal-backed preview: logs overlay transitions and polls a
/// background stdin reader for the cancel key.
pub struct TerminalPreview {
    cancel_rx: Receiver<()>,
    last_overlay: Option<String>,
}

impl TerminalPreview {
    /// Start the stdin listener and return the preview.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        // Reader thread: one message per cancel line; exits with the process.
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim() == CANCEL_KEY && tx.send(()).is_err() {
                    break;
                }
            }
        });
        Self {
            cancel_rx: rx,
            last_overlay: None,
        }
    }
}

impl Default for TerminalPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl Preview for TerminalPreview {
    fn show(&mut self, _color: &ColorRaster, overlay: Option<&str>) -> Result<()> {
        // Log only on overlay transitions to keep the 30fps loop quiet.
        if overlay != self.last_overlay.as_deref() {
            match overlay {
                Some(text) => info!(countdown = text, "overlay"),
                None => info!("recording"),
            }
            self.last_overlay = overlay.map(str::to_owned);
        }
        Ok(())
    }

    fn cancel_requested(&mut self) -> bool {
        match self.cancel_rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }
}

/// Inert preview for headless environments.
pub struct NullPreview;

impl Preview for NullPreview {
    fn show(&mut self, _color: &ColorRaster, _overlay: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn cancel_requested(&mut self) -> bool {
        false
    }
}
