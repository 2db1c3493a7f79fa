//! Crate-wide error taxonomy.
//!
//! Structural failures (missing input, unopenable sink, empty input) are
//! distinct variants so callers can match on them and show an actionable
//! message. Per-frame failures (`Capture`, `PointerQuery`) never abort a
//! recording; they are delivered through the [`CaptureObserver`] channel.
//!
//! [`CaptureObserver`]: crate::capture::CaptureObserver

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The referenced input file does not exist. Raised before any media
    /// resource is opened, so there is nothing to roll back.
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    /// The input opened cleanly but yielded zero frames.
    #[error("no frames could be read from: {0}")]
    EmptyInput(PathBuf),

    /// The output writer could not be opened (bad path, unsupported codec,
    /// unwritable directory). Fatal for the operation in progress.
    #[error("could not open video sink {path}: {reason}")]
    SinkOpen { path: PathBuf, reason: String },

    /// A caller passed a structurally invalid value (zero-extent region,
    /// zero speed factor, zero fps). Raised at construction, before any
    /// recording or conversion starts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A single frame failed to grab, composite or write during a live
    /// recording. Transient: the capture loop logs and continues.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// The global pointer position could not be read. Transient: the frame
    /// is still written, just without the cursor overlay.
    #[error("pointer query failed: {0}")]
    PointerQuery(String),

    #[error("media error: {0}")]
    Media(#[from] ac_ffmpeg::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Transient errors are reported through the observer and never
    /// propagate out of the capture loop.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Capture(_) | Error::PointerQuery(_))
    }
}
