//! Paced screen recording and frame-decimation timelapse conversion.
//!
//! Two pipelines share one frame model: a live capture loop that grabs a
//! screen region at a fixed rate, composites the cursor and encodes into an
//! MP4 file, and an offline converter that re-reads such a file keeping one
//! frame in `N` to produce the sped-up timelapse.

pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod timelapse;
pub mod utils;
pub mod video;

pub use capture::{CaptureRegion, Frame, Recorder};
pub use display::DisplayManager;
pub use error::{Error, Result};
pub use timelapse::Decimator;
