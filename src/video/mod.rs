//! Video frame I/O.
//!
//! The capture and conversion pipelines exchange frames through the
//! [`FrameSource`] / [`FrameSink`] seams. The live implementations are
//! FFmpeg-backed (MP4 container, H.264 with an MPEG-4 fallback); tests
//! drive the pipeline cores with in-memory fakes instead.

pub mod convert;
pub mod decoder;
pub mod encoder;

pub use decoder::VideoFileSource;
pub use encoder::{RecordingSink, TimelapseSink};

use crate::error::Result;

/// Sequential, streaming producer of frames. `Ok(None)` signals a clean
/// end-of-stream.
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// Streaming consumer of frames bound to one output file. `finish` flushes
/// and finalizes the container; a sink dropped without `finish` leaves an
/// unusable file behind, which the owner is expected to delete.
pub trait FrameSink {
    type Frame;

    fn write_frame(&mut self, frame: Self::Frame) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}
