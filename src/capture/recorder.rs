//! The recorder controller: start/stop plus the conversion hand-off.
//!
//! Owns at most one [`RecordingSession`]. `start` while recording and
//! `stop` while idle are both no-ops, so a shell can wire buttons or
//! signals to these methods without tracking state itself. Stopping runs
//! the timelapse conversion synchronously and removes the raw recording
//! once the converted file exists.

use std::fs;
use std::path::PathBuf;

use chrono::Local;

use crate::capture::cursor::DeviceQueryPointer;
use crate::capture::frame::CaptureRegion;
use crate::capture::grabber::XcapGrabber;
use crate::capture::session::{CaptureObserver, LogObserver, RecordingSession, SessionConfig};
use crate::error::{Error, Result};
use crate::timelapse::Decimator;
use crate::utils::path::{temp_recording_name, timelapse_path_for};

pub struct Recorder {
    output_dir: PathBuf,
    target_fps: u32,
    speed_factor: u32,
    region: CaptureRegion,
    session: Option<RecordingSession>,
}

impl Recorder {
    /// `target_fps` and `speed_factor` must both be at least 1; both are
    /// validated here so a bad value fails before any recording starts.
    pub fn new(
        output_dir: PathBuf,
        target_fps: u32,
        speed_factor: u32,
        region: CaptureRegion,
    ) -> Result<Self> {
        if target_fps == 0 {
            return Err(Error::InvalidArgument("target_fps must be at least 1".into()));
        }
        Decimator::new(speed_factor)?;
        Ok(Recorder {
            output_dir,
            target_fps,
            speed_factor,
            region,
            session: None,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a recording into a fresh temp file. Does nothing when a
    /// session is already running.
    pub fn start(&mut self) -> Result<()> {
        self.start_observed(LogObserver)
    }

    /// `start` with a caller-supplied observer, for shells that want the
    /// error channel or a live preview.
    pub fn start_observed<O: CaptureObserver>(&mut self, observer: O) -> Result<()> {
        if self.session.is_some() {
            log::debug!("start ignored, recording already in progress");
            return Ok(());
        }

        let config = SessionConfig {
            output_file: self.output_dir.join(temp_recording_name(Local::now())),
            target_fps: self.target_fps,
            region: self.region,
        };
        let session =
            RecordingSession::start(config, XcapGrabber, DeviceQueryPointer, observer)?;
        self.session = Some(session);
        Ok(())
    }

    /// End the recording and convert it. Returns the timelapse path, or
    /// `Ok(None)` when no recording was running. On a conversion failure
    /// the raw recording is kept so the frames are not lost.
    pub fn stop(&mut self) -> Result<Option<PathBuf>> {
        let Some(session) = self.session.take() else {
            log::debug!("stop ignored, no recording in progress");
            return Ok(None);
        };

        let raw = session.stop();
        let timelapse = timelapse_path_for(&raw);
        let decimator = Decimator::new(self.speed_factor)?;
        let output = decimator.convert(&raw, &timelapse)?;

        if let Err(e) = fs::remove_file(&raw) {
            log::warn!("could not remove raw recording {}: {e}", raw.display());
        }
        Ok(Some(output))
    }
}
