//! Screen grabbing.
//!
//! `ScreenGrabber` is the seam between the capture loop and the platform
//! screenshot API; the live implementation is backed by `xcap`.

use image::imageops;
use xcap::Monitor;

use crate::capture::frame::{CaptureRegion, Frame};
use crate::error::{Error, Result};

/// Produces one frame of the configured region per call.
pub trait ScreenGrabber: Send {
    fn grab(&mut self, region: &CaptureRegion) -> Result<Frame>;
}

/// Live grabber: captures the monitor under the region's origin and crops
/// the region out of it.
#[derive(Debug, Default)]
pub struct XcapGrabber;

impl XcapGrabber {
    fn monitor_for(&self, region: &CaptureRegion) -> Result<Monitor> {
        if let Ok(monitor) = Monitor::from_point(region.left, region.top) {
            return Ok(monitor);
        }
        // region origin is off every display, fall back to the primary
        let monitors =
            Monitor::all().map_err(|e| Error::Capture(format!("monitor query failed: {e}")))?;
        monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or_else(|| Error::Capture("no monitor available".into()))
    }
}

impl ScreenGrabber for XcapGrabber {
    fn grab(&mut self, region: &CaptureRegion) -> Result<Frame> {
        let monitor = self.monitor_for(region)?;
        let mut full = monitor
            .capture_image()
            .map_err(|e| Error::Capture(format!("screen grab failed: {e}")))?;

        let crop_x = (region.left - monitor.x().unwrap_or(0)).max(0) as u32;
        let crop_y = (region.top - monitor.y().unwrap_or(0)).max(0) as u32;
        let cropped = imageops::crop(&mut full, crop_x, crop_y, region.width, region.height);

        Ok(Frame::new(cropped.to_image()))
    }
}
