//! The shared frame model of both pipelines.
//!
//! Capture, compositing and encoding all exchange the same [`Frame`] type:
//! an RGBA raster with known dimensions. Frames are ephemeral, created once
//! per capture/decode tick and consumed by the next stage.

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::{Error, Result};

/// Integer pixel origin and extent of the screen area being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// A region must have a positive extent. It may lie outside every
    /// display's bounds; capturing such a region yields whatever the
    /// platform returns.
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!(
                "capture region must have positive extent, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            left,
            top,
            width,
            height,
        })
    }

    /// Whether a global point falls inside this region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let local_x = x - self.left;
        let local_y = y - self.top;
        local_x >= 0
            && local_y >= 0
            && (local_x as u32) < self.width
            && (local_y as u32) < self.height
    }
}

/// One captured or decoded raster, 4 channels (RGBA), row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Raw RGBA bytes, `width * height * 4` of them.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Resample to the sink's fixed resolution. Returns `self` untouched
    /// when the dimensions already match.
    pub fn resize_to(self, width: u32, height: u32) -> Frame {
        if self.width() == width && self.height() == height {
            return self;
        }
        Frame::new(image::imageops::resize(
            &self.image,
            width,
            height,
            FilterType::Lanczos3,
        ))
    }
}
