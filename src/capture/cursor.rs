//! Cursor overlay compositing.
//!
//! The recorded screen image does not include the pointer, so the capture
//! loop blends a fixed 24x24 arrow glyph onto each frame at the pointer's
//! position, translated into the frame's local coordinate space. The glyph
//! is built once and shared read-only across all composite calls.

use device_query::{DeviceQuery, DeviceState};
use image::{Rgba, RgbaImage, imageops};
use once_cell::sync::Lazy;

use crate::capture::frame::{CaptureRegion, Frame};
use crate::error::{Error, Result};

pub const GLYPH_SIZE: u32 = 24;

static CURSOR_GLYPH: Lazy<RgbaImage> = Lazy::new(build_cursor_glyph);

/// Seam for the global pointer position, so compositing can be exercised
/// without a windowing system.
pub trait PointerSource: Send {
    /// Global pointer position in screen coordinates.
    fn position(&self) -> Result<(i32, i32)>;
}

/// Pointer source backed by `device_query`.
#[derive(Debug, Default)]
pub struct DeviceQueryPointer;

impl PointerSource for DeviceQueryPointer {
    fn position(&self) -> Result<(i32, i32)> {
        let state = DeviceState::checked_new()
            .ok_or_else(|| Error::PointerQuery("input device state unavailable".into()))?;
        Ok(state.get_mouse().coords)
    }
}

/// The shared cursor raster.
pub fn cursor_glyph() -> &'static RgbaImage {
    &CURSOR_GLYPH
}

/// Blend the cursor glyph onto `frame`, top-left anchored at the pointer's
/// position local to `region`. Pointers outside the region leave the frame
/// untouched. The frame is consumed and returned, never shared.
pub fn composite_cursor(mut frame: Frame, region: &CaptureRegion, pointer: (i32, i32)) -> Frame {
    let (px, py) = pointer;
    if !region.contains(px, py) {
        return frame;
    }
    let local_x = i64::from(px - region.left);
    let local_y = i64::from(py - region.top);
    imageops::overlay(frame.image_mut(), cursor_glyph(), local_x, local_y);
    frame
}

/// A classic arrow pointer, black fill with a white outline, transparent
/// everywhere else. Drawn procedurally so the crate ships no asset file.
fn build_cursor_glyph() -> RgbaImage {
    const BLACK: Rgba<u8> = Rgba([16, 16, 16, 255]);
    const WHITE: Rgba<u8> = Rgba([240, 240, 240, 255]);

    let mut glyph = RgbaImage::new(GLYPH_SIZE, GLYPH_SIZE);

    // arrow head, widening two pixels every three rows
    for y in 0..18u32 {
        let span = (y * 2 / 3).min(10);
        for x in 0..=span {
            let edge = x == 0 || x == span || y == 17;
            glyph.put_pixel(x, y, if edge { WHITE } else { BLACK });
        }
    }

    // tail
    for y in 14..22u32 {
        for x in 4..=6u32 {
            let edge = x == 4 || x == 6 || y == 21;
            glyph.put_pixel(x, y, if edge { WHITE } else { BLACK });
        }
    }

    glyph
}
