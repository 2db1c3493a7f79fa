//! Display enumeration.
//!
//! Supplies the recorder with capture-region candidates. Enumeration must
//! degrade gracefully: when the platform query fails the manager still
//! exposes a single synthetic primary record, so a [`CaptureRegion`] is
//! always resolvable.

use display_info::DisplayInfo;

use crate::capture::frame::CaptureRegion;

/// Bounds used for the synthetic record when the platform query fails.
const FALLBACK_WIDTH: u32 = 1920;
const FALLBACK_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRecord {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub is_primary: bool,
    pub geometry: CaptureRegion,
}

pub struct DisplayManager {
    displays: Vec<DisplayRecord>,
    current: usize,
}

impl DisplayManager {
    /// Enumerate displays, falling back to a single synthetic primary
    /// record on failure. The current selection starts on the primary
    /// display, or the first one when none is marked primary.
    pub fn new() -> Self {
        let displays = match Self::detect() {
            Ok(displays) if !displays.is_empty() => displays,
            Ok(_) => {
                log::warn!("display query returned no monitors, using fallback record");
                vec![Self::fallback_record()]
            }
            Err(e) => {
                log::warn!("display query failed ({e}), using fallback record");
                vec![Self::fallback_record()]
            }
        };

        let current = displays.iter().position(|d| d.is_primary).unwrap_or(0);
        Self { displays, current }
    }

    fn detect() -> anyhow::Result<Vec<DisplayRecord>> {
        let monitors = DisplayInfo::all()?;
        let records = monitors
            .into_iter()
            .enumerate()
            .map(|(i, m)| DisplayRecord {
                id: m.id,
                name: format!("Display {}", i + 1),
                width: m.width,
                height: m.height,
                x: m.x,
                y: m.y,
                is_primary: m.is_primary,
                geometry: CaptureRegion {
                    left: m.x,
                    top: m.y,
                    width: m.width,
                    height: m.height,
                },
            })
            .collect();
        Ok(records)
    }

    fn fallback_record() -> DisplayRecord {
        DisplayRecord {
            id: 0,
            name: "Display 1".into(),
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
            x: 0,
            y: 0,
            is_primary: true,
            geometry: CaptureRegion {
                left: 0,
                top: 0,
                width: FALLBACK_WIDTH,
                height: FALLBACK_HEIGHT,
            },
        }
    }

    pub fn available_displays(&self) -> &[DisplayRecord] {
        &self.displays
    }

    pub fn current_display(&self) -> &DisplayRecord {
        &self.displays[self.current]
    }

    /// Select a display by id. Returns the new selection, or `None` when
    /// the id is unknown (selection is left unchanged).
    pub fn set_current_display(&mut self, id: u32) -> Option<&DisplayRecord> {
        match self.displays.iter().position(|d| d.id == id) {
            Some(index) => {
                self.current = index;
                Some(&self.displays[self.current])
            }
            None => None,
        }
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
