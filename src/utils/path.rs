//! Output file naming and placement.
//!
//! Raw recordings are written under a `temp_` name and only promoted to a
//! `timelapse_` name by the conversion step, so an interrupted run never
//! leaves a file that looks like a finished timelapse.

use std::env::var_os;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::app_name;
use crate::error::Result;

pub const TEMP_PREFIX: &str = "temp_";
pub const TIMELAPSE_PREFIX: &str = "timelapse_";

fn home_path() -> Option<String> {
    #[cfg(not(target_os = "windows"))]
    let home = var_os("HOME").map(|home| home.to_string_lossy().to_string());

    #[cfg(target_os = "windows")]
    let home = var_os("HOMEDRIVE").and_then(|drive| {
        var_os("HOMEPATH")
            .map(|home| format!("{}{}", drive.to_string_lossy(), home.to_string_lossy()))
    });

    home
}

/// `~/<app name>/`, created on demand. Falls back to the working directory
/// when no home directory can be resolved.
pub fn default_output_dir() -> Result<PathBuf> {
    let dir = match home_path() {
        Some(home) => Path::new(&home).join(app_name()),
        None => PathBuf::from("."),
    };
    DirBuilder::new().recursive(true).create(&dir)?;
    Ok(dir)
}

/// File name for a raw recording started at `now`.
pub fn temp_recording_name(now: DateTime<Local>) -> String {
    format!("{}{}.mp4", TEMP_PREFIX, now.format("%H%M%S_%d%m%y"))
}

/// The timelapse file that a raw recording converts into: same directory,
/// `temp_` swapped for `timelapse_`.
pub fn timelapse_path_for(raw: &Path) -> PathBuf {
    let file_name = raw
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let renamed = match file_name.strip_prefix(TEMP_PREFIX) {
        Some(rest) => format!("{TIMELAPSE_PREFIX}{rest}"),
        None => format!("{TIMELAPSE_PREFIX}{file_name}"),
    };
    raw.with_file_name(renamed)
}
