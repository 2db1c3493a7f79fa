//! Persisted user settings.
//!
//! A small JSON file remembering the last output directory and display
//! selection. Loading never fails: a missing or corrupt file yields the
//! defaults so the recorder always starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::path::default_output_dir;

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub last_path: PathBuf,
    pub last_display: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            last_path: default_output_dir().unwrap_or_else(|_| PathBuf::from(".")),
            last_display: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Settings {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("settings file {} unreadable ({e}), using defaults", path.display());
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// `<output dir>/settings.json`.
pub fn default_location() -> Result<PathBuf> {
    Ok(default_output_dir()?.join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let path = std::env::temp_dir().join("lapsify_test_settings.json");
        let settings = Settings {
            last_path: PathBuf::from("/videos"),
            last_display: Some(3),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let path = std::env::temp_dir().join("lapsify_test_settings_corrupt.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_settings_fall_back_to_defaults() {
        let path = std::env::temp_dir().join("lapsify_test_settings_missing.json");
        let _ = fs::remove_file(&path);
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
