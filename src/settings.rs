//! Persisted settings store, following XDG Base Directory standards.
//!
//! The engine persists exactly two scalars between runs: the last latitude
//! and longitude the user selected. They live under known keys in
//! `$XDG_CONFIG_HOME/daylightr/daylightr.toml`. A missing file is the
//! first-run case, not an error; invalid persisted values fall back to the
//! compiled-in default with a logged warning rather than failing startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILE};
use crate::ephemeris::Coordinate;

/// On-disk settings. All fields optional so partial or empty files load.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Last latitude selected by the user, decimal degrees.
    pub last_latitude: Option<f64>,
    /// Last longitude selected by the user, decimal degrees.
    pub last_longitude: Option<f64>,
}

impl Settings {
    /// Resolve the settings file path.
    ///
    /// Honors `XDG_CONFIG_HOME` when set, otherwise falls back to the
    /// platform config directory.
    pub fn settings_path() -> Result<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                dirs::config_dir().context("Could not determine config directory")
            })?;
        Ok(config_home.join(CONFIG_DIR_NAME).join(SETTINGS_FILE))
    }

    /// Load settings from the default path. Missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::settings_path()?)
    }

    /// Load settings from an explicit path. Missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// The persisted coordinate if present and valid, otherwise `default`.
    ///
    /// Out-of-range persisted values are treated like absence, with a
    /// warning, so a corrupted file never wedges startup.
    pub fn coordinate_or(&self, default: Coordinate) -> Coordinate {
        match (self.last_latitude, self.last_longitude) {
            (Some(latitude), Some(longitude)) => {
                let stored = Coordinate::new(latitude, longitude);
                if stored.is_valid() {
                    stored
                } else {
                    log_warning!(
                        "Ignoring out-of-range persisted coordinate ({stored}), using default"
                    );
                    default
                }
            }
            _ => default,
        }
    }

    /// Persist a coordinate to an explicit path, creating parent directories.
    pub fn remember_coordinate_at(path: &Path, coordinate: Coordinate) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let settings = Settings {
            last_latitude: Some(coordinate.latitude),
            last_longitude: Some(coordinate.longitude),
        };
        let content = toml::to_string_pretty(&settings).context("Failed to encode settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// Persist a coordinate to the default settings path.
    pub fn remember_coordinate(coordinate: Coordinate) -> Result<()> {
        Self::remember_coordinate_at(&Self::settings_path()?, coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from_path(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn coordinate_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("daylightr.toml");
        let coordinate = Coordinate::new(55.6761, 12.5683);

        Settings::remember_coordinate_at(&path, coordinate).unwrap();
        let settings = Settings::load_from_path(&path).unwrap();

        assert_eq!(settings.last_latitude, Some(55.6761));
        assert_eq!(settings.last_longitude, Some(12.5683));
        assert_eq!(
            settings.coordinate_or(Coordinate::new(0.0, 0.0)),
            coordinate
        );
    }

    #[test]
    fn absent_values_fall_back_to_default() {
        let default = Coordinate::new(51.4769, -0.0005);
        assert_eq!(Settings::default().coordinate_or(default), default);

        let partial = Settings {
            last_latitude: Some(40.0),
            last_longitude: None,
        };
        assert_eq!(partial.coordinate_or(default), default);
    }

    #[test]
    fn out_of_range_values_fall_back_to_default() {
        crate::logger::Log::set_enabled(false);
        let default = Coordinate::new(51.4769, -0.0005);
        let bogus = Settings {
            last_latitude: Some(412.0),
            last_longitude: Some(12.0),
        };
        assert_eq!(bogus.coordinate_or(default), default);
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daylightr.toml");
        std::fs::write(&path, "last_latitude = \"north\"").unwrap();
        assert!(Settings::load_from_path(&path).is_err());
    }

    #[test]
    #[serial]
    fn settings_path_honors_xdg_config_home() {
        let dir = tempfile::tempdir().unwrap();
        // set_var is unsafe with threads around; #[serial] keeps this isolated
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
        let path = Settings::settings_path().unwrap();
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };

        assert_eq!(path, dir.path().join("daylightr").join("daylightr.toml"));
    }
}
