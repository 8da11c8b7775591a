//! Viewer configuration loaded from TOML.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[picking]` (or is empty) is valid.

use std::path::{Path, PathBuf};

use meshpick_raytrace::PickMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading, writing or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window size.
    pub window: WindowConfig,
    /// Camera placement, projection and controls.
    pub camera: CameraConfig,
    /// Picking behaviour.
    pub picking: PickingConfig,
}

/// `[window]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
        }
    }
}

/// `[camera]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
    /// Movement speed in units per second.
    pub speed: f64,
    /// Time step applied per key press, in seconds.
    pub key_step: f64,
    /// Degrees of rotation per pixel of right-button drag.
    pub rotate_sensitivity: f64,
    /// Initial eye position.
    pub position: [f64; 3],
    /// Point the camera looks at.
    pub target: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            near: 0.01,
            far: 1000.0,
            speed: 2.5,
            key_step: 0.05,
            rotate_sensitivity: 0.2,
            position: [1.0, 2.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// `[picking]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Traversal used to resolve a pick.
    pub mode: PickMode,
    /// Distance a highlight overlay is lifted off its triangle.
    pub highlight_offset: f64,
    /// Scale and re-orient loaded meshes to fit the default view.
    pub fit_to_view: bool,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            mode: PickMode::FirstHit,
            highlight_offset: 0.01,
            fit_to_view: true,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Render as pretty-printed TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if self.window.width == 0 || self.window.height == 0 {
            return invalid("window", "width and height must be positive");
        }
        let cam = &self.camera;
        if !(cam.fovy > 0.0 && cam.fovy < 180.0) {
            return invalid("camera.fovy", "must be between 0 and 180 degrees");
        }
        if !(cam.near > 0.0) {
            return invalid("camera.near", "must be positive");
        }
        if !(cam.far > cam.near) {
            return invalid("camera.far", "must be greater than camera.near");
        }
        if cam.position == cam.target {
            return invalid("camera.position", "must differ from camera.target");
        }
        if !self.picking.highlight_offset.is_finite() {
            return invalid("picking.highlight_offset", "must be finite");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = ViewerConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = ViewerConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = ViewerConfig::from_toml_str("[picking]\nmode = \"nearest\"\n").unwrap();
        assert_eq!(config.picking.mode, PickMode::Nearest);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.camera, CameraConfig::default());

        let empty = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(empty, ViewerConfig::default());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = ViewerConfig::from_toml_str("[picking]\nmode = \"closest\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_ranges() {
        let err = ViewerConfig::from_toml_str("[camera]\nnear = 5.0\nfar = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "camera.far", .. }));

        let err = ViewerConfig::from_toml_str("[window]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "window", .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("meshpick-config-{}", std::process::id()));
        let path = dir.join("nested").join("viewer.toml");
        let mut config = ViewerConfig::default();
        config.window.width = 640;
        config.picking.mode = PickMode::Nearest;
        config.save(&path).unwrap();

        let loaded = ViewerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = ViewerConfig::load(Path::new("/nonexistent/meshpick.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/meshpick.toml"));
    }
}
