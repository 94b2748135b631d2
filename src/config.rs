use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use egui::Color32;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error::ConfigError, view::DEFAULT_CLOCK_STEP};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub accent_color: [u8; 4],
    pub title: String,
    pub subtitle: String,
    pub ui_scale: f32,
    pub start_fullscreen: bool,
    pub show_info_banner: bool,
    pub animation_step: f32,
    pub projects_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            accent_color: [99, 102, 241, 255],
            title: "Project Portfolio Timeline".to_string(),
            subtitle: "Delivery roadmap".to_string(),
            ui_scale: 1.0,
            start_fullscreen: false,
            show_info_banner: true,
            animation_step: DEFAULT_CLOCK_STEP,
            projects_path: None,
        }
    }
}

impl ViewerConfig {
    pub fn accent(&self) -> Color32 {
        let [r, g, b, a] = self.accent_color;
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "ProjectTimeline", "project-timeline")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Reads `path`; a missing file is not an error and yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.normalize();
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Explicit path first, then the platform config dir. Errors are logged
    /// and replaced with defaults so the window always opens.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = explicit.map(Path::to_path_buf).or_else(Self::default_path);
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "config ignored");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let payload = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, payload).map_err(io_err)
    }

    fn normalize(&mut self) {
        self.ui_scale = if self.ui_scale.is_finite() {
            self.ui_scale.clamp(0.5, 3.0)
        } else {
            1.0
        };
        if !self.animation_step.is_finite() || self.animation_step < 0.0 {
            self.animation_step = DEFAULT_CLOCK_STEP;
        }
        if self.title.trim().is_empty() {
            self.title = Self::default().title;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "title": "Roadmap", "ui_scale": 9.0 }"#).unwrap();

        let config = ViewerConfig::load_from(&path).unwrap();
        assert_eq!(config.title, "Roadmap");
        assert_eq!(config.ui_scale, 3.0);
        assert!(config.show_info_banner);
        assert_eq!(config.animation_step, DEFAULT_CLOCK_STEP);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ title: nope").unwrap();
        assert!(matches!(
            ViewerConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(
            ViewerConfig::load_or_default(Some(&path)),
            ViewerConfig::default()
        );
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ViewerConfig {
            start_fullscreen: true,
            projects_path: Some(PathBuf::from("/tmp/projects.csv")),
            ..ViewerConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ViewerConfig::load_from(&path).unwrap(), config);
    }
}
