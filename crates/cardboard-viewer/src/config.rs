//! Viewer configuration, loaded from a TOML file.
//!
//! Every section is `#[serde(default)]`, so a partial file only overrides
//! the fields it names. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use winit::dpi::LogicalSize;

use cardboard_engine::logging::LoggingConfig;
use cardboard_engine::window::RuntimeConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CARDBOARD_CONFIG";

/// Config file looked up in the working directory when `CONFIG_ENV` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "cardboard.toml";

pub const DEFAULT_FONT: &str =
    "https://cdn.jsdelivr.net/npm/dejavu-fonts-ttf@2.37.3/ttf/DejaVuSans.ttf";

pub const DEFAULT_ICON_TEMPLATE: &str =
    "https://cdn.jsdelivr.net/npm/remixicon@4.6.0/icons/{icon}-line.svg";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── schema ────────────────────────────────────────────────────────────────

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub rig: RigConfig,
    pub assets: AssetConfig,
    pub sensor: SensorConfig,
    /// `env_logger` filter; overrides `RUST_LOG` when set.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial logical width.
    pub width: f64,
    /// Initial logical height.
    pub height: f64,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "cardboard".to_string(),
            width: 1280.0,
            height: 720.0,
            fullscreen: false,
        }
    }
}

/// Stereo rig geometry. Distances are world units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub eye_separation: f32,
    pub camera_distance: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            eye_separation: 0.1,
            camera_distance: 0.5,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Asset locations: `http(s)://` URLs or filesystem paths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub font: String,
    /// Icon location with an `{icon}` placeholder, e.g. `icons/{icon}.svg`.
    pub icon_template: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            icon_template: DEFAULT_ICON_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// No orientation source; the head stays still.
    #[default]
    None,
    /// JSON orientation datagrams on a UDP socket.
    Udp,
    /// Pointer position emulates head heading and tilt.
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,
    /// Socket address the `udp` sensor binds.
    pub bind: String,
    /// Wait for a click, tap or Space/Enter before requesting the sensor.
    pub require_gesture: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::None,
            bind: "0.0.0.0:5555".to_string(),
            require_gesture: false,
        }
    }
}

impl ViewerConfig {
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.clone(),
            initial_size: LogicalSize::new(self.window.width, self.window.height),
            fullscreen: self.window.fullscreen,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log_filter.clone(),
            ..LoggingConfig::default()
        }
    }
}

// ── loading ───────────────────────────────────────────────────────────────

/// Where the active configuration came from.
///
/// Loading happens before the logger exists, so the outcome is reported
/// afterwards through [`ConfigOrigin::log`].
#[derive(Debug)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    Invalid(ConfigError),
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => log::info!("loaded config from {}", path.display()),
            ConfigOrigin::Missing(path) => {
                log::info!("no config at {}, using defaults", path.display())
            }
            ConfigOrigin::Invalid(err) => log::warn!("{err}; using defaults"),
        }
    }
}

/// `$CARDBOARD_CONFIG` if set, else `./cardboard.toml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Parses a TOML document; missing fields take their defaults.
pub fn parse(text: &str) -> Result<ViewerConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Loads config from a specific file.
pub fn load_from_path(path: &Path) -> Result<ViewerConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads config from [`config_path`]. Never fails: a missing file yields
/// defaults, an unreadable or invalid one yields defaults plus the error.
pub fn load() -> (ViewerConfig, ConfigOrigin) {
    let path = config_path();
    match load_from_path(&path) {
        Ok(config) => (config, ConfigOrigin::File(path)),
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            (ViewerConfig::default(), ConfigOrigin::Missing(path))
        }
        Err(e) => (ViewerConfig::default(), ConfigOrigin::Invalid(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rig_constants() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.rig.eye_separation, 0.1);
        assert_eq!(cfg.rig.camera_distance, 0.5);
        assert_eq!(cfg.rig.fov_y_degrees, 45.0);
        assert_eq!(cfg.rig.near, 0.1);
        assert_eq!(cfg.rig.far, 1000.0);
        assert_eq!(cfg.sensor.kind, SensorKind::None);
        assert!(!cfg.sensor.require_gesture);
        assert!(cfg.assets.icon_template.contains("{icon}"));
        assert!(cfg.log_filter.is_none());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(parse("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse(
            r#"
            log_filter = "debug"

            [rig]
            eye_separation = 0.064

            [sensor]
            kind = "udp"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rig.eye_separation, 0.064);
        assert_eq!(cfg.rig.camera_distance, 0.5);
        assert_eq!(cfg.sensor.kind, SensorKind::Udp);
        assert_eq!(cfg.sensor.bind, "0.0.0.0:5555");
        assert_eq!(cfg.window, WindowConfig::default());
        assert_eq!(cfg.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_sensor_kind_is_rejected() {
        assert!(parse("[sensor]\nkind = \"gyro\"").is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_from_path(Path::new("/nonexistent/cardboard.toml")).unwrap_err();
        match err {
            ConfigError::Read { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn runtime_config_carries_window_section() {
        let cfg = parse("[window]\ntitle = \"vr\"\nfullscreen = true").unwrap();
        let rt = cfg.runtime_config();
        assert_eq!(rt.title, "vr");
        assert!(rt.fullscreen);
        assert_eq!(rt.initial_size.width, 1280.0);
    }
}
