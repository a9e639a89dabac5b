//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelsyncError, ReelsyncResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trim and playback defaults.
    pub playback: PlaybackDefaults,

    /// Audio/video synchronization settings.
    pub sync: SyncConfig,

    /// Overlay creation bounds and drop positions.
    pub overlays: OverlayDefaults,

    /// Overlay animation timings.
    pub animation: AnimationTimings,

    /// Transform executor settings.
    pub transform: TransformConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Playback parameters applied when media becomes ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Initial trim window length; the trim end starts at
    /// `min(duration, default_trim_secs)`.
    pub default_trim_secs: f64,

    /// Re-seek to the pre-transform position when a filtered rendition lands.
    pub resume_after_transform: bool,
}

/// Synchronization settings for the secondary audio track.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum tolerated divergence between the audio target and the
    /// secondary position before the secondary is paused and re-seeked.
    pub drift_tolerance_secs: f64,
}

/// Inclusive numeric bounds for a user-adjustable size control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl SizeBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Overlay creation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayDefaults {
    /// Font size bounds for text overlays.
    pub text_size: SizeBounds,

    /// Pixel dimension bounds for image overlays.
    pub image_size: SizeBounds,

    /// Where a new text overlay is dropped.
    pub text_origin: (f64, f64),

    /// Where a new image overlay is dropped.
    pub image_origin: (f64, f64),
}

/// Animation cycle lengths, in seconds of visible time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTimings {
    /// Opacity ramp 0 -> 1 on entrance.
    pub fade_in_secs: f64,

    /// Text scale cycle 1.0 -> 1.5 -> 1.0.
    pub bounce_period_secs: f64,

    /// Text color cycle red -> blue -> red.
    pub color_period_secs: f64,

    /// Image rotation cycle 0 -> 180 -> 0 degrees.
    pub rotate_period_secs: f64,
}

/// External transform tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// ffmpeg binary used to render filtered media.
    pub ffmpeg_path: String,

    /// ffprobe binary used to query media durations.
    pub ffprobe_path: String,

    /// Directory where rendered artifacts are written.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsync_sync_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            default_trim_secs: 10.0,
            resume_after_transform: true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_tolerance_secs: 0.25,
        }
    }
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        Self {
            text_size: SizeBounds {
                min: 10.0,
                max: 40.0,
                default: 18.0,
            },
            image_size: SizeBounds {
                min: 30.0,
                max: 150.0,
                default: 65.0,
            },
            text_origin: (100.0, 100.0),
            image_origin: (150.0, 150.0),
        }
    }
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            fade_in_secs: 1.0,
            bounce_period_secs: 1.0,
            color_period_secs: 1.0,
            rotate_period_secs: 2.0,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            output_dir: default_cache_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// Problems are logged, so call this after logging is initialized or use
    /// [`AppConfig::try_load`] to report them yourself.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            Self::default()
        })
    }

    /// Load config from the standard location.
    ///
    /// A missing file yields the defaults; an unreadable, unparsable or
    /// invalid one is an error.
    pub fn try_load() -> ReelsyncResult<Self> {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load and validate config from `path`.
    pub fn load_from(path: &Path) -> ReelsyncResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            ReelsyncError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate().map_err(|e| {
            ReelsyncError::config(format!("invalid config at {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> ReelsyncResult<()> {
        if !(self.playback.default_trim_secs > 0.0) {
            return Err(ReelsyncError::config(
                "playback.default_trim_secs must be positive",
            ));
        }
        if !(self.sync.drift_tolerance_secs >= 0.0) {
            return Err(ReelsyncError::config(
                "sync.drift_tolerance_secs must be non-negative",
            ));
        }
        for (label, bounds) in [
            ("overlays.text_size", &self.overlays.text_size),
            ("overlays.image_size", &self.overlays.image_size),
        ] {
            if bounds.min > bounds.max || !bounds.contains(bounds.default) {
                return Err(ReelsyncError::config(format!(
                    "{label}: default {} outside [{}, {}]",
                    bounds.default, bounds.min, bounds.max
                )));
            }
        }
        let a = &self.animation;
        if [
            a.fade_in_secs,
            a.bounce_period_secs,
            a.color_period_secs,
            a.rotate_period_secs,
        ]
        .iter()
        .any(|secs| !(*secs > 0.0))
        {
            return Err(ReelsyncError::config("animation timings must be positive"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsync").join("config.json")
}

/// Default directory for rendered artifacts.
fn default_cache_dir() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".cache")
        });
    base.join("reelsync").join("renders")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.overlays.text_size.min, 10.0);
        assert_eq!(config.overlays.image_size.max, 150.0);
        assert_eq!(config.playback.default_trim_secs, 10.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "sync": { "drift_tolerance_secs": 0.1 } }"#).unwrap();
        assert!((config.sync.drift_tolerance_secs - 0.1).abs() < 1e-12);
        assert_eq!(config.animation.rotate_period_secs, 2.0);
        assert_eq!(config.transform.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let mut config = AppConfig::default();
        config.overlays.text_size.default = 50.0;
        assert!(matches!(
            config.validate(),
            Err(ReelsyncError::Config { .. })
        ));

        let mut config = AppConfig::default();
        config.animation.fade_in_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_reports_bad_files() {
        let dir = std::env::temp_dir().join(format!("reelsync-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let broken = dir.join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&broken),
            Err(ReelsyncError::Config { .. })
        ));

        let invalid = dir.join("invalid.json");
        std::fs::write(&invalid, r#"{ "playback": { "default_trim_secs": 0.0 } }"#).unwrap();
        let err = AppConfig::load_from(&invalid).unwrap_err();
        assert!(err.to_string().contains("default_trim_secs"));

        let good = dir.join("good.json");
        std::fs::write(&good, r#"{ "sync": { "drift_tolerance_secs": 0.5 } }"#).unwrap();
        assert_eq!(AppConfig::load_from(&good).unwrap().sync.drift_tolerance_secs, 0.5);

        assert!(matches!(
            AppConfig::load_from(&dir.join("absent.json")),
            Err(ReelsyncError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
