use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    calibration::CalibrationSet,
    cursor::DEFAULT_MAX_RANGE,
    timeline::{DEFAULT_SAMPLE_RATE_HZ, MAX_RATE, MIN_RATE},
    InsoleError, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub playback: PlaybackConfig,
    pub live: LiveConfig,
    pub calibration: CalibrationSet,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(?path, "loading configuration");
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.max_range == 0 {
            return Err(InsoleError::InvalidConfig(
                "window.max_range must be at least 1".into(),
            ));
        }
        if self.playback.sample_rate_hz == 0 {
            return Err(InsoleError::InvalidConfig(
                "playback.sample_rate_hz must be at least 1".into(),
            ));
        }
        if !(MIN_RATE..=MAX_RATE).contains(&self.playback.default_rate) {
            return Err(InsoleError::InvalidConfig(format!(
                "playback.default_rate must be between {MIN_RATE} and {MAX_RATE}, got {}",
                self.playback.default_rate
            )));
        }
        if self.live.capacity == 0 {
            return Err(InsoleError::InvalidConfig(
                "live.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Limits of the visible window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub max_range: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_range: DEFAULT_MAX_RANGE,
        }
    }
}

/// Playback clock and transport button settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Rate the source was sampled at; one tick per sample at 1x.
    pub sample_rate_hz: u32,
    /// Samples jumped by the skip forward / backward buttons.
    pub skip_step: usize,
    pub default_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            skip_step: 10,
            default_rate: 1.0,
        }
    }
}

/// Live stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Number of most recent samples kept for the live view.
    pub capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}
