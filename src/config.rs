//! Configuration management for analysis defaults
//!
//! This module provides runtime configuration loading from JSON files so the
//! tunables of every new analyser (silence gate, peak-picking threshold,
//! minimum inter-onset interval) can be overridden without rebuilding the
//! library. Unset fields keep aubio's per-method defaults.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming the JSON config file
pub const CONFIG_ENV_VAR: &str = "AUBIO_WRAPPER_CONFIG";

/// Analysis window of the real-time preset
pub const REALTIME_WINDOW_SIZE: usize = 1024;

/// Hop size of the real-time preset
pub const REALTIME_HOP_SIZE: usize = 512;

static ENGINE_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::load);

/// Process-wide configuration, read once on first use
pub fn engine_config() -> &'static EngineConfig {
    &ENGINE_CONFIG
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tempo: TempoConfig,
    pub onset: OnsetConfig,
}

/// Overrides applied to new tempo trackers
///
/// `None` keeps the value aubio chose for the method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Silence gate in dB; hops quieter than this never carry a beat
    pub silence_db: Option<f32>,
    /// Peak-picking threshold applied to the onset detection function
    pub threshold: Option<f32>,
}

/// Overrides applied to new onset detectors
///
/// `None` keeps the value aubio chose for the method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    /// Silence gate in dB
    pub silence_db: Option<f32>,
    /// Peak-picking threshold
    pub threshold: Option<f32>,
    /// Minimum inter-onset interval in milliseconds
    pub minioi_ms: Option<f32>,
}

impl EngineConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the file named by `AUBIO_WRAPPER_CONFIG`
    ///
    /// Without the variable the built-in defaults are used silently.
    pub fn load() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_from_file(path),
            None => Self::default(),
        }
    }
}
