//! Simple configuration for the chime demo
//!
//! Read from a `key=value` text file; missing or unreadable files give the
//! defaults.

use chime_audio::{EngineConfig, MAX_LISTENERS};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub master_volume: f32,
    pub listener_count: u32,
    /// Preferred output sample rate (device default when unset)
    pub sample_rate: Option<u32>,
    /// Narration file, relative to the working directory
    pub narrator: PathBuf,
    /// Amplitude of the frequency sweep
    pub sweep_amplitude: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            listener_count: MAX_LISTENERS,
            sample_rate: None,
            narrator: PathBuf::from("narrator.flac"),
            sweep_amplitude: 0.2,
        }
    }
}

impl AppConfig {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be read.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chime")
            .join("config.txt")
    }

    /// Engine settings derived from this config
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate,
            listener_count: self.listener_count,
            master_volume: self.master_volume,
        }
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "master_volume" => match value.parse::<f32>() {
                    Ok(volume) if volume >= 0.0 => config.master_volume = volume,
                    _ => tracing::warn!(value, "ignoring invalid master_volume"),
                },
                "listener_count" => match value.parse::<u32>() {
                    Ok(count) => config.listener_count = count.min(MAX_LISTENERS),
                    Err(_) => tracing::warn!(value, "ignoring invalid listener_count"),
                },
                "sample_rate" => match value.parse::<u32>() {
                    Ok(rate) if rate > 0 => config.sample_rate = Some(rate),
                    _ => tracing::warn!(value, "ignoring invalid sample_rate"),
                },
                "narrator" => {
                    if !value.is_empty() {
                        config.narrator = PathBuf::from(value);
                    }
                }
                "sweep_amplitude" => match value.parse::<f32>() {
                    Ok(amplitude) => config.sweep_amplitude = amplitude,
                    Err(_) => tracing::warn!(value, "ignoring invalid sweep_amplitude"),
                },
                _ => {} // Ignore unknown keys
            }
        }

        config
    }
}
