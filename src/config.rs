//! Configuration management for speakup-rs.
//!
//! Loads config from YAML files in standard locations. Every section falls
//! back to its defaults, so an empty file is a valid config.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/softsynth"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub backend: String,
    pub program: String,
    pub voice: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            backend: "espeak-ng".into(),
            program: "espeak-ng".into(),
            voice: "en".into(),
        }
    }
}

/// Initial voice parameters on the speakup scale.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub rate: u32,
    pub pitch: u32,
    pub frequency: u32,
    pub volume: u32,
    pub punctuation: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            rate: 2,
            pitch: 5,
            frequency: 5,
            volume: 5,
            punctuation: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub synth: SynthConfig,
    pub voice: VoiceConfig,
}

impl Config {
    /// Read the daemon's settings. An explicit `path` (the `--config` flag)
    /// is used as given. Otherwise the first existing file wins, looking in
    /// the working directory, then the user's `~/.config/speakup-rs/`, then
    /// the system-wide `/etc/speakup-rs/`. No file, an unreadable file or
    /// bad YAML all fall back to the built-in defaults with a log line.
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/speakup-rs/config.yaml")),
                Some(PathBuf::from("/etc/speakup-rs/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        // An empty document deserializes as unit, not as an empty map.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents)
    }
}
