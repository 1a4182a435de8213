//! Configuration for the preview player
//!
//! Loaded from a JSON file at startup so platform selection, progress
//! cadence and export naming can be changed without recompiling. Missing
//! or invalid files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::Platform;

/// Complete player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Platform backend to use; `None` resolves from the compile target
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Whether prepared sessions mix with other audio on the device
    #[serde(default = "default_mix_audio_locally")]
    pub mix_audio_locally: bool,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub events: EventConfig,
}

fn default_mix_audio_locally() -> bool {
    true
}

/// Parameters of the simulated preview engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Progress events emitted per second while playing
    pub progress_updates_per_second: u32,
    /// Playback duration used when the background track cannot be probed
    pub default_track_duration_secs: f64,
    /// Preview window length right after prepare (capped at track duration)
    pub default_preview_duration_secs: f64,
    /// Read the background track's WAV header to find its duration
    pub probe_wav_headers: bool,
    /// Reject prepare when a track file does not exist
    pub require_existing_tracks: bool,
    /// Directory receiving exports without an explicit output path
    pub export_dir: PathBuf,
    pub export_file_prefix: String,
    pub export_extension: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            progress_updates_per_second: 60,
            default_track_duration_secs: 180.0,
            default_preview_duration_secs: 30.0,
            probe_wav_headers: true,
            require_existing_tracks: false,
            export_dir: std::env::temp_dir(),
            export_file_prefix: "mixed".to_string(),
            export_extension: "aac".to_string(),
        }
    }
}

/// Playback event channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast buffer size; slow subscribers skip the oldest events
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 128,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            platform: None,
            mix_audio_locally: default_mix_audio_locally(),
            simulation: SimulationConfig::default(),
            events: EventConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file doesn't exist or
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

    pub fn load() -> Self {
        Self::load_from_file("assets/preview_config.json")
    }

    /// Configured platform, falling back to the compile target.
    pub fn resolved_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }
}
