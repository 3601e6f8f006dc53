//! Game configuration (window, round rules, audio and shader paths). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Highest sphere subdivision order accepted from config. Order 7 is already 98k vertices.
pub const MAX_SPHERE_RESOLUTION: u32 = 7;

/// Game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Enable vsync (recommended to avoid tearing).
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Length of a round in milliseconds.
    #[serde(default = "default_round_time_ms")]
    pub round_time_ms: u64,
    /// Most organisms alive at once; also the size of the id pool.
    #[serde(default = "default_max_bacteria")]
    pub max_bacteria: u32,
    /// Subdivision order for every sphere.
    #[serde(default = "default_sphere_resolution")]
    pub sphere_resolution: u32,
    /// A spawn is attempted with probability `1 / spawn_frequency` per frame.
    #[serde(default = "default_spawn_frequency")]
    pub spawn_frequency: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_hit_sound")]
    pub hit_sound: PathBuf,
    #[serde(default = "default_miss_sound")]
    pub miss_sound: PathBuf,
    /// Directory with replacement `.wgsl` files.
    #[serde(default)]
    pub shader_dir: Option<PathBuf>,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_round_time_ms() -> u64 {
    300_999
}
fn default_max_bacteria() -> u32 {
    10
}
fn default_sphere_resolution() -> u32 {
    renderer::DEFAULT_ORDER
}
fn default_spawn_frequency() -> u32 {
    64
}
fn default_hit_sound() -> PathBuf {
    PathBuf::from("assets/hit.ogg")
}
fn default_miss_sound() -> PathBuf {
    PathBuf::from("assets/miss.ogg")
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            vsync: default_true(),
            round_time_ms: default_round_time_ms(),
            max_bacteria: default_max_bacteria(),
            sphere_resolution: default_sphere_resolution(),
            spawn_frequency: default_spawn_frequency(),
            seed: None,
            hit_sound: default_hit_sound(),
            miss_sound: default_miss_sound(),
            shader_dir: None,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match Self::parse(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str::<Self>(data).map(Self::clamped)
    }

    /// Pull out-of-range values back into range.
    pub fn clamped(mut self) -> Self {
        if self.sphere_resolution > MAX_SPHERE_RESOLUTION {
            log::warn!(
                "sphere_resolution {} is too high, using {}",
                self.sphere_resolution,
                MAX_SPHERE_RESOLUTION
            );
            self.sphere_resolution = MAX_SPHERE_RESOLUTION;
        }
        if self.spawn_frequency == 0 {
            log::warn!("spawn_frequency must be at least 1, using 1");
            self.spawn_frequency = 1;
        }
        self
    }

    pub fn round_time(&self) -> Duration {
        Duration::from_millis(self.round_time_ms)
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_struct_takes_all_defaults() {
        let config = GameConfig::parse("()").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.round_time(), Duration::from_millis(300_999));
    }

    #[test]
    fn partial_config_overrides_named_fields() {
        let config = GameConfig::parse("(max_bacteria: 3, seed: Some(7), vsync: false)").unwrap();
        assert_eq!(config.max_bacteria, 3);
        assert_eq!(config.seed, Some(7));
        assert!(!config.vsync);
        assert_eq!(config.spawn_frequency, 64);
    }

    #[test]
    fn oversized_sphere_resolution_is_clamped() {
        let config = GameConfig::parse("(sphere_resolution: 20, spawn_frequency: 0)").unwrap();
        assert_eq!(config.sphere_resolution, MAX_SPHERE_RESOLUTION);
        assert_eq!(config.spawn_frequency, 1);

        let config = GameConfig::parse("(sphere_resolution: 3)").unwrap();
        assert_eq!(config.sphere_resolution, 3);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(GameConfig::parse("(max_bacteria: \"lots\")").is_err());
    }
}
