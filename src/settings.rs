//! Game settings and preferences
//!
//! Stored as a JSON file next to the binary. A missing or unreadable file
//! falls back to the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_ECHOES, PER_SECOND, SPAWN_RATE};

/// Settings that cannot drive a game
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("num_players must be a positive even number, got {0}")]
    EchoCount(usize),

    #[error("per_second and spawn_rate must be non-zero")]
    ZeroRate,

    #[error("screen size {0}x{1} is too small")]
    Screen(u32, u32),

    #[error("{name} must be within 0.0..=1.0, got {value}")]
    Volume { name: &'static str, value: f32 },
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Rounds ===
    /// Units on screen at once (live player + echoes); must be even
    pub num_players: usize,
    /// Simulation frames per second
    pub per_second: usize,
    /// Seconds of recording an echo loses per round
    pub spawn_rate: usize,
    /// Rounds the headless runner plays before exiting
    pub rounds: u32,
    /// Seed for screenshake and shop rolls
    pub seed: u64,
    /// New live units ride their own bullets
    pub minotaur: bool,

    // === Display ===
    /// Viewport size in pixels
    pub screen: (u32, u32),
    /// Camera shake when the live player is hit
    pub screen_shake: bool,
    /// Reduced motion (disables shake)
    pub reduced_motion: bool,

    // === Audio ===
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Assets ===
    /// Level image; a walled arena is generated when unset
    pub level_path: Option<PathBuf>,
    /// Shop item catalogue; the built-in one is used when unset
    pub catalogue_path: Option<PathBuf>,
    /// Where the runner writes its final frame
    pub snapshot_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_players: DEFAULT_ECHOES,
            per_second: PER_SECOND,
            spawn_rate: SPAWN_RATE,
            rounds: 3,
            seed: 0x5EED,
            minotaur: false,

            screen: (1000, 700),
            screen_shake: true,
            reduced_motion: false,

            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,

            level_path: None,
            catalogue_path: None,
            snapshot_path: None,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Frames per echo-lifetime step
    pub fn fps(&self) -> usize {
        self.per_second * self.spawn_rate
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_players == 0 || self.num_players % 2 != 0 {
            return Err(ConfigError::EchoCount(self.num_players));
        }
        if self.per_second == 0 || self.spawn_rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        let (w, h) = self.screen;
        if w < 2 || h < 2 {
            return Err(ConfigError::Screen(w, h));
        }
        for (name, value) in [
            ("master_volume", self.master_volume),
            ("sfx_volume", self.sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Volume { name, value });
            }
        }
        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
