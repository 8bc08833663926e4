//! Game balance settings
//!
//! Loaded from a JSON file when one is given; anything missing or unreadable
//! falls back to the defaults in `crate::consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Timing ===
    /// Logic ticks per second
    pub tick_hz: u32,

    // === Player ===
    /// Pixels moved per tick
    pub player_speed: f32,
    /// Corner snap tolerance (pixels)
    pub player_padding: i32,

    // === Bombs ===
    /// Seconds from placement to detonation
    pub bomb_fuse_secs: f32,
    /// Blast reach in cells
    pub bomb_radius: u32,
    pub bomb_padding: i32,
    /// Seconds a flame burns
    pub flame_secs: f32,

    // === Sprites ===
    pub sprite_width: i32,
    pub sprite_height: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_hz: SIM_HZ,

            player_speed: PLAYER_SPEED,
            player_padding: PLAYER_PADDING,

            bomb_fuse_secs: BOMB_FUSE_SECS,
            bomb_radius: BOMB_RADIUS,
            bomb_padding: BOMB_PADDING,
            flame_secs: FLAME_SECS,

            sprite_width: SPRITE_WIDTH,
            sprite_height: SPRITE_HEIGHT,
        }
    }
}

impl Settings {
    /// Fixed timestep for the configured tick rate
    pub fn sim_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file, using defaults if it can't be read
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(err) => log::warn!("Invalid settings in {}: {}", path.display(), err),
            },
            Err(err) => log::warn!("Cannot read settings {}: {}", path.display(), err),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
