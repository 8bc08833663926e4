//! Blast Grid - a tile-based bomb-placing action game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, actors, blast propagation)
//! - `map`: Tile-map description consumed at level load
//! - `session`: Level progression, fixed-timestep driver and paint snapshots
//! - `settings`: Data-driven game balance
//! - `autopilot`: Seeded demo input driver

pub mod autopilot;
pub mod map;
pub mod session;
pub mod settings;
pub mod sim;

pub use map::{LoadError, MapDescription};
pub use session::{Frame, Game, SessionPhase};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Logic tick rate
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Paint rate of the render pass
    pub const PAINT_HZ: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Sprite cell in the actor sheet (taller than a tile so heads overlap the row above)
    pub const SPRITE_WIDTH: i32 = 32;
    pub const SPRITE_HEIGHT: i32 = 64;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 2.0; // pixels per tick
    pub const PLAYER_PADDING: i32 = 12;

    /// Bomb defaults
    pub const BOMB_FUSE_SECS: f32 = 3.0;
    pub const BOMB_RADIUS: u32 = 2;
    pub const BOMB_PADDING: i32 = 12;
    /// Added to a bomb's elapsed time when a blast reaches it
    pub const CHAIN_REACTION_BOOST_SECS: f32 = 1.0e6;

    /// Flame lifetime
    pub const FLAME_SECS: f32 = 0.5;

    /// Texture rows in the actor sheet
    pub const ROW_PLAYER: u32 = 0;
    pub const ROW_BOMB: u32 = 1;
    pub const ROW_GOAL: u32 = 2;
    pub const ROW_FLAME: u32 = 3;
}
