//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (cells in row-major order, cast by depth)
//! - No rendering or platform dependencies

pub mod animation;
pub mod blast;
pub mod cast;
pub mod entity;
pub mod grid;
pub mod level;

pub use animation::{AnimKey, Animation, AnimationError, AnimationSet};
pub use cast::{Cast, Drawable, Footprint};
pub use entity::{
    Actor, ActorState, Category, Direction, Entity, EntityId, Explosive, Flame, Links, Marker,
    Motion, PassabilityProbe, Player, StateBit,
};
pub use grid::{GridError, Tile, TileGrid, TileKind, TileType};
pub use level::{InputEvent, Level};
