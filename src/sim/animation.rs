//! Cyclic frame sequencers and the shared animation registry
//!
//! Every distinct animation is advanced exactly once per simulation tick so
//! that all tiles and actors sharing a key stay visually in step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entity::{Direction, Motion};
use super::grid::TileKind;

/// An ordered sequence of sprite frames, each held for a fixed number of ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    frames: Vec<u32>,
    ticks_per_frame: u32,
    index: usize,
    remaining: u32,
}

impl Animation {
    pub fn new(frames: &[u32], ticks_per_frame: u32) -> Self {
        let ticks_per_frame = ticks_per_frame.max(1);
        Self {
            frames: frames.to_vec(),
            ticks_per_frame,
            index: 0,
            remaining: ticks_per_frame,
        }
    }

    /// Advance one tick, moving to the next frame once the current one has
    /// been shown for `ticks_per_frame` ticks
    pub fn advance(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        if self.remaining > 1 {
            self.remaining -= 1;
            return;
        }
        self.index = (self.index + 1) % self.frames.len();
        self.remaining = self.ticks_per_frame;
    }

    /// Active sprite frame
    pub fn current(&self) -> u32 {
        self.frames.get(self.index).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Rewind to the first frame
    pub fn reset(&mut self) {
        self.index = 0;
        self.remaining = self.ticks_per_frame;
    }
}

/// Lookup key for an animation in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimKey {
    Tile(TileKind),
    Player(Direction, Motion),
    Bomb,
    /// Flame sprite selected by its neighbour link mask (0..16)
    Flame(u8),
    Goal,
}

impl AnimKey {
    /// Used whenever an actor's state has no registered animation
    pub const IDLE: AnimKey = AnimKey::Player(Direction::Left, Motion::Stopped);

    fn is_tile(&self) -> bool {
        matches!(self, AnimKey::Tile(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("no animation registered for {0:?}")]
    Missing(AnimKey),
}

/// Ticks per frame for most animations
const DEFAULT_INTERVAL: u32 = 4;

const TILE_TABLE: &[(TileKind, &[u32], u32)] = &[
    (TileKind::Grass, &[1], 4),
    (TileKind::Stone, &[2], 4),
    (TileKind::Brick, &[3], 16),
    (TileKind::BreakableStone1, &[4], 4),
    (TileKind::BreakableStone2, &[5], 4),
];

const PLAYER_TABLE: &[(Direction, Motion, &[u32])] = &[
    (Direction::Left, Motion::Stopped, &[6]),
    (Direction::Right, Motion::Stopped, &[6]),
    (Direction::Up, Motion::Stopped, &[3]),
    (Direction::Down, Motion::Stopped, &[0]),
    (Direction::Left, Motion::Walking, &[6, 7, 6, 8]),
    (Direction::Right, Motion::Walking, &[6, 7, 6, 8]),
    (Direction::Up, Motion::Walking, &[3, 4, 3, 5]),
    (Direction::Down, Motion::Walking, &[0, 1, 0, 2]),
];

/// Number of distinct flame link masks (four directional bits)
const FLAME_SHAPES: u8 = 16;

/// Registry of every animation in use, keyed by what it animates
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    animations: HashMap<AnimKey, Animation>,
}

impl AnimationSet {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The game's animation table
    pub fn standard() -> Self {
        let mut set = Self::new();
        for &(kind, frames, interval) in TILE_TABLE {
            set.insert(AnimKey::Tile(kind), Animation::new(frames, interval));
        }
        for &(direction, motion, frames) in PLAYER_TABLE {
            set.insert(
                AnimKey::Player(direction, motion),
                Animation::new(frames, DEFAULT_INTERVAL),
            );
        }
        set.insert(AnimKey::Bomb, Animation::new(&[0, 1], DEFAULT_INTERVAL));
        set.insert(AnimKey::Goal, Animation::new(&[0], DEFAULT_INTERVAL));
        // Each flame shape flickers between its two sheet columns
        for mask in 0..FLAME_SHAPES {
            let frame = u32::from(mask);
            set.insert(
                AnimKey::Flame(mask),
                Animation::new(&[frame, frame + u32::from(FLAME_SHAPES)], DEFAULT_INTERVAL),
            );
        }
        set
    }

    pub fn insert(&mut self, key: AnimKey, animation: Animation) {
        self.animations.insert(key, animation);
    }

    pub fn get(&self, key: AnimKey) -> Result<&Animation, AnimationError> {
        self.animations.get(&key).ok_or(AnimationError::Missing(key))
    }

    /// Current frame for `key`, falling back to the idle animation
    pub fn frame(&self, key: AnimKey) -> u32 {
        match self.get(key) {
            Ok(anim) => anim.current(),
            Err(err) => {
                log::warn!("{}, using idle animation", err);
                self.get(AnimKey::IDLE).map(Animation::current).unwrap_or(0)
            }
        }
    }

    /// Advance every tile animation once
    pub fn advance_tiles(&mut self) {
        self.animations
            .iter_mut()
            .filter(|(key, _)| key.is_tile())
            .for_each(|(_, anim)| anim.advance());
    }

    /// Advance every actor animation once
    pub fn advance_actors(&mut self) {
        self.animations
            .iter_mut()
            .filter(|(key, _)| !key.is_tile())
            .for_each(|(_, anim)| anim.advance());
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
