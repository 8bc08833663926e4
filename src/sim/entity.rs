//! Actors and grid-aligned movement
//!
//! An actor moves freely in pixel space but is nudged onto the nearest tile
//! boundary whenever it comes within `padding` pixels of one, so that a
//! player steering around a corner lines up with the corridor it turns into.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::animation::AnimKey;
use crate::consts::*;
use crate::settings::Settings;

/// Unique id of an entity within a level
pub type EntityId = u32;

/// Facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The four axis directions
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Grid step (dx, dy), y grows downward
    pub fn step(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Whether an actor is trying to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Motion {
    Walking,
    #[default]
    Stopped,
}

/// What kind of entity an actor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Explosive,
    Flame,
    Goal,
}

/// One flag of an actor's state, used for state queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBit {
    Facing(Direction),
    Moving(Motion),
}

/// Direction and motion of an actor. Exactly one of each is held at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActorState {
    pub direction: Direction,
    pub motion: Motion,
}

impl ActorState {
    pub fn new(direction: Direction, motion: Motion) -> Self {
        Self { direction, motion }
    }

    /// True when every bit in `bits` is currently set
    pub fn test(&self, bits: &[StateBit]) -> bool {
        bits.iter().all(|bit| match *bit {
            StateBit::Facing(dir) => self.direction == dir,
            StateBit::Moving(motion) => self.motion == motion,
        })
    }
}

/// Answers whether an actor may occupy a pixel.
///
/// `bypass` is the bomb the actor is still allowed to stand on; implementors
/// clear it once the actor probes a cell that does not hold that bomb.
pub trait PassabilityProbe {
    fn is_passable(&self, bypass: &mut Option<EntityId>, x: i32, y: i32) -> bool;
}

/// Positional state shared by every entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Top-left corner of the actor's tile footprint, in pixels
    pub pos: Vec2,
    pub state: ActorState,
    pub flip_x: bool,
    pub texture_row: u32,
    /// Pixels moved per tick while walking
    pub rate: f32,
    /// Snap tolerance and probe inset, in pixels
    pub padding: i32,
}

impl Actor {
    pub fn new(x: f32, y: f32, texture_row: u32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            state: ActorState::default(),
            flip_x: false,
            texture_row,
            rate: 0.0,
            padding: 0,
        }
    }

    pub fn x(&self) -> f32 {
        self.pos.x
    }

    pub fn y(&self) -> f32 {
        self.pos.y
    }

    /// Face a new direction; sprites are mirrored when facing right
    pub fn set_direction(&mut self, dir: Direction) {
        self.state.direction = dir;
        self.flip_x = dir == Direction::Right;
    }

    pub fn set_movement(&mut self, motion: Motion) {
        self.state.motion = motion;
    }

    pub fn test_state(&self, bits: &[StateBit]) -> bool {
        self.state.test(bits)
    }

    /// Pixel at the centre of the actor's tile footprint
    pub fn center(&self, tile_width: i32, tile_height: i32) -> (i32, i32) {
        (
            (self.pos.x + tile_width as f32 / 2.0) as i32,
            (self.pos.y + tile_height as f32 / 2.0) as i32,
        )
    }

    /// Round `v` to the nearest multiple of `size` if it is within padding
    fn clamped(&self, v: f32, size: i32) -> i32 {
        let size = size as f32;
        let clamped = (v / size + 0.5).floor() * size;
        let diff = (clamped - v).abs();
        if diff as i32 <= self.padding {
            clamped as i32
        } else {
            v as i32
        }
    }

    /// Advance one tick of movement if walking.
    ///
    /// When several directions could apply the check order is down, up,
    /// right, left.
    pub fn step<P: PassabilityProbe>(
        &mut self,
        probe: &P,
        bypass: &mut Option<EntityId>,
        tile_width: i32,
        tile_height: i32,
    ) {
        if !self.test_state(&[StateBit::Moving(Motion::Walking)]) {
            return;
        }
        let rate = self.rate;
        match self.state.direction {
            Direction::Down => self.move_vertical(rate, tile_height - 1, probe, bypass, tile_width),
            Direction::Up => self.move_vertical(-rate, 0, probe, bypass, tile_width),
            Direction::Right => {
                self.move_horizontal(rate, tile_width - 1, probe, bypass, tile_height)
            }
            Direction::Left => self.move_horizontal(-rate, 0, probe, bypass, tile_height),
            Direction::None => {}
        }
    }

    /// `lead` is the offset from the new position to the leading edge pixel
    fn move_vertical<P: PassabilityProbe>(
        &mut self,
        delta: f32,
        lead: i32,
        probe: &P,
        bypass: &mut Option<EntityId>,
        tile_width: i32,
    ) {
        let x = self.clamped(self.pos.x, tile_width);
        let y = (self.pos.y + delta) as i32;
        let edge = y + lead;
        if probe.is_passable(bypass, x + self.padding, edge)
            && probe.is_passable(bypass, x + tile_width - self.padding, edge)
        {
            // Only move forward once the cross axis is aligned
            if x == self.pos.x as i32 {
                self.pos.y = y as f32;
            }
            self.pos.x = x as f32;
        }
    }

    fn move_horizontal<P: PassabilityProbe>(
        &mut self,
        delta: f32,
        lead: i32,
        probe: &P,
        bypass: &mut Option<EntityId>,
        tile_height: i32,
    ) {
        let y = self.clamped(self.pos.y, tile_height);
        let x = (self.pos.x + delta) as i32;
        let edge = x + lead;
        if probe.is_passable(bypass, edge, y + self.padding)
            && probe.is_passable(bypass, edge, y + tile_height - self.padding)
        {
            if y == self.pos.y as i32 {
                self.pos.x = x as f32;
            }
            self.pos.y = y as f32;
        }
    }
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub actor: Actor,
    /// Most recently placed bomb, which the player may still walk over
    pub own_bomb: Option<EntityId>,
}

impl Player {
    pub fn new(id: EntityId, x: f32, y: f32, settings: &Settings) -> Self {
        let mut actor = Actor::new(x, y, ROW_PLAYER);
        actor.state = ActorState::new(Direction::Down, Motion::Stopped);
        actor.rate = settings.player_speed;
        actor.padding = settings.player_padding;
        Self {
            id,
            actor,
            own_bomb: None,
        }
    }

    pub fn step<P: PassabilityProbe>(&mut self, probe: &P, tile_width: i32, tile_height: i32) {
        self.actor
            .step(probe, &mut self.own_bomb, tile_width, tile_height);
    }
}

/// A placed bomb counting down to detonation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosive {
    pub id: EntityId,
    pub actor: Actor,
    /// Seconds since placement
    pub elapsed: f32,
    /// Fuse length in seconds
    pub expires: f32,
    /// Blast reach in cells
    pub radius: u32,
}

impl Explosive {
    pub fn new(id: EntityId, x: f32, y: f32, settings: &Settings) -> Self {
        let mut actor = Actor::new(x, y, ROW_BOMB);
        actor.padding = settings.bomb_padding;
        Self {
            id,
            actor,
            elapsed: 0.0,
            expires: settings.bomb_fuse_secs,
            radius: settings.bomb_radius,
        }
    }

    pub fn add_time(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Push the bomb toward detonation when a blast reaches it
    pub fn boost(&mut self) {
        self.elapsed += CHAIN_REACTION_BOOST_SECS;
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.expires
    }
}

/// Which neighbouring cells also hold a flame (rendering only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Links {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Links {
    pub fn get(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::None => false,
        }
    }

    pub fn set(&mut self, dir: Direction, linked: bool) {
        match dir {
            Direction::Up => self.up = linked,
            Direction::Down => self.down = linked,
            Direction::Left => self.left = linked,
            Direction::Right => self.right = linked,
            Direction::None => {}
        }
    }

    /// Sprite selector: left=1, right=2, up=4, down=8
    pub fn mask(&self) -> u8 {
        u8::from(self.left)
            | u8::from(self.right) << 1
            | u8::from(self.up) << 2
            | u8::from(self.down) << 3
    }
}

/// A short-lived blast cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flame {
    pub id: EntityId,
    pub actor: Actor,
    pub elapsed: f32,
    pub expires: f32,
    pub links: Links,
}

impl Flame {
    pub fn new(id: EntityId, x: f32, y: f32, lifetime: f32) -> Self {
        Self {
            id,
            actor: Actor::new(x, y, ROW_FLAME),
            elapsed: 0.0,
            expires: lifetime,
            links: Links::default(),
        }
    }

    pub fn add_time(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.expires
    }
}

/// A static marker such as the level goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub id: EntityId,
    pub actor: Actor,
}

impl Marker {
    pub fn goal(id: EntityId, x: f32, y: f32) -> Self {
        Self {
            id,
            actor: Actor::new(x, y, ROW_GOAL),
        }
    }
}

/// Any entity held by the cast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entity {
    Player(Player),
    Explosive(Explosive),
    Flame(Flame),
    Goal(Marker),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Player(p) => p.id,
            Entity::Explosive(b) => b.id,
            Entity::Flame(f) => f.id,
            Entity::Goal(m) => m.id,
        }
    }

    pub fn actor(&self) -> &Actor {
        match self {
            Entity::Player(p) => &p.actor,
            Entity::Explosive(b) => &b.actor,
            Entity::Flame(f) => &f.actor,
            Entity::Goal(m) => &m.actor,
        }
    }

    pub fn actor_mut(&mut self) -> &mut Actor {
        match self {
            Entity::Player(p) => &mut p.actor,
            Entity::Explosive(b) => &mut b.actor,
            Entity::Flame(f) => &mut f.actor,
            Entity::Goal(m) => &mut m.actor,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Entity::Player(_) => Category::Player,
            Entity::Explosive(_) => Category::Explosive,
            Entity::Flame(_) => Category::Flame,
            Entity::Goal(_) => Category::Goal,
        }
    }

    /// Animation that draws this entity in its current state
    pub fn anim_key(&self) -> AnimKey {
        match self {
            Entity::Player(p) => AnimKey::Player(p.actor.state.direction, p.actor.state.motion),
            Entity::Explosive(_) => AnimKey::Bomb,
            Entity::Flame(f) => AnimKey::Flame(f.links.mask()),
            Entity::Goal(_) => AnimKey::Goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: i32 = 32;

    /// Open field with optional solid cells and bombs, keyed by cell
    struct Field {
        solid: Vec<(i32, i32)>,
        bombs: Vec<((i32, i32), EntityId)>,
    }

    impl PassabilityProbe for Field {
        fn is_passable(&self, bypass: &mut Option<EntityId>, x: i32, y: i32) -> bool {
            if x < 0 || y < 0 {
                return false;
            }
            let cell = (x / TILE, y / TILE);
            if let Some((_, id)) = self.bombs.iter().find(|(c, _)| *c == cell) {
                if *bypass == Some(*id) {
                    return true;
                }
                *bypass = None;
                return false;
            }
            *bypass = None;
            !self.solid.contains(&cell)
        }
    }

    fn open() -> Field {
        Field {
            solid: Vec::new(),
            bombs: Vec::new(),
        }
    }

    fn walker(x: f32, y: f32, dir: Direction) -> Actor {
        let mut actor = Actor::new(x, y, 0);
        actor.rate = 2.0;
        actor.padding = 12;
        actor.set_direction(dir);
        actor.set_movement(Motion::Walking);
        actor
    }

    #[test]
    fn test_set_direction_flips_only_right() {
        let mut actor = Actor::new(0.0, 0.0, 0);
        actor.set_direction(Direction::Right);
        assert!(actor.flip_x);
        actor.set_direction(Direction::Left);
        assert!(!actor.flip_x);
        assert_eq!(actor.state.direction, Direction::Left);
    }

    #[test]
    fn test_state_query_requires_all_bits() {
        let state = ActorState::new(Direction::Up, Motion::Walking);
        assert!(state.test(&[StateBit::Facing(Direction::Up)]));
        assert!(state.test(&[
            StateBit::Facing(Direction::Up),
            StateBit::Moving(Motion::Walking)
        ]));
        assert!(!state.test(&[
            StateBit::Facing(Direction::Up),
            StateBit::Moving(Motion::Stopped)
        ]));
        assert!(state.test(&[]));
    }

    #[test]
    fn test_stopped_actor_does_not_move() {
        let mut actor = walker(64.0, 64.0, Direction::Down);
        actor.set_movement(Motion::Stopped);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(64.0, 64.0));
    }

    #[test]
    fn test_aligned_actor_moves_by_rate() {
        let mut actor = walker(64.0, 64.0, Direction::Down);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(64.0, 66.0));

        let mut actor = walker(64.0, 64.0, Direction::Left);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(62.0, 64.0));
    }

    #[test]
    fn test_snaps_cross_axis_before_advancing() {
        // 6px right of the column boundary, within padding
        let mut actor = walker(70.0, 64.0, Direction::Down);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(64.0, 64.0));
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(64.0, 66.0));
    }

    #[test]
    fn test_no_snap_outside_padding() {
        let mut actor = walker(80.0, 64.0, Direction::Up);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(80.0, 62.0));
    }

    #[test]
    fn test_blocked_by_solid_cell() {
        let field = Field {
            solid: vec![(2, 3)],
            bombs: Vec::new(),
        };
        // Bottom edge touches row 3 on the next step
        let mut actor = walker(64.0, 64.0, Direction::Down);
        actor.step(&field, &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::new(64.0, 64.0));
    }

    #[test]
    fn test_blocked_by_grid_edge() {
        let mut actor = walker(0.0, 0.0, Direction::Up);
        actor.step(&open(), &mut None, TILE, TILE);
        assert_eq!(actor.pos, Vec2::ZERO);
    }

    #[test]
    fn test_own_bomb_bypass_then_cleared() {
        let field = Field {
            solid: Vec::new(),
            bombs: vec![((2, 2), 9)],
        };
        let mut bypass = Some(9);
        // Standing on the bomb, step up while still inside its cell
        let mut actor = walker(64.0, 70.0, Direction::Up);
        actor.step(&field, &mut bypass, TILE, TILE);
        assert_eq!(actor.pos.y, 68.0);
        assert_eq!(bypass, Some(9));

        // Leaving downward probes row 3, which clears the bypass
        let mut actor = walker(64.0, 64.0, Direction::Down);
        actor.step(&field, &mut bypass, TILE, TILE);
        assert_eq!(bypass, None);
        assert_eq!(actor.pos.y, 66.0);

        // Now the bomb blocks like any other
        let mut actor = walker(64.0, 96.0, Direction::Up);
        actor.step(&field, &mut bypass, TILE, TILE);
        assert_eq!(actor.pos.y, 96.0);
    }

    #[test]
    fn test_foreign_bomb_blocks() {
        let field = Field {
            solid: Vec::new(),
            bombs: vec![((3, 2), 4)],
        };
        let mut actor = walker(64.0, 64.0, Direction::Right);
        actor.step(&field, &mut None, TILE, TILE);
        assert_eq!(actor.pos.x, 64.0);
    }

    #[test]
    fn test_links_mask_bits() {
        let mut links = Links::default();
        assert_eq!(links.mask(), 0);
        links.set(Direction::Left, true);
        links.set(Direction::Down, true);
        assert_eq!(links.mask(), 0b1001);
        links.set(Direction::Left, false);
        assert!(!links.get(Direction::Left));
        assert_eq!(links.mask(), 0b1000);
    }

    #[test]
    fn test_bomb_boost_expires() {
        let mut bomb = Explosive::new(1, 0.0, 0.0, &Settings::default());
        bomb.add_time(0.1);
        assert!(!bomb.is_expired());
        bomb.boost();
        assert!(bomb.is_expired());
    }

    #[test]
    fn test_anim_key_per_variant() {
        let settings = Settings::default();
        let player = Entity::Player(Player::new(1, 0.0, 0.0, &settings));
        assert_eq!(
            player.anim_key(),
            AnimKey::Player(Direction::Down, Motion::Stopped)
        );
        let mut flame = Flame::new(2, 0.0, 0.0, 0.5);
        flame.links.set(Direction::Up, true);
        assert_eq!(Entity::Flame(flame).anim_key(), AnimKey::Flame(4));
        assert_eq!(Entity::Goal(Marker::goal(3, 0.0, 0.0)).category(), Category::Goal);
    }
}
