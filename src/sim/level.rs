//! Level state and the per-tick update protocol
//!
//! A level owns the tile grid, the cast, and two sparse per-cell indexes
//! (bombs and flames). Blast propagation lives in `blast.rs`.

use serde::{Deserialize, Serialize};

use super::animation::{AnimKey, AnimationSet};
use super::cast::{Cast, Drawable, Footprint};
use super::entity::{
    Category, Direction, Entity, EntityId, Explosive, Marker, Motion, PassabilityProbe, Player,
    StateBit,
};
use super::grid::{TileGrid, TileKind};
use crate::map::{
    KIND_OBJECTS, KIND_TILES, LoadError, MapDescription, OBJECT_LAYER, TILE_LAYER,
};
use crate::settings::Settings;

/// Edge-triggered player input, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Pressed(Direction),
    Released(Direction),
    /// Place a bomb
    Action,
}

/// Grid plus bomb occupancy, as seen by a moving actor
struct Terrain<'a> {
    grid: &'a TileGrid,
    bombs: &'a [Option<EntityId>],
}

impl PassabilityProbe for Terrain<'_> {
    fn is_passable(&self, bypass: &mut Option<EntityId>, x: i32, y: i32) -> bool {
        let Ok(index) = self.grid.pixel_to_index(x, y) else {
            return false;
        };
        if let Some(bomb) = self.bombs[index] {
            if *bypass == Some(bomb) {
                return true;
            }
            *bypass = None;
            return false;
        }
        *bypass = None;
        self.grid.tiles()[index].kind.props().passable
    }
}

#[derive(Debug, Clone)]
pub struct Level {
    pub(super) grid: TileGrid,
    /// Live bomb per cell
    pub(super) bombs: Vec<Option<EntityId>>,
    /// Burning flame per cell
    pub(super) fire: Vec<Option<EntityId>>,
    pub(super) cast: Cast,
    pub(super) settings: Settings,
    player: EntityId,
    goal: EntityId,
    /// Animation-resolved sprite per cell, for the tile render layer
    tile_frames: Vec<u32>,
    description: Vec<String>,
    time_ticks: u64,
    won: bool,
    died: bool,
}

impl Level {
    /// Build a level from a map description
    pub fn from_map(map: &MapDescription, settings: &Settings) -> Result<Self, LoadError> {
        let invalid = || LoadError::InvalidDimensions {
            width: map.width,
            height: map.height,
            tile_width: map.tile_width,
            tile_height: map.tile_height,
        };
        if map.width <= 0 || map.height <= 0 || map.tile_width <= 0 || map.tile_height <= 0 {
            return Err(invalid());
        }
        // Cell count and pixel extents must fit the grid's index and pixel types
        let cells = map.width.checked_mul(map.height).ok_or_else(invalid)?;
        let max_x = map.width.checked_mul(map.tile_width).ok_or_else(invalid)?;
        let max_y = map.height.checked_mul(map.tile_height).ok_or_else(invalid)?;
        let expected = usize::try_from(cells).map_err(|_| invalid())?;
        let tile_layer = map.layer(KIND_TILES, TILE_LAYER)?;
        if tile_layer.data.len() != expected {
            return Err(LoadError::LayerSize {
                expected,
                actual: tile_layer.data.len(),
            });
        }
        let kinds = tile_layer
            .data
            .iter()
            .enumerate()
            .map(|(index, &id)| TileKind::from_id(id).ok_or(LoadError::UnknownTile { id, index }))
            .collect::<Result<Vec<_>, _>>()?;
        let grid = TileGrid::new(map.width, map.height, map.tile_width, map.tile_height, kinds);

        let footprint = Footprint::new(
            settings.sprite_width,
            settings.sprite_height,
            map.tile_width,
            map.tile_height,
        );
        let mut cast = Cast::new(footprint);
        let mut player = None;
        let mut goal = None;
        let (max_x, max_y) = (max_x as f32, max_y as f32);
        for obj in &map.layer(KIND_OBJECTS, OBJECT_LAYER)?.objects {
            let in_bounds = obj.x >= 0.0 && obj.y >= 0.0 && obj.x < max_x && obj.y < max_y;
            match obj.kind.as_str() {
                "player" | "goal" if !in_bounds => {
                    return Err(LoadError::SpawnOutOfBounds {
                        kind: obj.kind.clone(),
                        x: obj.x,
                        y: obj.y,
                    });
                }
                "player" => {
                    let id = cast.next_entity_id();
                    cast.add(Entity::Player(Player::new(id, obj.x, obj.y, settings)));
                    player = Some(id);
                }
                "goal" => {
                    let id = cast.next_entity_id();
                    cast.add(Entity::Goal(Marker::goal(id, obj.x, obj.y)));
                    goal = Some(id);
                }
                other => log::debug!("Ignoring map object of type {:?}", other),
            }
        }
        let player = player.ok_or(LoadError::MissingSpawn("player"))?;
        let goal = goal.ok_or(LoadError::MissingSpawn("goal"))?;

        log::info!(
            "Loaded level {}x{} ({}x{} px tiles)",
            map.width,
            map.height,
            map.tile_width,
            map.tile_height
        );

        Ok(Self {
            grid,
            bombs: vec![None; expected],
            fire: vec![None; expected],
            cast,
            settings: settings.clone(),
            player,
            goal,
            tile_frames: vec![0; expected],
            description: map.description(),
            time_ticks: 0,
            won: false,
            died: false,
        })
    }

    /// Advance the level by one fixed timestep
    pub fn update(&mut self, animations: &mut AnimationSet, dt: f32) {
        self.time_ticks += 1;

        // Tile animations and the render layer
        animations.advance_tiles();
        self.refresh_tile_frames(animations);

        // Bombs: tick fuses, detonate expired ones
        let live: Vec<EntityId> = self.bombs.iter().flatten().copied().collect();
        for id in live {
            let expired = match self.cast.explosive_mut(id) {
                Some(bomb) => {
                    bomb.add_time(dt);
                    bomb.is_expired()
                }
                None => continue,
            };
            if expired {
                self.explode(id);
            }
        }

        // Flames: burn out, otherwise refresh their links
        let burning: Vec<(usize, EntityId)> = self
            .fire
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.map(|id| (i, id)))
            .collect();
        for (index, id) in burning {
            let expired = match self.cast.flame_mut(id) {
                Some(flame) => {
                    flame.add_time(dt);
                    flame.is_expired()
                }
                None => continue,
            };
            if expired {
                self.extinguish(id);
            } else {
                self.set_fire_direction(index);
            }
        }

        self.cast.update(animations);
        self.move_player();

        if self.is_actor_burned(self.player) {
            if !self.died {
                log::info!("Player burned at tick {}", self.time_ticks);
            }
            self.died = true;
        }
        if self.cast.overlaps(self.player, self.goal) {
            if !self.won {
                log::info!("Goal reached at tick {}", self.time_ticks);
            }
            self.won = true;
        }
    }

    /// Apply one input event to the player. Events without a direction are
    /// ignored.
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Action => {
                self.add_bomb_from_actor(self.player);
                return;
            }
            InputEvent::Pressed(Direction::None) | InputEvent::Released(Direction::None) => {
                log::debug!("Ignoring {:?}", event);
                return;
            }
            _ => {}
        }
        let Some(player) = self.cast.player_mut(self.player) else {
            return;
        };
        match event {
            InputEvent::Pressed(dir) => {
                player.actor.set_direction(dir);
                player.actor.set_movement(Motion::Walking);
            }
            InputEvent::Released(dir) => {
                if player.actor.test_state(&[StateBit::Facing(dir)]) {
                    player.actor.set_movement(Motion::Stopped);
                }
            }
            InputEvent::Action => {}
        }
    }

    /// Place a bomb on the cell under an actor's centre.
    ///
    /// Does nothing if the cell already holds a bomb or a flame. A player
    /// remembers the bomb so it can walk off it.
    pub fn add_bomb_from_actor(&mut self, id: EntityId) -> Option<EntityId> {
        let (cx, cy) = self
            .cast
            .get(id)?
            .actor()
            .center(self.grid.tile_width(), self.grid.tile_height());
        let index = match self.grid.pixel_to_index(cx, cy) {
            Ok(index) => index,
            Err(err) => {
                log::warn!("Cannot place bomb: {}", err);
                return None;
            }
        };
        if self.bombs[index].is_some() || self.fire[index].is_some() {
            return None;
        }

        let (px, py) = self.grid.cell_origin(index);
        let bomb_id = self.cast.next_entity_id();
        self.cast.add(Entity::Explosive(Explosive::new(
            bomb_id,
            px as f32,
            py as f32,
            &self.settings,
        )));
        self.bombs[index] = Some(bomb_id);
        if let Some(player) = self.cast.player_mut(id) {
            player.own_bomb = Some(bomb_id);
        }
        log::debug!("Bomb {} placed at cell {:?}", bomb_id, self.grid.index_to_coord(index));
        Some(bomb_id)
    }

    /// Whether actor `id` may occupy pixel (x, y)
    pub fn test_pixel_passable(&mut self, id: EntityId, x: i32, y: i32) -> bool {
        let terrain = Terrain {
            grid: &self.grid,
            bombs: &self.bombs,
        };
        match self.cast.get_mut(id) {
            Some(Entity::Player(player)) => terrain.is_passable(&mut player.own_bomb, x, y),
            Some(_) => terrain.is_passable(&mut None, x, y),
            None => false,
        }
    }

    fn move_player(&mut self) {
        let terrain = Terrain {
            grid: &self.grid,
            bombs: &self.bombs,
        };
        let (tw, th) = (self.grid.tile_width(), self.grid.tile_height());
        if let Some(player) = self.cast.player_mut(self.player) {
            player.step(&terrain, tw, th);
        }
    }

    /// Whether the cell under an actor's centre is on fire
    fn is_actor_burned(&self, id: EntityId) -> bool {
        let Some(entity) = self.cast.get(id) else {
            return false;
        };
        let (cx, cy) = entity
            .actor()
            .center(self.grid.tile_width(), self.grid.tile_height());
        self.grid
            .pixel_to_index(cx, cy)
            .map(|i| self.fire[i].is_some())
            .unwrap_or(false)
    }

    fn refresh_tile_frames(&mut self, animations: &AnimationSet) {
        for (frame, tile) in self.tile_frames.iter_mut().zip(self.grid.tiles()) {
            *frame = animations.frame(AnimKey::Tile(tile.kind));
        }
    }

    /// Entities in paint order
    pub fn draw_list(&self, animations: &AnimationSet) -> Vec<Drawable> {
        self.cast.draw_list(animations)
    }

    pub fn tile_frames(&self) -> &[u32] {
        &self.tile_frames
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn cast(&self) -> &Cast {
        &self.cast
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn goal_id(&self) -> EntityId {
        self.goal
    }

    pub fn player(&self) -> Option<&Player> {
        self.cast.player(self.player)
    }

    pub fn bomb_at(&self, x: i32, y: i32) -> Option<EntityId> {
        self.grid.index_of(x, y).and_then(|i| self.bombs[i])
    }

    pub fn fire_at(&self, x: i32, y: i32) -> Option<EntityId> {
        self.grid.index_of(x, y).and_then(|i| self.fire[i])
    }

    pub fn bomb_count(&self) -> usize {
        self.bombs.iter().flatten().count()
    }

    pub fn fire_count(&self) -> usize {
        self.fire.iter().flatten().count()
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn died(&self) -> bool {
        self.died
    }

    /// Entities of one category currently in the cast
    pub fn count(&self, category: Category) -> usize {
        self.cast.count(category)
    }
}
