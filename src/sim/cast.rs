//! Entity registry
//!
//! Owns every visible entity, kept in paint order: ascending y, then x, so
//! that actors lower on screen overlap the ones behind them.

use serde::{Deserialize, Serialize};

use super::animation::AnimationSet;
use super::entity::{Category, Entity, EntityId, Explosive, Flame, Player};

/// Sprite size versus tile size. Sprites are anchored at their bottom-left
/// so anything taller than a tile overhangs the row above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: i32,
    pub height: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Footprint {
    pub fn new(sprite_width: i32, sprite_height: i32, tile_width: i32, tile_height: i32) -> Self {
        Self {
            width: sprite_width,
            height: sprite_height,
            offset_x: sprite_width - tile_width,
            offset_y: sprite_height - tile_height,
        }
    }

    /// Collision box size (the part of the sprite standing on the grid)
    pub fn size(&self) -> (f32, f32) {
        (
            (self.width - self.offset_x) as f32,
            (self.height - self.offset_y) as f32,
        )
    }
}

/// What the paint pass needs to draw one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub id: EntityId,
    pub category: Category,
    pub x: f32,
    pub y: f32,
    pub frame: u32,
    pub texture_row: u32,
    pub flip_x: bool,
}

#[derive(Debug, Clone)]
pub struct Cast {
    actors: Vec<Entity>,
    footprint: Footprint,
    next_id: EntityId,
}

impl Cast {
    pub fn new(footprint: Footprint) -> Self {
        Self {
            actors: Vec::new(),
            footprint,
            next_id: 1,
        }
    }

    /// Allocate an id for a new entity
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn add(&mut self, entity: Entity) {
        self.actors.push(entity);
        self.sort();
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.actors.iter().position(|e| e.id() == id)?;
        Some(self.actors.remove(index))
    }

    /// Restore paint order
    pub fn sort(&mut self) {
        self.actors.sort_by(|a, b| {
            let (a, b) = (a.actor(), b.actor());
            a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x()))
        });
    }

    /// Per-tick housekeeping: re-sort and advance actor animations
    pub fn update(&mut self, animations: &mut AnimationSet) {
        self.sort();
        animations.advance_actors();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.actors.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.actors.iter_mut().find(|e| e.id() == id)
    }

    pub fn player(&self, id: EntityId) -> Option<&Player> {
        match self.get(id)? {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self, id: EntityId) -> Option<&mut Player> {
        match self.get_mut(id)? {
            Entity::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn explosive(&self, id: EntityId) -> Option<&Explosive> {
        match self.get(id)? {
            Entity::Explosive(b) => Some(b),
            _ => None,
        }
    }

    pub fn explosive_mut(&mut self, id: EntityId) -> Option<&mut Explosive> {
        match self.get_mut(id)? {
            Entity::Explosive(b) => Some(b),
            _ => None,
        }
    }

    pub fn flame(&self, id: EntityId) -> Option<&Flame> {
        match self.get(id)? {
            Entity::Flame(f) => Some(f),
            _ => None,
        }
    }

    pub fn flame_mut(&mut self, id: EntityId) -> Option<&mut Flame> {
        match self.get_mut(id)? {
            Entity::Flame(f) => Some(f),
            _ => None,
        }
    }

    /// Whether the collision boxes of two entities intersect
    pub fn overlaps(&self, a: EntityId, b: EntityId) -> bool {
        let (Some(a), Some(b)) = (self.get(a), self.get(b)) else {
            return false;
        };
        let (w, h) = self.footprint.size();
        let (a, b) = (a.actor().pos, b.actor().pos);
        a.x < b.x + w && b.x < a.x + w && a.y < b.y + h && b.y < a.y + h
    }

    /// Entities in paint order with their current frames
    pub fn draw_list(&self, animations: &AnimationSet) -> Vec<Drawable> {
        self.actors
            .iter()
            .map(|entity| {
                let actor = entity.actor();
                Drawable {
                    id: entity.id(),
                    category: entity.category(),
                    x: actor.x(),
                    y: actor.y(),
                    frame: animations.frame(entity.anim_key()),
                    texture_row: actor.texture_row,
                    flip_x: actor.flip_x,
                }
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.actors.iter()
    }

    pub fn count(&self, category: Category) -> usize {
        self.actors
            .iter()
            .filter(|e| e.category() == category)
            .count()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
