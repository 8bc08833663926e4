//! Explosion propagation
//!
//! A detonating bomb ignites its own cell, then walks outward along each axis
//! up to its radius. Each step either ignites the cell, passes through it, or
//! stops the walk in that direction.

use super::entity::{Direction, Entity, EntityId, Flame};
use super::level::Level;

impl Level {
    /// Detonate a bomb: remove it and spread fire from its cell
    pub fn explode(&mut self, id: EntityId) {
        let Some(index) = self.bombs.iter().position(|b| *b == Some(id)) else {
            return;
        };
        self.bombs[index] = None;
        let Some(Entity::Explosive(bomb)) = self.cast.remove(id) else {
            return;
        };

        let (x, y) = self.grid.index_to_coord(index);
        log::debug!("Bomb {} detonated at ({}, {}) radius {}", id, x, y, bomb.radius);

        self.try_ignite(x, y);
        for dir in Direction::ALL {
            self.ignite_column(x, y, bomb.radius, dir);
        }
    }

    fn ignite_column(&mut self, x: i32, y: i32, radius: u32, dir: Direction) {
        let (dx, dy) = dir.step();
        for step in 1..=radius as i32 {
            if !self.try_ignite(x + dx * step, y + dy * step) {
                break;
            }
        }
    }

    /// Set cell (x, y) alight. Returns whether the blast continues past it.
    ///
    /// - off the grid: stops
    /// - already burning: continues, unchanged
    /// - holding a bomb: continues, and that bomb goes off on its next update
    /// - fire-stopping tile: stops; a breakable one decays one step instead
    ///   of burning
    /// - anything else: a flame is spawned and the blast continues
    pub fn try_ignite(&mut self, x: i32, y: i32) -> bool {
        let Some(index) = self.grid.index_of(x, y) else {
            return false;
        };
        if self.fire[index].is_some() {
            return true;
        }
        if let Some(bomb_id) = self.bombs[index] {
            if let Some(bomb) = self.cast.explosive_mut(bomb_id) {
                bomb.boost();
            }
            return true;
        }

        let props = self.grid.tiles()[index].kind.props();
        if props.stops_fire {
            if props.breakable {
                if let Some(next) = self.grid.decay(index) {
                    log::debug!("Tile ({}, {}) decayed to {:?}", x, y, next);
                }
            }
            return false;
        }

        let (px, py) = self.grid.cell_origin(index);
        let flame_id = self.cast.next_entity_id();
        self.cast.add(Entity::Flame(Flame::new(
            flame_id,
            px as f32,
            py as f32,
            self.settings.flame_secs,
        )));
        self.fire[index] = Some(flame_id);
        self.set_fire_direction(index);
        true
    }

    /// Recompute the links of the flame at `index`, linking burning
    /// neighbours back to it
    pub(super) fn set_fire_direction(&mut self, index: usize) {
        let Some(id) = self.fire[index] else {
            return;
        };
        for dir in Direction::ALL {
            let neighbor = self.grid.neighbor(index, dir).and_then(|n| self.fire[n]);
            if let Some(other) = neighbor {
                if let Some(flame) = self.cast.flame_mut(other) {
                    flame.links.set(dir.opposite(), true);
                }
            }
            if let Some(flame) = self.cast.flame_mut(id) {
                flame.links.set(dir, neighbor.is_some());
            }
        }
    }

    /// Remove a burnt-out flame and unlink its neighbours
    pub fn extinguish(&mut self, id: EntityId) {
        let Some(index) = self.fire.iter().position(|f| *f == Some(id)) else {
            return;
        };
        self.fire[index] = None;
        self.cast.remove(id);
        for dir in Direction::ALL {
            let neighbor = self.grid.neighbor(index, dir).and_then(|n| self.fire[n]);
            if let Some(flame) = neighbor.and_then(|other| self.cast.flame_mut(other)) {
                flame.links.set(dir.opposite(), false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::map::MapDescription;
    use crate::settings::Settings;
    use crate::sim::animation::AnimationSet;
    use crate::sim::entity::{Category, Explosive};
    use crate::sim::grid::TileKind;
    use crate::sim::level::InputEvent;
    use crate::sim::level::tests::{TILE, bordered, level, run};

    /// Put a bomb at (x, y) directly, bypassing the player
    fn plant(lvl: &mut Level, x: i32, y: i32) -> EntityId {
        let id = lvl.cast.next_entity_id();
        lvl.cast.add(Entity::Explosive(Explosive::new(
            id,
            (x * TILE) as f32,
            (y * TILE) as f32,
            &Settings::default(),
        )));
        let index = lvl.grid.coord_to_index(x, y);
        lvl.bombs[index] = Some(id);
        id
    }

    fn burning(lvl: &Level) -> Vec<(i32, i32)> {
        (0..lvl.grid.len())
            .filter(|&i| lvl.fire[i].is_some())
            .map(|i| lvl.grid.index_to_coord(i))
            .collect()
    }

    fn links_at(lvl: &Level, x: i32, y: i32) -> u8 {
        let id = lvl.fire_at(x, y).unwrap();
        lvl.cast().flame(id).unwrap().links.mask()
    }

    #[test]
    fn test_open_field_cross() {
        let mut lvl = level(&bordered(11, 1, (1, 1), (9, 1)));
        let id = plant(&mut lvl, 5, 5);
        lvl.explode(id);
        let mut cells = burning(&lvl);
        cells.sort();
        let mut expected = vec![
            (5, 5),
            (5, 3),
            (5, 4),
            (5, 6),
            (5, 7),
            (3, 5),
            (4, 5),
            (6, 5),
            (7, 5),
        ];
        expected.sort();
        assert_eq!(cells, expected);
        assert_eq!(lvl.bomb_count(), 0);
        assert!(lvl.cast().explosive(id).is_none());
        assert_eq!(lvl.count(Category::Flame), 9);
    }

    #[test]
    fn test_ignites_at_most_4r_plus_1() {
        for radius in 0..6u32 {
            let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
            let id = plant(&mut lvl, 4, 4);
            lvl.cast.explosive_mut(id).unwrap().radius = radius;
            lvl.explode(id);
            let count = lvl.fire_count();
            assert!(count <= (4 * radius + 1) as usize, "radius {}: {}", radius, count);
            // Interior is 7x7 around the centre, so reach is capped at 3
            assert_eq!(count, (4 * radius.min(3) + 1) as usize);
        }
    }

    #[test]
    fn test_stone_stops_without_change() {
        let mut lvl = level(&bordered(7, 1, (1, 1), (5, 1)));
        lvl.grid.set_kind(3, 2, TileKind::Stone).unwrap();
        let id = plant(&mut lvl, 3, 3);
        lvl.explode(id);
        assert_eq!(lvl.grid.kind_at(3, 2), Some(TileKind::Stone));
        assert!(lvl.fire_at(3, 2).is_none());
        assert!(lvl.fire_at(3, 1).is_none());
    }

    #[test]
    fn test_breakable_decays_one_step_without_flame() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
        lvl.grid.set_kind(3, 3, TileKind::Brick).unwrap();
        lvl.grid.set_kind(5, 3, TileKind::BreakableStone1).unwrap();
        let id = plant(&mut lvl, 4, 3);
        lvl.explode(id);

        assert_eq!(lvl.grid.kind_at(3, 3), Some(TileKind::Grass));
        assert!(lvl.fire_at(3, 3).is_none());
        assert!(lvl.fire_at(2, 3).is_none(), "blast must stop at the brick");

        assert_eq!(lvl.grid.kind_at(5, 3), Some(TileKind::BreakableStone2));
        assert!(lvl.fire_at(5, 3).is_none());
        assert!(lvl.fire_at(6, 3).is_none());
    }

    #[test]
    fn test_burning_cell_passes_blast_through() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
        let first = plant(&mut lvl, 4, 4);
        lvl.cast.explosive_mut(first).unwrap().radius = 0;
        lvl.explode(first);
        let existing = lvl.fire_at(4, 4).unwrap();

        let second = plant(&mut lvl, 4, 6);
        lvl.cast.explosive_mut(second).unwrap().radius = 3;
        lvl.explode(second);
        // (4, 4) keeps its earlier flame, and the blast reaches past it
        assert_eq!(lvl.fire_at(4, 4), Some(existing));
        assert!(lvl.fire_at(4, 5).is_some());
        assert!(lvl.fire_at(4, 3).is_some());
        assert!(lvl.fire_at(4, 2).is_none());
    }

    #[test]
    fn test_chain_reaction_is_deferred() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 7)));
        let mut anims = AnimationSet::standard();
        let first = plant(&mut lvl, 3, 4);
        let second = plant(&mut lvl, 5, 4);
        lvl.explode(first);

        // The second bomb is primed but waits for its own update
        let primed = lvl.cast().explosive(second).unwrap();
        assert!(primed.is_expired());
        assert!(lvl.fire_at(5, 4).is_none());
        assert!(lvl.fire_at(6, 4).is_none());

        lvl.update(&mut anims, SIM_DT);
        assert!(lvl.cast().explosive(second).is_none());
        assert!(lvl.fire_at(5, 4).is_some());
        assert!(lvl.fire_at(7, 4).is_some());
    }

    #[test]
    fn test_off_grid_stops() {
        let map = MapDescription::from_cells(
            3,
            3,
            TILE,
            vec![1; 9],
            &[("player", 0.0, 0.0), ("goal", 64.0, 64.0)],
        );
        let mut lvl = level(&map);
        assert!(!lvl.try_ignite(-1, 0));
        assert!(!lvl.try_ignite(3, 1));
        let id = plant(&mut lvl, 1, 1);
        lvl.cast.explosive_mut(id).unwrap().radius = 5;
        lvl.explode(id);
        assert_eq!(lvl.fire_count(), 5);
    }

    #[test]
    fn test_flame_links_form_cross() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
        let id = plant(&mut lvl, 4, 4);
        lvl.explode(id);
        // left=1 right=2 up=4 down=8
        assert_eq!(links_at(&lvl, 4, 4), 0b1111);
        assert_eq!(links_at(&lvl, 4, 3), 0b1100);
        assert_eq!(links_at(&lvl, 4, 2), 0b1000);
        assert_eq!(links_at(&lvl, 3, 4), 0b0011);
        assert_eq!(links_at(&lvl, 6, 4), 0b0001);
    }

    #[test]
    fn test_extinguish_unlinks_neighbors() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
        let id = plant(&mut lvl, 4, 4);
        lvl.explode(id);
        let tip = lvl.fire_at(4, 2).unwrap();
        lvl.extinguish(tip);
        assert!(lvl.fire_at(4, 2).is_none());
        assert!(lvl.cast().flame(tip).is_none());
        assert_eq!(links_at(&lvl, 4, 3), 0b1000);
    }

    #[test]
    fn test_flames_burn_out() {
        let mut lvl = level(&bordered(9, 1, (1, 1), (7, 1)));
        let mut anims = AnimationSet::standard();
        let id = plant(&mut lvl, 4, 4);
        lvl.explode(id);
        run(&mut lvl, &mut anims, 29);
        assert_eq!(lvl.fire_count(), 9);
        run(&mut lvl, &mut anims, 2);
        assert_eq!(lvl.fire_count(), 0);
        assert_eq!(lvl.count(Category::Flame), 0);
    }

    /// 10x10 field with a 3-wide stone border, bomb of radius 2 dropped by the
    /// player at the centre of the 4x4 interior
    #[test]
    fn test_scenario_bordered_detonation() {
        let mut lvl = level(&bordered(10, 3, (4, 4), (6, 6)));
        let mut anims = AnimationSet::standard();
        lvl.handle_input(InputEvent::Action);
        let bomb = lvl.bomb_at(4, 4).unwrap();
        let fuse_ticks = (lvl.settings().bomb_fuse_secs / SIM_DT).ceil() as u32;

        run(&mut lvl, &mut anims, fuse_ticks - 2);
        assert!(lvl.cast().explosive(bomb).is_some());
        assert_eq!(lvl.fire_count(), 0);

        // Detonation happens within the next couple of ticks
        let mut ticks = fuse_ticks - 2;
        while lvl.cast().explosive(bomb).is_some() {
            run(&mut lvl, &mut anims, 1);
            ticks += 1;
            assert!(ticks <= fuse_ticks + 1);
        }
        let detonated_at = ticks;

        let mut cells = burning(&lvl);
        cells.sort();
        // Up and left hit the border after one cell, down and right reach two
        assert_eq!(cells, vec![(3, 4), (4, 3), (4, 4), (4, 5), (4, 6), (5, 4), (6, 4)]);
        for &(x, y) in &cells {
            assert!((3..=6).contains(&x) && (3..=6).contains(&y));
            assert_eq!(lvl.grid.kind_at(x, y), Some(TileKind::Grass));
        }
        assert!(lvl.died(), "player stood on the bomb");

        // Every flame burns out roughly 500ms after ignition
        run(&mut lvl, &mut anims, 28);
        assert_eq!(lvl.fire_count(), 7);
        run(&mut lvl, &mut anims, 3);
        assert_eq!(lvl.fire_count(), 0);

        let total = 300u32;
        run(&mut lvl, &mut anims, total - detonated_at - 31);
        assert_eq!(lvl.time_ticks(), u64::from(total));
        assert_eq!(lvl.bomb_count(), 0);
        assert_eq!(lvl.count(Category::Explosive), 0);
        assert_eq!(lvl.fire_count(), 0);
    }

    /// Brick at (3, 3) next to the bomb
    #[test]
    fn test_scenario_brick_next_to_blast() {
        let mut lvl = level(&bordered(8, 1, (4, 3), (6, 6)));
        let mut anims = AnimationSet::standard();
        lvl.grid.set_kind(3, 3, TileKind::Brick).unwrap();
        lvl.handle_input(InputEvent::Action);
        // Walk away downward before it goes off
        lvl.handle_input(InputEvent::Pressed(Direction::Down));
        run(&mut lvl, &mut anims, 32);
        lvl.handle_input(InputEvent::Pressed(Direction::Right));
        run(&mut lvl, &mut anims, 48);
        lvl.handle_input(InputEvent::Released(Direction::Right));

        let fuse_ticks = (lvl.settings().bomb_fuse_secs / SIM_DT).ceil() as u32;
        run(&mut lvl, &mut anims, fuse_ticks);
        assert_eq!(lvl.bomb_count(), 0);
        assert_eq!(lvl.grid.kind_at(3, 3), Some(TileKind::Brick.decayed().unwrap()));
        assert!(lvl.fire_at(3, 3).is_none());
        assert!(!lvl.died());
    }

    /// Walking into a cell set alight earlier in the same tick is fatal
    #[test]
    fn test_scenario_same_tick_burn() {
        let mut lvl = level(&bordered(9, 1, (2, 4), (7, 7)));
        let mut anims = AnimationSet::standard();
        // Bomb two cells right of the player, primed to go off next update
        let id = plant(&mut lvl, 4, 4);
        lvl.cast.explosive_mut(id).unwrap().radius = 1;
        lvl.cast.explosive_mut(id).unwrap().boost();
        // Player's centre is one step short of cell (3, 4)
        let player = lvl.player_id();
        lvl.cast.player_mut(player).unwrap().actor.pos.x = 78.0;
        lvl.handle_input(InputEvent::Pressed(Direction::Right));

        lvl.update(&mut anims, SIM_DT);
        assert!(lvl.fire_at(3, 4).is_some());
        assert_eq!(lvl.player().unwrap().actor.x(), 80.0);
        assert!(lvl.died());
    }
}
