//! Tile grid and tile material properties

use serde::{Deserialize, Serialize};

use super::entity::Direction;

/// Tile kinds, numbered as in map files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Grass,
    Stone,
    Brick,
    BreakableStone1,
    BreakableStone2,
}

/// Material properties of a tile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileType {
    pub passable: bool,
    pub breakable: bool,
    pub stops_fire: bool,
    /// What a breakable tile decays into when a blast reaches it
    pub next: Option<TileKind>,
}

impl TileKind {
    pub const ALL: [TileKind; 5] = [
        TileKind::Grass,
        TileKind::Stone,
        TileKind::Brick,
        TileKind::BreakableStone1,
        TileKind::BreakableStone2,
    ];

    /// Map-file tile id
    pub fn id(self) -> u32 {
        match self {
            TileKind::Grass => 1,
            TileKind::Stone => 2,
            TileKind::Brick => 3,
            TileKind::BreakableStone1 => 4,
            TileKind::BreakableStone2 => 5,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        TileKind::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub const fn props(self) -> TileType {
        match self {
            TileKind::Grass => TileType {
                passable: true,
                breakable: false,
                stops_fire: false,
                next: None,
            },
            TileKind::Stone => TileType {
                passable: false,
                breakable: false,
                stops_fire: true,
                next: None,
            },
            TileKind::Brick => TileType {
                passable: false,
                breakable: true,
                stops_fire: true,
                next: Some(TileKind::Grass),
            },
            TileKind::BreakableStone1 => TileType {
                passable: false,
                breakable: true,
                stops_fire: true,
                next: Some(TileKind::BreakableStone2),
            },
            TileKind::BreakableStone2 => TileType {
                passable: false,
                breakable: true,
                stops_fire: true,
                next: Some(TileKind::Grass),
            },
        }
    }

    /// Kind after one blast, or `None` if this kind does not break
    pub fn decayed(self) -> Option<TileKind> {
        let props = self.props();
        if props.breakable { props.next } else { None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("pixel ({x}, {y}) is outside the grid")]
    OutOfRange { x: i32, y: i32 },
    #[error("cell index {0} is outside the grid")]
    IndexOutOfRange(usize),
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub kind: TileKind,
}

/// Row-major grid of tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tile_width: i32,
    tile_height: i32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build a grid from row-major kinds. `kinds.len()` must be `width * height`.
    pub fn new(
        width: i32,
        height: i32,
        tile_width: i32,
        tile_height: i32,
        kinds: impl IntoIterator<Item = TileKind>,
    ) -> Self {
        let tiles: Vec<Tile> = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Tile {
                x: i as i32 % width,
                y: i as i32 / width,
                kind,
            })
            .collect();
        debug_assert_eq!(tiles.len(), (width * height) as usize);
        Self {
            width,
            height,
            tile_width,
            tile_height,
            tiles,
        }
    }

    /// Grid of a single kind
    pub fn filled(
        width: i32,
        height: i32,
        tile_width: i32,
        tile_height: i32,
        kind: TileKind,
    ) -> Self {
        let count = (width * height).max(0) as usize;
        Self::new(width, height, tile_width, tile_height, std::iter::repeat_n(kind, count))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_width(&self) -> i32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> i32 {
        self.tile_height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn coord_to_index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn index_to_coord(&self, index: usize) -> (i32, i32) {
        let i = index as i32;
        (i % self.width, i / self.width)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Index of cell (x, y), if on the grid
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y).then(|| self.coord_to_index(x, y))
    }

    /// Index of the cell containing pixel (px, py)
    pub fn pixel_to_index(&self, px: i32, py: i32) -> Result<usize, GridError> {
        let x = px.div_euclid(self.tile_width);
        let y = py.div_euclid(self.tile_height);
        self.index_of(x, y)
            .ok_or(GridError::OutOfRange { x: px, y: py })
    }

    /// Pixel of the top-left corner of a cell
    pub fn cell_origin(&self, index: usize) -> (i32, i32) {
        let (x, y) = self.index_to_coord(index);
        (x * self.tile_width, y * self.tile_height)
    }

    pub fn tile(&self, index: usize) -> Result<&Tile, GridError> {
        self.tiles.get(index).ok_or(GridError::IndexOutOfRange(index))
    }

    pub fn tile_at(&self, px: i32, py: i32) -> Result<&Tile, GridError> {
        let index = self.pixel_to_index(px, py)?;
        self.tile(index)
    }

    /// Kind of cell (x, y), if on the grid
    pub fn kind_at(&self, x: i32, y: i32) -> Option<TileKind> {
        self.index_of(x, y).map(|i| self.tiles[i].kind)
    }

    /// Off-grid pixels are never passable
    pub fn is_passable(&self, px: i32, py: i32) -> bool {
        self.tile_at(px, py)
            .map(|tile| tile.kind.props().passable)
            .unwrap_or(false)
    }

    /// Index of the neighbouring cell in `dir`, if on the grid
    pub fn neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
        if index >= self.tiles.len() || dir == Direction::None {
            return None;
        }
        let (x, y) = self.index_to_coord(index);
        let (dx, dy) = dir.step();
        self.index_of(x + dx, y + dy)
    }

    /// Apply one decay step to a breakable tile, returning its new kind
    pub fn decay(&mut self, index: usize) -> Option<TileKind> {
        let tile = self.tiles.get_mut(index)?;
        let next = tile.kind.decayed()?;
        tile.kind = next;
        Some(next)
    }

    pub fn set_kind(&mut self, x: i32, y: i32, kind: TileKind) -> Result<(), GridError> {
        let index = self
            .index_of(x, y)
            .ok_or(GridError::OutOfRange { x, y })?;
        self.tiles[index].kind = kind;
        Ok(())
    }
}
