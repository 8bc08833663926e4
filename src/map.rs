//! Tile-map description consumed at level load
//!
//! Follows the Tiled JSON export layout: a `"Tiles"` tile layer holding
//! row-major tile ids and an `"Objects"` object group holding typed spawn
//! points in pixel coordinates.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const TILE_LAYER: &str = "Tiles";
pub const OBJECT_LAYER: &str = "Objects";
pub const KIND_TILES: &str = "tilelayer";
pub const KIND_OBJECTS: &str = "objectgroup";

/// Errors that abort loading a level
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Map parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid map size {width}x{height} with {tile_width}x{tile_height} px tiles")]
    InvalidDimensions {
        width: i32,
        height: i32,
        tile_width: i32,
        tile_height: i32,
    },

    #[error("Missing {kind} layer \"{name}\"")]
    MissingLayer {
        kind: &'static str,
        name: &'static str,
    },

    #[error("Tile layer has {actual} cells, expected {expected}")]
    LayerSize { expected: usize, actual: usize },

    #[error("Unknown tile id {id} at cell {index}")]
    UnknownTile { id: u32, index: usize },

    #[error("Map has no \"{0}\" spawn")]
    MissingSpawn(&'static str),

    #[error("\"{kind}\" spawn at ({x}, {y}) is outside the map")]
    SpawnOutOfBounds { kind: String, x: f32, y: f32 },

    #[error("No levels to play")]
    NoLevels,
}

/// A placed object such as a spawn point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tilewidth")]
    pub tile_width: i32,
    #[serde(rename = "tileheight")]
    pub tile_height: i32,
    pub layers: Vec<MapLayer>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl MapDescription {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        log::info!("Loading level from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build a map from row-major tile ids and `(type, x, y)` spawns
    pub fn from_cells(
        width: i32,
        height: i32,
        tile_size: i32,
        tiles: Vec<u32>,
        spawns: &[(&str, f32, f32)],
    ) -> Self {
        let objects = spawns
            .iter()
            .map(|&(kind, x, y)| MapObject {
                kind: kind.to_string(),
                name: String::new(),
                x,
                y,
            })
            .collect();
        Self {
            width,
            height,
            tile_width: tile_size,
            tile_height: tile_size,
            layers: vec![
                MapLayer {
                    name: TILE_LAYER.to_string(),
                    kind: KIND_TILES.to_string(),
                    data: tiles,
                    objects: Vec::new(),
                },
                MapLayer {
                    name: OBJECT_LAYER.to_string(),
                    kind: KIND_OBJECTS.to_string(),
                    data: Vec::new(),
                    objects,
                },
            ],
            properties: HashMap::new(),
        }
    }

    /// Built-in arena: stone border and pillars, brick and cracked stone
    /// scattered in between, player top-left and goal bottom-right
    pub fn demo() -> Self {
        const W: i32 = 13;
        const H: i32 = 11;
        const TILE: i32 = 32;
        let tiles = (0..W * H)
            .map(|i| {
                let (x, y) = (i % W, i / W);
                let border = x == 0 || y == 0 || x == W - 1 || y == H - 1;
                let pillar = x % 2 == 0 && y % 2 == 0;
                let start_area = x + y <= 3;
                if border || pillar {
                    2
                } else if start_area {
                    1
                } else if (x * 7 + y * 3) % 5 == 0 {
                    3
                } else if (x * 5 + y * 11) % 13 == 0 {
                    4
                } else {
                    1
                }
            })
            .collect();
        let mut map = Self::from_cells(
            W,
            H,
            TILE,
            tiles,
            &[
                ("player", TILE as f32, TILE as f32),
                ("goal", ((W - 2) * TILE) as f32, ((H - 2) * TILE) as f32),
            ],
        );
        map.properties.insert(
            "text".to_string(),
            "Blast your way through.[BR]Reach the flag.|Mind the fuse!".to_string(),
        );
        map
    }

    /// Layer of the given kind and name
    pub fn layer(&self, kind: &'static str, name: &'static str) -> Result<&MapLayer, LoadError> {
        self.layers
            .iter()
            .find(|l| l.kind == kind && l.name == name)
            .ok_or(LoadError::MissingLayer { kind, name })
    }

    /// Intro text pages from the `text` property
    pub fn description(&self) -> Vec<String> {
        match self.properties.get("text") {
            Some(raw) => raw
                .replace("[BR]", "\n")
                .split('|')
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }
}
