//! Game session: level progression and the fixed-timestep driver
//!
//! The session owns the current level and the animation registry. Frames of
//! variable length are converted into whole simulation ticks through an
//! accumulator; paint reads a snapshot between ticks and never mutates state.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_SUBSTEPS;
use crate::map::{LoadError, MapDescription};
use crate::settings::Settings;
use crate::sim::{AnimationSet, Drawable, InputEvent, Level};

/// Longest frame the accumulator will absorb (seconds)
const MAX_FRAME_SECS: f32 = 0.1;

/// Where the session is between levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Showing the level's intro text, one page at a time
    Intro { page: usize },
    Playing,
    /// Player burned; waiting for a confirm to retry the level
    Died,
    /// Last level won
    Finished,
}

/// Everything the render pass needs for one paint
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sprite index per cell, row-major
    pub tiles: Vec<u32>,
    pub width: i32,
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    /// Entities in paint order
    pub drawables: Vec<Drawable>,
    pub phase: SessionPhase,
    pub level_index: usize,
    /// Intro page on screen, if any
    pub text: Option<String>,
}

pub struct Game {
    maps: Vec<MapDescription>,
    level_index: usize,
    level: Level,
    animations: AnimationSet,
    settings: Settings,
    phase: SessionPhase,
    accumulator: f32,
    pending: VecDeque<InputEvent>,
    exit_requested: bool,
}

impl Game {
    /// Start a session at the first map
    pub fn new(maps: Vec<MapDescription>, settings: Settings) -> Result<Self, LoadError> {
        let first = maps.first().ok_or(LoadError::NoLevels)?;
        let level = Level::from_map(first, &settings)?;
        let phase = Self::opening_phase(&level);
        log::info!("Session started with {} level(s)", maps.len());
        Ok(Self {
            maps,
            level_index: 0,
            level,
            animations: AnimationSet::standard(),
            settings,
            phase,
            accumulator: 0.0,
            pending: VecDeque::new(),
            exit_requested: false,
        })
    }

    fn opening_phase(level: &Level) -> SessionPhase {
        if level.description().is_empty() {
            SessionPhase::Playing
        } else {
            SessionPhase::Intro { page: 0 }
        }
    }

    fn load_level(&mut self, index: usize) -> Result<(), LoadError> {
        let map = self.maps.get(index).ok_or(LoadError::NoLevels)?;
        self.level = Level::from_map(map, &self.settings)?;
        self.level_index = index;
        self.phase = Self::opening_phase(&self.level);
        self.accumulator = 0.0;
        self.pending.clear();
        log::info!("Level {} of {}", index + 1, self.maps.len());
        Ok(())
    }

    /// Queue an input event for the next tick
    pub fn push_input(&mut self, event: InputEvent) {
        if self.phase == SessionPhase::Playing {
            self.pending.push_back(event);
        }
    }

    /// Dismiss the current overlay: next intro page, or retry after dying
    pub fn confirm(&mut self) -> Result<(), LoadError> {
        match self.phase {
            SessionPhase::Intro { page } => {
                self.phase = if page + 1 < self.level.description().len() {
                    SessionPhase::Intro { page: page + 1 }
                } else {
                    SessionPhase::Playing
                };
            }
            SessionPhase::Died => {
                log::info!("Retrying level {}", self.level_index + 1);
                self.load_level(self.level_index)?;
            }
            SessionPhase::Playing | SessionPhase::Finished => {}
        }
        Ok(())
    }

    /// Advance by a frame of `dt` seconds. Returns the number of ticks run.
    pub fn update(&mut self, dt: f32) -> Result<u32, LoadError> {
        if self.phase != SessionPhase::Playing {
            self.accumulator = 0.0;
            return Ok(0);
        }

        let step = self.settings.sim_dt();
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_SECS)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= step && substeps < MAX_SUBSTEPS {
            while let Some(event) = self.pending.pop_front() {
                self.level.handle_input(event);
            }
            self.level.update(&mut self.animations, step);
            self.accumulator -= step;
            substeps += 1;

            if self.level.died() {
                log::info!("Player died on level {}", self.level_index + 1);
                self.phase = SessionPhase::Died;
                self.accumulator = 0.0;
                break;
            }
            if self.level.won() {
                let next = self.level_index + 1;
                if next < self.maps.len() {
                    self.load_level(next)?;
                } else {
                    log::info!("All {} level(s) cleared", self.maps.len());
                    self.phase = SessionPhase::Finished;
                    self.accumulator = 0.0;
                }
                break;
            }
        }
        Ok(substeps)
    }

    /// Snapshot of the current state for rendering
    pub fn paint(&self) -> Frame {
        let grid = self.level.grid();
        let text = match self.phase {
            SessionPhase::Intro { page } => self.level.description().get(page).cloned(),
            _ => None,
        };
        Frame {
            tiles: self.level.tile_frames().to_vec(),
            width: grid.width(),
            height: grid.height(),
            tile_width: grid.tile_width(),
            tile_height: grid.tile_height(),
            drawables: self.level.draw_list(&self.animations),
            phase: self.phase,
            level_index: self.level_index,
            text,
        }
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level_count(&self) -> usize {
        self.maps.len()
    }
}
