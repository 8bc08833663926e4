//! Demo-mode input driver
//!
//! Wanders the player around with random held directions and drops a bomb
//! now and then. Seeded, so a given seed always produces the same run.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{Direction, InputEvent};

/// Ticks a direction is held for
const MIN_HOLD_TICKS: u32 = 8;
const MAX_HOLD_TICKS: u32 = 48;
/// Chance per tick of dropping a bomb
const BOMB_CHANCE: f64 = 0.01;
/// Chance a new hold is a pause instead of a walk
const IDLE_CHANCE: f64 = 0.2;

pub struct Autopilot {
    rng: Pcg32,
    held: Option<Direction>,
    hold_ticks: u32,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            held: None,
            hold_ticks: 0,
        }
    }

    /// Direction currently held down, if any
    pub fn held(&self) -> Option<Direction> {
        self.held
    }

    /// Input events for the coming tick
    pub fn next_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        if self.hold_ticks == 0 {
            if let Some(dir) = self.held.take() {
                events.push(InputEvent::Released(dir));
            }
            if !self.rng.random_bool(IDLE_CHANCE) {
                let dir = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
                events.push(InputEvent::Pressed(dir));
                self.held = Some(dir);
            }
            self.hold_ticks = self.rng.random_range(MIN_HOLD_TICKS..=MAX_HOLD_TICKS);
        }
        self.hold_ticks -= 1;

        if self.rng.random_bool(BOMB_CHANCE) {
            events.push(InputEvent::Action);
        }
        events
    }
}
