//! World state and core simulation types
//!
//! A `World` is one self-contained snapshot of the arena. Rounds are isolated
//! by value: the round controller keeps a canonical world and forks a deep
//! copy of it for every round that is actually played.

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, Impact};
use super::ledger::ActionLedger;
use super::terrain::Level;
use super::unit::Unit;
use crate::renderer::{Surface, colors};

/// Something the frontend may want to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A unit fired
    Shot { uid: u32, live: bool },
    /// A unit took damage from a bullet or an effect
    Damaged { uid: u32, live: bool, amount: f32 },
    /// An enemy died
    Killed { uid: u32 },
    /// Money paid out for a kill
    Reward { amount: u32 },
    /// A bullet blasted a hole into a wall
    WallCarved { at: IVec2, radius: i32 },
}

/// Complete arena state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub level: Level,
    /// Live player first, then echoes from youngest to oldest
    pub units: Vec<Unit>,
    /// In level spawn order
    pub enemies: Vec<Unit>,
    /// In firing order
    pub bullets: Vec<Bullet>,
    /// Camera offset, halved and negated every frame
    pub screenshake: IVec2,
    pub rng: Pcg32,
    /// Next entity uid
    pub(crate) next_id: u32,
    /// Events emitted by the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Bullets that collided during the last tick
    #[serde(skip)]
    pub impacts: Vec<Impact>,
}

impl World {
    /// Populate a level with its enemies
    pub fn new(level: Level, seed: u64) -> Self {
        let mut world = Self {
            level,
            units: Vec::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            screenshake: IVec2::ZERO,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            events: Vec::new(),
            impacts: Vec::new(),
        };
        let spawns = world.level.enemy_spawns().to_vec();
        for spawn in spawns {
            let uid = world.next_entity_id();
            world.enemies.push(Unit::enemy(uid, spawn.as_vec2()));
        }
        world
    }

    /// Allocate a new entity uid
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.level.spawn().as_vec2()
    }

    pub fn live_player(&self) -> Option<&Unit> {
        self.units.first().filter(|u| u.is_live_player())
    }

    /// Put a freshly built live unit at the front
    pub fn prepend_unit(&mut self, unit: Unit) {
        self.units.insert(0, unit);
    }

    /// Age every player unit by one round and drop those past `horizon`
    ///
    /// Returns how many units were evicted.
    pub fn age_units(&mut self, horizon: i32) -> usize {
        for unit in &mut self.units {
            unit.set_id(unit.id + 1);
        }
        let before = self.units.len();
        self.units.retain(|u| u.id <= horizon);
        let evicted = before - self.units.len();
        if evicted > 0 {
            log::debug!("Evicted {} echoes past round {}", evicted, horizon);
        }
        evicted
    }

    /// Deep copy for a new round
    pub fn fork(&self) -> Self {
        let mut world = self.clone();
        world.screenshake = IVec2::ZERO;
        world.events.clear();
        world.impacts.clear();
        world
    }

    /// Recompute the hitzone of every unit that is on screen
    ///
    /// Drawing does this as a side effect; headless runs call it directly.
    pub fn refresh_hitzones(&mut self, ledger: &ActionLedger, frame: usize) {
        for unit in self.units.iter_mut().chain(self.enemies.iter_mut()) {
            if unit.is_alive(ledger, frame) {
                unit.refresh_hitzone();
            }
        }
    }

    /// Top-left corner of the view, centered on the live player
    pub fn camera(&self, screen: IVec2) -> Vec2 {
        let center = self
            .units
            .first()
            .map(|u| u.pos - (screen / 2).as_vec2())
            .unwrap_or(Vec2::ZERO);
        center + self.screenshake.as_vec2()
    }

    /// Compose a frame; refreshes the hitzone of every drawn unit
    pub fn draw(&mut self, surface: &mut Surface, ledger: &ActionLedger, frame: usize) {
        let camera = self.camera(surface.size());
        surface.fill(colors::BACKGROUND);
        // Terrain shakes against the units
        self.level
            .draw(surface, camera - 2.0 * self.screenshake.as_vec2());

        for bullet in &self.bullets {
            bullet.draw(surface, camera);
        }
        for unit in self.units.iter_mut().chain(self.enemies.iter_mut()) {
            if unit.is_alive(ledger, frame) {
                unit.draw(surface, camera);
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
