//! Bullets: short beams that fly straight until they hit something

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::explosion_radius;
use super::unit::{Effect, Unit};
use crate::consts::{BULLET_LIFESPAN, BULLET_WIDTH};
use crate::renderer::{Rgb, Surface, shapes};

/// Which side a unit fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    /// The live player and its echoes
    Players,
    /// Level enemies; they never hurt each other
    Enemies,
}

/// Weak reference to the unit that fired a bullet
///
/// Holds the shooter's stable `uid`, not its round-dependent `id`, so the
/// reference survives id aging and the shooter being reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub uid: u32,
    pub team: Team,
}

impl ParentRef {
    /// Friendly-fire rule
    pub fn may_hit(&self, unit: &Unit) -> bool {
        unit.uid != self.uid && !(self.team == Team::Enemies && unit.team() == Team::Enemies)
    }
}

/// What a bullet collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hit {
    Unit(u32),
    Wall,
}

/// A bullet that left play this frame by colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    pub bullet: u32,
    pub hit: Hit,
}

/// Bullet payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BulletKind {
    Standard,
    /// Sets the target on fire for `burn` frames
    Soup { burn: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub uid: u32,
    pub pos: Vec2,
    /// Displacement per frame
    pub vel: Vec2,
    pub parent: ParentRef,
    pub color: Rgb,
    pub damage: f32,
    /// Frames left before the bullet fizzles
    pub lifespan: u32,
    pub kind: BulletKind,
    pub collided: Option<Hit>,
}

impl Bullet {
    pub fn new(
        uid: u32,
        pos: Vec2,
        vel: Vec2,
        parent: ParentRef,
        color: Rgb,
        damage: f32,
        kind: BulletKind,
    ) -> Self {
        Self {
            uid,
            pos,
            vel,
            parent,
            color,
            damage,
            lifespan: BULLET_LIFESPAN,
            kind,
            collided: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lifespan > 0 && self.collided.is_none()
    }

    /// True until the bullet has moved once
    pub fn is_fresh(&self) -> bool {
        self.lifespan == BULLET_LIFESPAN
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Where the bullet was one frame ago
    pub fn previous_pos(&self) -> Vec2 {
        self.pos - self.vel
    }

    /// Move one frame along the velocity and burn one frame of lifespan
    pub fn advance(&mut self) {
        self.pos += self.vel;
        self.lifespan = self.lifespan.saturating_sub(1);
    }

    pub fn explosion_radius(&self) -> i32 {
        explosion_radius(self.damage)
    }

    /// Weapon-specific reaction to hitting `unit`, applied before damage
    pub fn on_hit(&self, unit: &mut Unit) {
        match self.kind {
            BulletKind::Standard => {}
            BulletKind::Soup { burn } => unit.add_effect(Effect::Burn { remaining: burn }),
        }
    }

    /// Draw the beam from its head back along its velocity
    pub fn draw(&self, surface: &mut Surface, camera: Vec2) {
        let head = self.pos - camera;
        shapes::thick_line(surface, head, head - self.vel, BULLET_WIDTH, self.color);
    }
}
