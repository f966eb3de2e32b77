//! Time Keeper - A time-echo arena shooter
//!
//! Every round the player's inputs are recorded; later rounds replay them as
//! echoes that share the arena with the live player until they age out.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, units, bullets, action ledger, rounds)
//! - `renderer`: Software rasterizer used for silhouettes and frame composition
//! - `shop`: Economy state consumed when a new live unit is built
//! - `audio`: Fire-and-forget sound routing
//! - `settings`: Data-driven configuration

pub mod audio;
pub mod renderer;
pub mod settings;
pub mod shop;
pub mod sim;

pub use settings::Settings;
pub use shop::Economy;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Simulation frames per second
    pub const PER_SECOND: usize = 30;
    /// Default number of concurrent units (live player + echoes)
    pub const DEFAULT_ECHOES: usize = 20;
    /// Seconds of recording an echo loses per round
    pub const SPAWN_RATE: usize = 1;

    /// Side of the square a unit silhouette is rendered into
    pub const UNIT_SIDE: i32 = 20;
    /// Body circle radius as a fraction of the side
    pub const BODY_RATIO: f32 = 0.35;
    /// Aim cursor radius as a fraction of the side
    pub const CURSOR_RATIO: f32 = 0.08;
    /// Aim cursor distance from center as a fraction of the side
    pub const CURSOR_REACH: f32 = 0.45;
    /// Minotaur aim cursor reach
    pub const MINOTAUR_CURSOR_REACH: f32 = 0.55;

    /// Base bullet speed (pixels/frame) for enemies and the minotaur
    pub const BULLET_SPEED: f32 = 12.0;
    /// Frames a bullet lives before expiring
    pub const BULLET_LIFESPAN: u32 = 60;
    /// Margin added around a bullet's travel box for hit tests
    pub const HIT_MARGIN: f32 = 4.0;
    /// Maximum distance of a hitzone pixel from the bullet line
    pub const HIT_LINE_TOLERANCE: f32 = 2.0;
    /// Drawn bullet width
    pub const BULLET_WIDTH: i32 = 3;

    /// Player defaults
    pub const PLAYER_MAX_SPEED: f32 = 4.0;
    pub const PLAYER_RECOVERY: f32 = 0.02;
    pub const UNIT_RELOAD_TIME: u32 = 9;
    pub const UNIT_BULLET_SPEED: f32 = 8.0;
    pub const UNIT_DAMAGE: f32 = 4.0;
    /// Aim vectors shorter than this leave the unit standing
    pub const MOVE_DEADZONE: f32 = 4.0;
    /// Minotaur speed regeneration per frame
    pub const MINOTAUR_RECOVERY: f32 = 0.1;
    /// Reload delay applied to a unit the minotaur rides into
    pub const STUN_FRAMES: u32 = 30;

    /// Enemy defaults
    pub const ENEMY_HP: f32 = 10.0;
    pub const ENEMY_SPEED: f32 = 3.0;
    pub const ENEMY_REWARD: u32 = 2;
    /// Enemies ignore targets further than this
    pub const ENGAGE_RADIUS: f32 = 300.0;
    /// Enemies stop closing in at this distance
    pub const HOLD_RADIUS: f32 = 100.0;
}

/// Unit vector of `v`, or `None` for a zero-length (or non-finite) vector
#[inline]
pub fn direction(v: Vec2) -> Option<Vec2> {
    let len = v.length();
    if len > f32::EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Pixel cell containing a world position
#[inline]
pub fn cell_of(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// Floor division by two (rounds toward negative infinity)
#[inline]
pub fn floor_half(v: IVec2) -> IVec2 {
    IVec2::new(v.x.div_euclid(2), v.y.div_euclid(2))
}
