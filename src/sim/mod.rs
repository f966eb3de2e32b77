//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (live player, echoes by age, enemies by spawn)
//! - No platform dependencies; drawing only goes into owned `Surface`s

pub mod bullet;
pub mod collision;
pub mod ledger;
pub mod round;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod unit;

pub use bullet::{Bullet, BulletKind, Hit, Impact, ParentRef, Team};
pub use collision::{bullet_hits_unit, explosion_points, explosion_radius, wall_impact};
pub use ledger::{Action, ActionLedger, LedgerError};
pub use round::{GamePhase, NextPhase, RoundController, RoundSummary};
pub use state::{GameEvent, World};
pub use terrain::{Level, LevelError};
pub use tick::{TickContext, TickInput, tick};
pub use unit::{Behavior, Effect, Unit, Vitals, Weapon};
