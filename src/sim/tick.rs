//! Fixed timestep simulation tick
//!
//! One call advances a world by exactly one frame. The order is fixed:
//! 1. bullets move and lifespan-exhausted ones expire
//! 2. surviving bullets are tested against every alive unit, players first
//!    (in unit order) then enemies (in spawn order); the first hit wins
//! 3. bullets that hit no unit are tested against the terrain
//! 4. alive player units act on their ledger inputs
//! 5. alive enemies act on their own
//!
//! Nothing in here fails: degenerate input just means an entity does nothing
//! this frame.

use glam::{IVec2, Vec2};
use rand::Rng;

use super::bullet::{Hit, Impact};
use super::collision::{bullet_hits_unit, explosion_points, wall_impact};
use super::ledger::{Action, ActionLedger};
use super::state::{GameEvent, World};
use super::terrain::OPEN;
use super::unit::{ActionContext, Unit};
use crate::audio::{AudioManager, SoundEffect};
use crate::consts::STUN_FRAMES;
use crate::floor_half;
use crate::shop::Economy;

/// Raw player input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pointer position in screen pixels
    pub cursor: Vec2,
    /// Hold position (left button)
    pub stop: bool,
    /// Fire (right button)
    pub fire: bool,
}

impl TickInput {
    /// Ledger action: pointer offset from the center of `screen`
    pub fn to_action(&self, screen: IVec2) -> Action {
        Action::new(self.cursor - (screen / 2).as_vec2(), self.stop, self.fire)
    }
}

/// Collaborators a tick reports to
pub struct TickContext<'a> {
    pub audio: &'a mut AudioManager,
    /// Kills only pay out when an economy is attached
    pub economy: Option<&'a mut Economy>,
    /// Shake the camera when the live player is hit
    pub screen_shake: bool,
}

/// Advance the world by one frame
pub fn tick(world: &mut World, ledger: &ActionLedger, frame: usize, ctx: &mut TickContext) {
    world.events.clear();
    world.impacts.clear();
    ctx.audio.begin_frame();

    if world.screenshake != IVec2::ZERO {
        world.screenshake = -floor_half(world.screenshake);
    }

    // 1. Move bullets
    for bullet in &mut world.bullets {
        bullet.advance();
    }
    world.bullets.retain(|b| b.lifespan > 0);

    // 2-3. Resolve collisions
    let mut bullets = std::mem::take(&mut world.bullets);
    for bullet in &mut bullets {
        let target = world
            .units
            .iter_mut()
            .chain(world.enemies.iter_mut())
            .find(|unit| unit.is_alive(ledger, frame) && bullet_hits_unit(bullet, unit));

        if let Some(unit) = target {
            bullet.collided = Some(Hit::Unit(unit.uid));
            bullet.on_hit(unit);
            unit.get_hurt(bullet.damage);

            let live = unit.is_live_player();
            world.events.push(GameEvent::Damaged {
                uid: unit.uid,
                live,
                amount: bullet.damage,
            });
            if live {
                ctx.audio.play(SoundEffect::Hurt);
                if ctx.screen_shake {
                    let magnitude = bullet.damage as i32;
                    let sx = if world.rng.random_bool(0.5) { 1 } else { -1 };
                    let sy = if world.rng.random_bool(0.5) { 1 } else { -1 };
                    world.screenshake = IVec2::new(sx * magnitude, sy * magnitude);
                }
            } else if !unit.is_alive(ledger, frame) {
                world.events.push(GameEvent::Killed { uid: unit.uid });
                log::debug!("Unit {} killed by bullet {}", unit.uid, bullet.uid);
                let reward = unit.reward();
                if let Some(economy) = ctx.economy.as_deref_mut() {
                    economy.collect(reward);
                    ctx.audio.play(SoundEffect::Coin);
                    world.events.push(GameEvent::Reward { amount: reward });
                }
            }
        } else if let Some(center) = wall_impact(bullet, &world.level) {
            let radius = bullet.explosion_radius();
            world.level.carve(&explosion_points(center, radius), OPEN);
            bullet.collided = Some(Hit::Wall);
            world.events.push(GameEvent::WallCarved { at: center, radius });
        }

        if let Some(hit) = bullet.collided {
            world.impacts.push(Impact {
                bullet: bullet.uid,
                hit,
            });
        }
    }
    bullets.retain(|b| b.collided.is_none());
    world.bullets = bullets;

    // 4. Player units
    let mut stunned = Vec::new();
    for unit in world.units.iter_mut() {
        if !unit.is_alive(ledger, frame) {
            continue;
        }
        let burned = unit.update();
        report_damage(unit, burned, &mut world.events, ctx.audio);

        let mut actx = ActionContext {
            ledger,
            frame,
            level: &world.level,
            targets: &[],
            bullets: &mut world.bullets,
            next_uid: &mut world.next_id,
            impacts: &world.impacts,
            stunned: &mut stunned,
        };
        if unit.do_action(&mut actx) {
            report_shot(unit, &mut world.events, ctx.audio);
        }
    }

    // 5. Enemies
    for enemy in world.enemies.iter_mut() {
        if !enemy.is_alive(ledger, frame) {
            continue;
        }
        let burned = enemy.update();
        report_damage(enemy, burned, &mut world.events, ctx.audio);
        if !enemy.is_alive(ledger, frame) {
            // Burned to death: no payout
            world.events.push(GameEvent::Killed { uid: enemy.uid });
            continue;
        }

        let mut actx = ActionContext {
            ledger,
            frame,
            level: &world.level,
            targets: &world.units,
            bullets: &mut world.bullets,
            next_uid: &mut world.next_id,
            impacts: &world.impacts,
            stunned: &mut stunned,
        };
        if enemy.do_action(&mut actx) {
            report_shot(enemy, &mut world.events, ctx.audio);
        }
    }

    for unit in world.units.iter_mut().chain(world.enemies.iter_mut()) {
        if stunned.contains(&unit.uid) {
            unit.reload += STUN_FRAMES;
        }
    }
    world
        .enemies
        .retain(|e| e.is_alive(ledger, frame));
}

fn report_damage(unit: &Unit, amount: f32, events: &mut Vec<GameEvent>, audio: &mut AudioManager) {
    if amount <= 0.0 {
        return;
    }
    let live = unit.is_live_player();
    events.push(GameEvent::Damaged {
        uid: unit.uid,
        live,
        amount,
    });
    if live {
        audio.play(SoundEffect::Hurt);
    }
}

fn report_shot(unit: &Unit, events: &mut Vec<GameEvent>, audio: &mut AudioManager) {
    let live = unit.is_live_player();
    events.push(GameEvent::Shot { uid: unit.uid, live });
    audio.play(if live {
        SoundEffect::Shoot
    } else {
        SoundEffect::ShootQuiet
    });
}
