//! Units: the live player, its echoes and level enemies
//!
//! All units share one struct. What differs between them lives in two enums:
//! `Vitals` decides how damage is taken and when the unit counts as alive,
//! `Behavior` decides where its per-frame actions come from.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, BulletKind, Hit, Impact, ParentRef, Team};
use super::ledger::ActionLedger;
use super::terrain::Level;
use crate::consts::*;
use crate::renderer::{Rgb, Surface, colors, shapes};
use crate::{cell_of, direction};

/// Id of the live player
pub const LIVE_ID: i32 = 0;
/// Id carried by enemies
pub const ENEMY_ID: i32 = -1;

/// Gun a unit fires with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weapon {
    #[default]
    Rifle,
    /// Weak shots that set the target on fire
    VaporizedSoup,
}

impl Weapon {
    /// Weapon granted by a shop item, if the item is a weapon
    pub fn from_item(name: &str) -> Option<Self> {
        match name {
            "Vaporized Soup" => Some(Self::VaporizedSoup),
            _ => None,
        }
    }

    pub fn fire(
        self,
        uid: u32,
        pos: Vec2,
        vel: Vec2,
        parent: ParentRef,
        color: Rgb,
        damage: f32,
    ) -> Bullet {
        match self {
            Self::Rifle => Bullet::new(uid, pos, vel, parent, color, damage, BulletKind::Standard),
            Self::VaporizedSoup => Bullet::new(
                uid,
                pos,
                vel,
                parent,
                color,
                1.0,
                BulletKind::Soup { burn: damage },
            ),
        }
    }
}

/// Timed status effect, applied once per update until it reports completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// One damage per frame while `remaining` is positive
    Burn { remaining: f32 },
}

impl Effect {
    /// Apply one frame of the effect; returns true once it is finished
    pub fn apply(&mut self, unit: &mut Unit) -> bool {
        match self {
            Self::Burn { remaining } => {
                unit.color = colors::BURNING;
                unit.get_hurt(1.0);
                *remaining -= 1.0;
                *remaining <= 0.0
            }
        }
    }

    /// Damage this effect deals per frame
    pub fn damage_per_frame(&self) -> f32 {
        match self {
            Self::Burn { .. } => 1.0,
        }
    }
}

/// How a unit takes damage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Vitals {
    /// Players: damage slows the unit down, it recovers over time
    Agility {
        speed: f32,
        max_speed: f32,
        /// Speed regained per frame
        recovery: f32,
    },
    /// Enemies: damage drains hit points, dead at 0
    HitPoints { hp: f32, reward: u32 },
}

/// Where a unit's actions come from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Replays (or records) its inputs through the ledger
    Soldier,
    /// Ledger-driven; rides its latest bullet while the trigger is held
    Minotaur { ride: Option<u32> },
    /// Hunts the nearest living player
    Hunter { speed: f32 },
}

/// Everything a unit may touch while acting
pub struct ActionContext<'a> {
    pub ledger: &'a ActionLedger,
    pub frame: usize,
    pub level: &'a Level,
    /// Candidate targets for enemies; empty for players
    pub targets: &'a [Unit],
    pub bullets: &'a mut Vec<Bullet>,
    pub next_uid: &'a mut u32,
    /// Bullets that collided this frame
    pub impacts: &'a [Impact],
    /// Units whose reload gets delayed after this step
    pub stunned: &'a mut Vec<u32>,
}

impl ActionContext<'_> {
    fn take_uid(&mut self) -> u32 {
        let uid = *self.next_uid;
        *self.next_uid += 1;
        uid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identity, never reused within a game
    pub uid: u32,
    /// Rounds since recording (0 = live player), or `ENEMY_ID`
    pub id: i32,
    pub pos: Vec2,
    /// Aim cursor offset from the center
    pub cursor: Vec2,
    /// Frames until the next shot
    pub reload: u32,
    pub reload_time: u32,
    pub bullet_speed: f32,
    pub damage: f32,
    pub main_color: Rgb,
    /// Color for this frame; effects may override it
    pub color: Rgb,
    pub main_gun: Weapon,
    pub gun: Weapon,
    pub vitals: Vitals,
    pub behavior: Behavior,
    /// Silhouette pixel offsets from the center, empty until first drawn
    hitzone: Vec<IVec2>,
    effects: Vec<Effect>,
}

impl Unit {
    fn base(uid: u32, pos: Vec2, id: i32, color: Rgb, vitals: Vitals, behavior: Behavior) -> Self {
        Self {
            uid,
            id,
            pos,
            cursor: Vec2::ZERO,
            reload: 0,
            reload_time: UNIT_RELOAD_TIME,
            bullet_speed: UNIT_BULLET_SPEED,
            damage: UNIT_DAMAGE,
            main_color: color,
            color,
            main_gun: Weapon::Rifle,
            gun: Weapon::Rifle,
            vitals,
            behavior,
            hitzone: Vec::new(),
            effects: Vec::new(),
        }
    }

    fn player_color(id: i32) -> Rgb {
        if id == LIVE_ID {
            colors::LIVE_PLAYER
        } else {
            colors::ECHO
        }
    }

    pub fn player(uid: u32, pos: Vec2, id: i32) -> Self {
        Self::base(
            uid,
            pos,
            id,
            Self::player_color(id),
            Vitals::Agility {
                speed: PLAYER_MAX_SPEED,
                max_speed: PLAYER_MAX_SPEED,
                recovery: PLAYER_RECOVERY,
            },
            Behavior::Soldier,
        )
    }

    pub fn minotaur(uid: u32, pos: Vec2, id: i32) -> Self {
        let mut unit = Self::player(uid, pos, id);
        unit.behavior = Behavior::Minotaur { ride: None };
        unit
    }

    pub fn enemy(uid: u32, pos: Vec2) -> Self {
        Self::base(
            uid,
            pos,
            ENEMY_ID,
            colors::ENEMY,
            Vitals::HitPoints {
                hp: ENEMY_HP,
                reward: ENEMY_REWARD,
            },
            Behavior::Hunter { speed: ENEMY_SPEED },
        )
    }

    pub fn team(&self) -> Team {
        match self.behavior {
            Behavior::Hunter { .. } => Team::Enemies,
            Behavior::Soldier | Behavior::Minotaur { .. } => Team::Players,
        }
    }

    pub fn parent_ref(&self) -> ParentRef {
        ParentRef {
            uid: self.uid,
            team: self.team(),
        }
    }

    pub fn is_live_player(&self) -> bool {
        self.id == LIVE_ID
    }

    /// Reassign the round id; echoes are drawn white, the live player cyan
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
        if self.team() == Team::Players {
            self.main_color = Self::player_color(id);
            self.color = self.main_color;
        }
    }

    pub fn is_alive(&self, ledger: &ActionLedger, frame: usize) -> bool {
        match self.vitals {
            Vitals::Agility { .. } => ledger.is_on_screen(self.id, frame),
            Vitals::HitPoints { hp, .. } => hp > 0.0,
        }
    }

    pub fn get_hurt(&mut self, damage: f32) {
        let damage = damage.max(0.0);
        match &mut self.vitals {
            Vitals::Agility {
                speed, max_speed, ..
            } => *speed = *max_speed / (damage + 1.0),
            Vitals::HitPoints { hp, .. } => *hp = (*hp - damage).max(0.0),
        }
    }

    /// Money paid out when this unit is killed
    pub fn reward(&self) -> u32 {
        match self.vitals {
            Vitals::HitPoints { reward, .. } => reward,
            Vitals::Agility { .. } => 0,
        }
    }

    pub fn speed(&self) -> f32 {
        match (self.behavior, self.vitals) {
            (Behavior::Hunter { speed }, _) => speed,
            (_, Vitals::Agility { speed, .. }) => speed,
            _ => 0.0,
        }
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn hitzone(&self) -> &[IVec2] {
        &self.hitzone
    }

    /// Hitzone pixel centers in world coordinates
    pub fn hitzone_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        let origin = self.pos + Vec2::splat(0.5);
        self.hitzone.iter().map(move |o| origin + o.as_vec2())
    }

    /// Reset per-frame cosmetics, then run effects
    ///
    /// Returns the damage effects dealt this frame.
    pub fn update(&mut self) -> f32 {
        self.color = self.main_color;
        self.gun = self.main_gun;

        let mut effects = std::mem::take(&mut self.effects);
        let mut dealt = 0.0;
        effects.retain_mut(|effect| {
            dealt += effect.damage_per_frame();
            !effect.apply(self)
        });
        // Effects added while applying go after the survivors
        effects.append(&mut self.effects);
        self.effects = effects;
        dealt
    }

    /// Draw the unit into an off-screen square keyed on `colors::KEY`
    pub fn render_silhouette(&self) -> Surface {
        let side = UNIT_SIDE as u32;
        let mut surface = Surface::filled(side, side, colors::KEY);
        surface.set_color_key(Some(colors::KEY));

        let center = Vec2::splat((UNIT_SIDE / 2) as f32);
        let body = (UNIT_SIDE as f32 * BODY_RATIO) as i32;
        let cursor = (UNIT_SIDE as f32 * CURSOR_RATIO) as i32;
        shapes::fill_circle(&mut surface, center, body, self.color);
        shapes::fill_circle(&mut surface, center + self.cursor, cursor, self.color);
        surface
    }

    pub fn refresh_hitzone(&mut self) {
        self.store_hitzone(&self.render_silhouette());
    }

    fn store_hitzone(&mut self, silhouette: &Surface) {
        let half = IVec2::splat(UNIT_SIDE / 2);
        self.hitzone = silhouette
            .pixels_unlike(colors::KEY)
            .into_iter()
            .map(|p| p - half)
            .collect();
    }

    /// Draw onto the frame and refresh the hitzone from what was drawn
    pub fn draw(&mut self, surface: &mut Surface, camera: Vec2) {
        let silhouette = self.render_silhouette();
        self.store_hitzone(&silhouette);
        let corner = (self.pos - Vec2::splat((UNIT_SIDE / 2) as f32) - camera).as_ivec2();
        surface.blit(&silhouette, corner);
    }

    /// Walk up to `speed` pixels along `dir`, stopping before any wall
    ///
    /// Steps one pixel at a time and never commits a step that would put a
    /// hitzone pixel on solid terrain. Returns the distance travelled.
    pub fn move_by(&mut self, speed: f32, dir: Vec2, level: &Level) -> f32 {
        if self.hitzone.is_empty() || speed <= 0.0 {
            return 0.0;
        }
        let Some(dir) = direction(dir) else {
            return 0.0;
        };

        let start = self.pos;
        let mut moved = 0.0;
        for i in 1..=speed.ceil() as u32 {
            let step = (i as f32).min(speed);
            let offset = dir * step;
            let blocked = level.any_solid(self.hitzone_points().map(|p| cell_of(p + offset)));
            if blocked {
                break;
            }
            moved = step;
        }
        self.pos = start + dir * moved;
        moved
    }

    /// Pull the trigger with the current gun; returns the new bullet's uid
    fn shoot(&mut self, vel: Vec2, ctx: &mut ActionContext) -> u32 {
        let uid = ctx.take_uid();
        let bullet = self.gun.fire(
            uid,
            self.pos + vel,
            vel,
            self.parent_ref(),
            self.color,
            self.damage,
        );
        ctx.bullets.push(bullet);
        uid
    }

    fn recover(&mut self, amount: Option<f32>) {
        if let Vitals::Agility {
            speed,
            max_speed,
            recovery,
        } = &mut self.vitals
        {
            if *speed < *max_speed {
                *speed = (*speed + amount.unwrap_or(*recovery)).min(*max_speed);
            }
        }
    }

    /// Act for one frame; returns true if the unit fired
    pub fn do_action(&mut self, ctx: &mut ActionContext) -> bool {
        match self.behavior {
            Behavior::Soldier => self.soldier_action(ctx),
            Behavior::Minotaur { ride } => self.minotaur_action(ride, ctx),
            Behavior::Hunter { speed } => self.hunter_action(speed, ctx),
        }
    }

    /// Speed for an aim `distance` away: full beyond half a side, else scaled
    fn step_speed(&self, distance: f32) -> f32 {
        if distance > (UNIT_SIDE / 2) as f32 {
            self.speed()
        } else {
            self.speed() * distance / UNIT_SIDE as f32
        }
    }

    fn soldier_action(&mut self, ctx: &mut ActionContext) -> bool {
        let action = ctx.ledger.action(self.id, ctx.frame);
        let distance = action.aim().length() + 1e-8;
        let speed = self.step_speed(distance);
        self.recover(None);

        let dir = action.aim() / distance;
        if distance > MOVE_DEADZONE && !action.stop {
            self.move_by(speed, dir, ctx.level);
        }
        self.cursor = dir * CURSOR_REACH * UNIT_SIDE as f32;

        if self.reload > 1 {
            self.reload -= 1;
            return false;
        }
        if action.fire {
            self.reload = self.reload_time;
            self.shoot(dir * self.bullet_speed, ctx);
            return true;
        }
        false
    }

    fn minotaur_action(&mut self, mut ride: Option<u32>, ctx: &mut ActionContext) -> bool {
        let action = ctx.ledger.action(self.id, ctx.frame);

        if let Some(uid) = ride {
            let riding = ctx.bullets.iter().any(|b| b.uid == uid);
            if !(riding && action.fire) {
                let hit = ctx.impacts.iter().find(|i| i.bullet == uid);
                if let Some(Impact {
                    hit: Hit::Unit(target),
                    ..
                }) = hit
                {
                    ctx.stunned.push(*target);
                }
                ride = None;
            }
        }

        let distance = action.aim().length() + 1e-8;
        let speed = self.step_speed(distance);
        self.recover(Some(MINOTAUR_RECOVERY));

        let dir = action.aim() / distance;
        let ridden = ride.and_then(|uid| ctx.bullets.iter().find(|b| b.uid == uid));
        if let Some(bullet) = ridden {
            self.pos = bullet.pos;
        } else if distance > MOVE_DEADZONE && !action.stop {
            self.move_by(speed, dir, ctx.level);
        }
        self.cursor = dir * MINOTAUR_CURSOR_REACH * UNIT_SIDE as f32;

        let mut fired = false;
        if self.reload > 0 && ride.is_none() {
            self.reload -= 1;
        } else if action.fire && self.reload == 0 {
            self.reload = self.reload_time;
            let uid = self.shoot(dir * BULLET_SPEED, ctx);
            if ride.is_none() && !action.stop {
                ride = Some(uid);
            }
            fired = true;
        }
        self.behavior = Behavior::Minotaur { ride };
        fired
    }

    fn hunter_action(&mut self, speed: f32, ctx: &mut ActionContext) -> bool {
        let (ledger, frame) = (ctx.ledger, ctx.frame);
        // Living targets rank before dead ones, then by distance
        let rank = |u: &Unit| (!u.is_alive(ledger, frame), u.pos.distance(self.pos));
        let Some(target) = ctx.targets.iter().min_by(|a, b| {
            let (a, b) = (rank(a), rank(b));
            a.0.cmp(&b.0).then(a.1.total_cmp(&b.1))
        }) else {
            return false;
        };
        if !target.is_alive(ledger, frame) {
            return false;
        }

        let target_pos = target.pos;
        let target_dis = target_pos.distance(self.pos);
        if target_dis > ENGAGE_RADIUS {
            return false;
        }
        let Some(dir) = direction(target_pos - self.pos) else {
            return false;
        };
        if target_dis > HOLD_RADIUS {
            self.move_by(speed, dir, ctx.level);
        }
        self.cursor = dir * CURSOR_REACH * UNIT_SIDE as f32;

        if self.reload > 1 {
            self.reload -= 1;
            return false;
        }
        self.shoot(dir * BULLET_SPEED, ctx);
        self.reload = self.reload_time;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ledger::Action;

    fn open_level() -> Level {
        Level::new(200, 200, IVec2::new(100, 100)).unwrap()
    }

    fn drawn(mut unit: Unit) -> Unit {
        unit.refresh_hitzone();
        unit
    }

    struct Scratch {
        bullets: Vec<Bullet>,
        next_uid: u32,
        stunned: Vec<u32>,
    }

    impl Scratch {
        fn new() -> Self {
            Self {
                bullets: Vec::new(),
                next_uid: 1000,
                stunned: Vec::new(),
            }
        }

        fn ctx<'a>(
            &'a mut self,
            ledger: &'a ActionLedger,
            frame: usize,
            level: &'a Level,
            targets: &'a [Unit],
        ) -> ActionContext<'a> {
            ActionContext {
                ledger,
                frame,
                level,
                targets,
                bullets: &mut self.bullets,
                next_uid: &mut self.next_uid,
                impacts: &[],
                stunned: &mut self.stunned,
            }
        }
    }

    #[test]
    fn test_hitzone_empty_until_drawn() {
        let mut unit = Unit::player(1, Vec2::new(50.0, 50.0), 0);
        assert!(unit.hitzone().is_empty());

        let mut frame = Surface::new(100, 100);
        unit.draw(&mut frame, Vec2::ZERO);
        assert!(!unit.hitzone().is_empty());
        // Body is a radius-7 disc around the center
        assert!(unit.hitzone().contains(&IVec2::new(7, 0)));
        assert!(!unit.hitzone().contains(&IVec2::new(8, 0)));
        assert_eq!(frame.get(50, 50), Some(colors::LIVE_PLAYER));
    }

    #[test]
    fn test_open_movement_displaces_exactly_speed() {
        let level = open_level();
        let mut unit = drawn(Unit::player(1, Vec2::new(50.0, 50.0), 0));
        let moved = unit.move_by(4.0, Vec2::X, &level);
        assert_eq!(moved, 4.0);
        assert!((unit.pos - Vec2::new(54.0, 50.0)).length() < 1e-5);

        let moved = unit.move_by(2.5, Vec2::new(0.0, -3.0), &level);
        assert_eq!(moved, 2.5);
        assert!((unit.pos - Vec2::new(54.0, 47.5)).length() < 1e-5);
    }

    #[test]
    fn test_blocked_movement_stays_put() {
        let mut level = open_level();
        // Rightmost body pixels sit in column 57
        let wall: Vec<IVec2> = (0..200).map(|y| IVec2::new(58, y)).collect();
        level.carve(&wall, 1);

        let mut unit = drawn(Unit::player(1, Vec2::new(50.0, 50.0), 0));
        assert_eq!(unit.move_by(4.0, Vec2::X, &level), 0.0);
        assert_eq!(unit.pos, Vec2::new(50.0, 50.0));

        // Walking away is still possible
        assert_eq!(unit.move_by(3.0, Vec2::NEG_X, &level), 3.0);
    }

    #[test]
    fn test_movement_needs_hitzone_and_direction() {
        let level = open_level();
        let mut undrawn = Unit::player(1, Vec2::new(50.0, 50.0), 0);
        assert_eq!(undrawn.move_by(4.0, Vec2::X, &level), 0.0);

        let mut unit = drawn(Unit::player(2, Vec2::new(50.0, 50.0), 0));
        assert_eq!(unit.move_by(4.0, Vec2::ZERO, &level), 0.0);
    }

    #[test]
    fn test_get_hurt_by_vitals() {
        let mut player = Unit::player(1, Vec2::ZERO, 0);
        player.get_hurt(3.0);
        assert_eq!(player.speed(), 1.0);
        for _ in 0..200 {
            player.recover(None);
        }
        assert_eq!(player.speed(), PLAYER_MAX_SPEED);

        let mut enemy = Unit::enemy(2, Vec2::ZERO);
        let ledger = ActionLedger::new(2, 30, 1).unwrap();
        enemy.get_hurt(4.0);
        assert!(enemy.is_alive(&ledger, 0));
        enemy.get_hurt(40.0);
        assert_eq!(enemy.vitals, Vitals::HitPoints { hp: 0.0, reward: 2 });
        assert!(!enemy.is_alive(&ledger, 0));
    }

    #[test]
    fn test_burn_runs_then_expires() {
        let mut enemy = Unit::enemy(1, Vec2::ZERO);
        enemy.add_effect(Effect::Burn { remaining: 3.0 });

        assert_eq!(enemy.update(), 1.0);
        assert_eq!(enemy.color, colors::BURNING);
        enemy.update();
        enemy.update();
        assert!(enemy.effects().is_empty());
        assert_eq!(enemy.vitals, Vitals::HitPoints { hp: 7.0, reward: 2 });

        assert_eq!(enemy.update(), 0.0);
        assert_eq!(enemy.color, colors::ENEMY);
    }

    #[test]
    fn test_expiring_effect_does_not_skip_the_next() {
        let mut enemy = Unit::enemy(1, Vec2::ZERO);
        enemy.add_effect(Effect::Burn { remaining: 1.0 });
        enemy.add_effect(Effect::Burn { remaining: 3.0 });

        assert_eq!(enemy.update(), 2.0);
        assert_eq!(enemy.effects(), &[Effect::Burn { remaining: 2.0 }]);
        assert_eq!(enemy.vitals, Vitals::HitPoints { hp: 8.0, reward: 2 });
    }

    #[test]
    fn test_set_id_recolors_echoes() {
        let mut unit = Unit::player(1, Vec2::ZERO, 0);
        unit.set_id(1);
        assert_eq!(unit.main_color, colors::ECHO);
        assert_eq!(unit.color, colors::ECHO);

        let mut enemy = Unit::enemy(2, Vec2::ZERO);
        enemy.set_id(ENEMY_ID);
        assert_eq!(enemy.color, colors::ENEMY);
    }

    #[test]
    fn test_enemy_skips_dead_targets() {
        let level = open_level();
        let ledger = ActionLedger::new(4, 30, 1).unwrap();
        // Nearby echo is past its lifetime, the live player is further out
        let targets = vec![
            drawn(Unit::player(1, Vec2::new(200.0, 50.0), 0)),
            drawn(Unit::player(2, Vec2::new(70.0, 50.0), 5)),
        ];
        let mut enemy = drawn(Unit::enemy(3, Vec2::splat(50.0)));
        let mut scratch = Scratch::new();

        let fired = enemy.do_action(&mut scratch.ctx(&ledger, 0, &level, &targets));
        assert!(fired);
        assert!((enemy.pos - Vec2::new(53.0, 50.0)).length() < 1e-4);
        assert_eq!(scratch.bullets.len(), 1);
        assert!((scratch.bullets[0].vel - Vec2::new(BULLET_SPEED, 0.0)).length() < 1e-4);
        assert_eq!(scratch.bullets[0].parent.team, Team::Enemies);
    }

    #[test]
    fn test_enemy_ranks_living_targets_first() {
        let level = open_level();
        let ledger = ActionLedger::new(4, 30, 1).unwrap();
        // Two expired echoes close by, the live player last and furthest
        let targets = vec![
            drawn(Unit::player(1, Vec2::new(60.0, 50.0), 5)),
            drawn(Unit::player(2, Vec2::new(50.0, 60.0), 6)),
            drawn(Unit::player(3, Vec2::new(50.0, 250.0), 0)),
        ];
        let mut enemy = drawn(Unit::enemy(4, Vec2::splat(50.0)));
        let mut scratch = Scratch::new();

        assert!(enemy.do_action(&mut scratch.ctx(&ledger, 0, &level, &targets)));
        assert!((scratch.bullets[0].vel - Vec2::new(0.0, BULLET_SPEED)).length() < 1e-4);
    }

    #[test]
    fn test_enemy_idles_out_of_range() {
        let level = open_level();
        let ledger = ActionLedger::new(4, 30, 1).unwrap();
        let targets = vec![drawn(Unit::player(1, Vec2::new(400.0, 10.0), 0))];
        let mut enemy = drawn(Unit::enemy(3, Vec2::splat(10.0)));
        let mut scratch = Scratch::new();

        assert!(!enemy.do_action(&mut scratch.ctx(&ledger, 0, &level, &targets)));
        assert_eq!(enemy.pos, Vec2::splat(10.0));
        assert!(scratch.bullets.is_empty());

        let mut lonely = drawn(Unit::enemy(4, Vec2::splat(10.0)));
        assert!(!lonely.do_action(&mut scratch.ctx(&ledger, 0, &level, &[])));
    }

    #[test]
    fn test_soldier_fires_on_reload_cadence() {
        let level = open_level();
        let mut ledger = ActionLedger::new(2, 30, 1).unwrap();
        for f in 0..ledger.round_frames() {
            ledger.save_action(f, Action::new(Vec2::new(100.0, 0.0), true, true));
        }
        let mut unit = drawn(Unit::player(1, Vec2::splat(100.0), 0));
        let mut scratch = Scratch::new();

        let shots: Vec<usize> = (0..20)
            .filter(|&f| unit.do_action(&mut scratch.ctx(&ledger, f, &level, &[])))
            .collect();
        assert_eq!(shots, vec![0, 9, 18]);
        // Holding position
        assert_eq!(unit.pos, Vec2::splat(100.0));
        assert_eq!(scratch.bullets[0].pos, Vec2::new(100.0 + UNIT_BULLET_SPEED, 100.0));
    }

    #[test]
    fn test_soldier_walks_toward_aim() {
        let level = open_level();
        let mut ledger = ActionLedger::new(2, 30, 1).unwrap();
        ledger.save_action(0, Action::new(Vec2::new(0.0, 50.0), false, false));
        let mut unit = drawn(Unit::player(1, Vec2::splat(100.0), 0));
        let mut scratch = Scratch::new();

        assert!(!unit.do_action(&mut scratch.ctx(&ledger, 0, &level, &[])));
        assert!((unit.pos - Vec2::new(100.0, 104.0)).length() < 1e-4);
        assert!((unit.cursor - Vec2::new(0.0, 9.0)).length() < 1e-4);
    }

    #[test]
    fn test_soup_weapon_trades_damage_for_burn() {
        let parent = ParentRef {
            uid: 1,
            team: Team::Players,
        };
        let b = Weapon::VaporizedSoup.fire(5, Vec2::ZERO, Vec2::X, parent, colors::ECHO, 6.0);
        assert_eq!(b.damage, 1.0);
        assert_eq!(b.kind, BulletKind::Soup { burn: 6.0 });
        assert_eq!(Weapon::from_item("Vaporized Soup"), Some(Weapon::VaporizedSoup));
        assert_eq!(Weapon::from_item("Socks"), None);
    }

    #[test]
    fn test_minotaur_rides_its_bullet() {
        let level = open_level();
        let mut ledger = ActionLedger::new(2, 30, 1).unwrap();
        for f in 0..3 {
            ledger.save_action(f, Action::new(Vec2::new(100.0, 0.0), false, true));
        }
        let mut unit = drawn(Unit::minotaur(1, Vec2::splat(100.0), 0));
        let mut scratch = Scratch::new();

        assert!(unit.do_action(&mut scratch.ctx(&ledger, 0, &level, &[])));
        let ride = scratch.bullets[0].uid;
        assert_eq!(unit.behavior, Behavior::Minotaur { ride: Some(ride) });

        scratch.bullets[0].advance();
        let bullet_pos = scratch.bullets[0].pos;
        unit.do_action(&mut scratch.ctx(&ledger, 1, &level, &[]));
        assert_eq!(unit.pos, bullet_pos);

        // Bullet hit someone and left play: the ride ends and the target is stunned
        scratch.bullets.clear();
        let impacts = [Impact {
            bullet: ride,
            hit: Hit::Unit(42),
        }];
        let mut ctx = scratch.ctx(&ledger, 2, &level, &[]);
        ctx.impacts = &impacts;
        unit.do_action(&mut ctx);
        assert_eq!(unit.behavior, Behavior::Minotaur { ride: None });
        assert_eq!(scratch.stunned, vec![42]);
    }
}
