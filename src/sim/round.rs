//! Round lifecycle
//!
//! The controller owns two worlds. The canonical world carries everything that
//! persists between rounds: echoes, surviving enemies, carved terrain. Each
//! round is played on a fork of it, so nothing that happens during play leaks
//! back. Between rounds the canonical world is advanced by one spawn step with
//! the previous round's recording, which is how echoes end up where the
//! player left them.

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ledger::{ActionLedger, LedgerError};
use super::state::{GameEvent, World};
use super::terrain::Level;
use super::tick::{TickContext, TickInput, tick};
use super::unit::Behavior;
use crate::audio::AudioManager;
use crate::renderer::Surface;
use crate::settings::Settings;
use crate::shop::Economy;

/// Seconds between closing the shop and the warmup
const SHOP_COUNTDOWN_SECS: usize = 2;
/// Seconds between the fork and live play
const ROUND_COUNTDOWN_SECS: usize = 1;
/// Seconds the finished round stays on screen
const INTERMISSION_SECS: usize = 4;

/// Phase a countdown leads into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPhase {
    Warmup,
    Playing,
}

/// Where the controller is in the round cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the shop to be closed
    Shop,
    /// Idle frames before `next`
    Countdown { frames_left: usize, next: NextPhase },
    /// Canonical world replaying the last recording
    Warmup { frame: usize },
    /// Live round on the forked world
    Playing,
    /// Finished round held on screen
    Intermission { frames_left: usize },
}

/// Tally of one played round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub shots: u32,
    pub kills: u32,
    pub echoes: usize,
    pub money: u32,
}

/// Drives the shop, warmup, fork and play cycle
pub struct RoundController {
    settings: Settings,
    ledger: ActionLedger,
    canonical: World,
    instance: World,
    economy: Economy,
    audio: AudioManager,
    phase: GamePhase,
    /// Frame of the round being played
    frame: usize,
    round: u32,
    summary: RoundSummary,
    last_summary: Option<RoundSummary>,
    shop_rng: Pcg32,
    screen: IVec2,
}

impl RoundController {
    pub fn new(
        settings: Settings,
        level: Level,
        mut audio: AudioManager,
        mut economy: Economy,
    ) -> Result<Self, LedgerError> {
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        let ledger = ActionLedger::new(settings.num_players, settings.per_second, settings.spawn_rate)?;
        let canonical = World::new(level, settings.seed);
        let instance = canonical.fork();
        let mut shop_rng = Pcg32::seed_from_u64(settings.seed.wrapping_add(1));
        economy.refresh(&mut shop_rng);
        let screen = IVec2::new(settings.screen.0 as i32, settings.screen.1 as i32);

        log::info!(
            "Round controller ready: {} echoes, {} frames per round",
            settings.num_players,
            ledger.round_frames()
        );

        Ok(Self {
            settings,
            ledger,
            canonical,
            instance,
            economy,
            audio,
            phase: GamePhase::Shop,
            frame: 0,
            round: 0,
            summary: RoundSummary::default(),
            last_summary: None,
            shop_rng,
            screen,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Rounds forked so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn ledger(&self) -> &ActionLedger {
        &self.ledger
    }

    pub fn canonical(&self) -> &World {
        &self.canonical
    }

    /// World of the round currently played
    pub fn instance(&self) -> &World {
        &self.instance
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    pub fn screen(&self) -> IVec2 {
        self.screen
    }

    /// Summary of the most recently finished round
    pub fn last_summary(&self) -> Option<RoundSummary> {
        self.last_summary
    }

    fn seconds(&self, secs: usize) -> usize {
        secs * self.settings.per_second
    }

    /// Leave the shop; ignored outside of it
    pub fn close_shop(&mut self) {
        if self.phase == GamePhase::Shop {
            self.phase = GamePhase::Countdown {
                frames_left: self.seconds(SHOP_COUNTDOWN_SECS),
                next: NextPhase::Warmup,
            };
        }
    }

    /// Advance by one frame; `input` only matters while playing
    pub fn step(&mut self, input: &TickInput) -> GamePhase {
        let phase = self.phase;
        self.phase = match phase {
            GamePhase::Shop => GamePhase::Shop,
            GamePhase::Countdown { frames_left: 0, next } => match next {
                NextPhase::Warmup => GamePhase::Warmup { frame: 0 },
                NextPhase::Playing => GamePhase::Playing,
            },
            GamePhase::Countdown { frames_left, next } => GamePhase::Countdown {
                frames_left: frames_left - 1,
                next,
            },
            GamePhase::Warmup { frame } if frame < self.ledger.fps() => {
                self.warmup_frame(frame);
                GamePhase::Warmup { frame: frame + 1 }
            }
            GamePhase::Warmup { .. } => {
                self.end_round();
                GamePhase::Countdown {
                    frames_left: self.seconds(ROUND_COUNTDOWN_SECS),
                    next: NextPhase::Playing,
                }
            }
            GamePhase::Playing => self.play_frame(input),
            GamePhase::Intermission { frames_left: 0 } => {
                self.economy.refresh(&mut self.shop_rng);
                GamePhase::Shop
            }
            GamePhase::Intermission { frames_left } => GamePhase::Intermission {
                frames_left: frames_left - 1,
            },
        };
        self.phase
    }

    /// Replay one frame of the last recording on the canonical world
    fn warmup_frame(&mut self, frame: usize) {
        let mut silent = AudioManager::default();
        silent.set_muted(true);
        let mut ctx = TickContext {
            audio: &mut silent,
            economy: None,
            screen_shake: false,
        };
        tick(&mut self.canonical, &self.ledger, frame, &mut ctx);
        self.canonical.refresh_hitzones(&self.ledger, frame);
    }

    /// Rotate the recording, age the echoes and fork the next round
    fn end_round(&mut self) {
        self.ledger.rotate();
        let horizon = self.ledger.num_echoes() as i32 - 1;
        self.canonical.age_units(horizon);

        let uid = self.canonical.next_entity_id();
        let mut player = self.economy.create_player(self.canonical.spawn_point(), uid);
        if self.settings.minotaur {
            player.behavior = Behavior::Minotaur { ride: None };
        }
        self.canonical.prepend_unit(player);
        self.canonical.refresh_hitzones(&self.ledger, 0);

        self.instance = self.canonical.fork();
        self.frame = 0;
        self.round += 1;
        self.summary = RoundSummary {
            round: self.round,
            echoes: self.instance.units.len() - 1,
            ..Default::default()
        };
        log::info!(
            "Round {} forked with {} echoes and {} enemies",
            self.round,
            self.summary.echoes,
            self.instance.enemies.len()
        );
    }

    fn play_frame(&mut self, input: &TickInput) -> GamePhase {
        self.ledger.save_action(self.frame, input.to_action(self.screen));
        let mut ctx = TickContext {
            audio: &mut self.audio,
            economy: Some(&mut self.economy),
            screen_shake: self.settings.effective_screen_shake(),
        };
        tick(&mut self.instance, &self.ledger, self.frame, &mut ctx);
        self.instance.refresh_hitzones(&self.ledger, self.frame);

        for event in &self.instance.events {
            match event {
                GameEvent::Shot { live: true, .. } => self.summary.shots += 1,
                GameEvent::Killed { .. } => self.summary.kills += 1,
                _ => {}
            }
        }

        self.frame += 1;
        if self.frame < self.ledger.round_frames() {
            return GamePhase::Playing;
        }

        self.summary.money = self.economy.money;
        self.last_summary = Some(self.summary);
        log::info!(
            "Round {} over: {} shots, {} kills, {} money",
            self.summary.round,
            self.summary.shots,
            self.summary.kills,
            self.summary.money
        );
        GamePhase::Intermission {
            frames_left: self.seconds(INTERMISSION_SECS),
        }
    }

    /// Compose the frame for the current phase
    pub fn draw(&mut self, surface: &mut Surface) {
        match self.phase {
            GamePhase::Warmup { frame } => {
                let frame = frame.min(self.ledger.fps().saturating_sub(1));
                self.canonical.draw(surface, &self.ledger, frame);
            }
            _ => {
                let frame = self.frame.min(self.ledger.round_frames() - 1);
                self.instance.draw(surface, &self.ledger, frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn settings() -> Settings {
        Settings {
            num_players: 2,
            per_second: 3,
            spawn_rate: 1,
            screen: (200, 100),
            ..Default::default()
        }
    }

    fn controller() -> RoundController {
        let level = Level::new(300, 300, IVec2::new(150, 150)).unwrap();
        RoundController::new(settings(), level, AudioManager::default(), Economy::default()).unwrap()
    }

    /// Step with `input` until `done` holds; returns the number of steps
    fn run_until(
        ctrl: &mut RoundController,
        input: &TickInput,
        done: impl Fn(GamePhase) -> bool,
    ) -> usize {
        for steps in 1..=1000 {
            if done(ctrl.step(input)) {
                return steps;
            }
        }
        panic!("phase never reached, stuck in {:?}", ctrl.phase());
    }

    fn idle() -> TickInput {
        TickInput {
            cursor: Vec2::new(100.0, 50.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_odd_echo_count() {
        let level = Level::new(50, 50, IVec2::new(25, 25)).unwrap();
        let bad = Settings {
            num_players: 3,
            ..settings()
        };
        let result = RoundController::new(bad, level, AudioManager::default(), Economy::default());
        assert!(matches!(result, Err(LedgerError::OddEchoCount(3))));
    }

    #[test]
    fn test_phase_cycle() {
        let mut ctrl = controller();
        assert_eq!(ctrl.phase(), GamePhase::Shop);
        assert_eq!(ctrl.step(&idle()), GamePhase::Shop);
        assert!(ctrl.economy().offers.iter().any(|o| o.is_some()));

        ctrl.close_shop();
        // 2s countdown then the transition step
        let steps = run_until(&mut ctrl, &idle(), |p| matches!(p, GamePhase::Warmup { .. }));
        assert_eq!(steps, 7);

        // fps warmup frames, then the fork
        let steps = run_until(&mut ctrl, &idle(), |p| matches!(p, GamePhase::Countdown { .. }));
        assert_eq!(steps, 4);
        assert_eq!(ctrl.round(), 1);
        assert_eq!(ctrl.instance().units.len(), 1);
        assert!(ctrl.instance().units[0].is_live_player());

        let steps = run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);
        assert_eq!(steps, 4);

        let steps = run_until(&mut ctrl, &idle(), |p| matches!(p, GamePhase::Intermission { .. }));
        assert_eq!(steps, 6);
        assert_eq!(ctrl.frame(), 6);
        let summary = ctrl.last_summary().unwrap();
        assert_eq!(summary.round, 1);
        assert_eq!(summary.echoes, 0);

        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Shop);
    }

    #[test]
    fn test_close_shop_ignored_mid_round() {
        let mut ctrl = controller();
        ctrl.close_shop();
        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);
        ctrl.close_shop();
        assert_eq!(ctrl.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_echo_starts_where_player_was_one_step_in() {
        let mut ctrl = controller();
        ctrl.close_shop();
        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);

        // Walk right for the whole round
        let walk = TickInput {
            cursor: Vec2::new(180.0, 50.0),
            ..Default::default()
        };
        let mut trail = Vec::new();
        for _ in 0..6 {
            ctrl.step(&walk);
            trail.push(ctrl.instance().units[0].pos);
        }
        assert!(trail[5].x > trail[0].x);

        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Shop);
        // Nothing that happened in the round reached the canonical world
        assert!(ctrl.canonical().units[0].pos.x < trail[0].x);

        ctrl.close_shop();
        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);
        let units = &ctrl.instance().units;
        assert_eq!(units.len(), 2);
        assert!(units[0].is_live_player());
        assert_eq!(units[1].id, 1);
        // One spawn step of replay: three frames
        assert_eq!(units[1].pos, trail[2]);
    }

    #[test]
    fn test_echoes_evicted_past_horizon() {
        let mut ctrl = controller();
        for round in 1..=3 {
            ctrl.close_shop();
            run_until(&mut ctrl, &idle(), |p| p == GamePhase::Shop);
            assert_eq!(ctrl.round(), round);
            assert!(ctrl.instance().units.len() <= 2);
        }
        let ids: Vec<i32> = ctrl.canonical().units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_applies_mute_setting() {
        let level = Level::new(50, 50, IVec2::new(25, 25)).unwrap();
        let muted = Settings {
            muted: true,
            ..settings()
        };
        let mut ctrl =
            RoundController::new(muted, level, AudioManager::default(), Economy::default()).unwrap();
        assert!(ctrl.audio_mut().is_muted());
    }

    #[test]
    fn test_minotaur_setting() {
        let level = Level::new(100, 100, IVec2::new(50, 50)).unwrap();
        let settings = Settings {
            minotaur: true,
            ..settings()
        };
        let mut ctrl =
            RoundController::new(settings, level, AudioManager::default(), Economy::default()).unwrap();
        ctrl.close_shop();
        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);
        assert_eq!(
            ctrl.instance().units[0].behavior,
            Behavior::Minotaur { ride: None }
        );
    }

    #[test]
    fn test_draw_follows_phase() {
        let mut ctrl = controller();
        let mut surface = Surface::new(200, 100);
        ctrl.draw(&mut surface);
        ctrl.close_shop();
        run_until(&mut ctrl, &idle(), |p| p == GamePhase::Playing);
        ctrl.draw(&mut surface);
        assert_eq!(
            surface.get(100, 50),
            Some(crate::renderer::colors::LIVE_PLAYER)
        );
    }
}
