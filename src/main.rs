//! Time Keeper entry point
//!
//! Headless runner: loads settings and assets, plays a fixed number of rounds
//! with a scripted pilot and optionally writes the last frame as a PNG.

use std::process::ExitCode;

use glam::{IVec2, Vec2};

use time_keeper::Settings;
use time_keeper::audio::{AudioManager, LogSink};
use time_keeper::renderer::Surface;
use time_keeper::shop::{Catalogue, Economy};
use time_keeper::sim::{GamePhase, Level, LevelError, RoundController, TickInput};

/// Default settings file, read from the working directory
const SETTINGS_FILE: &str = "time-keeper.json";

/// Deterministic stand-in for a human at the controls
struct Pilot {
    frame: u64,
    screen: Vec2,
}

impl Pilot {
    fn new(screen: IVec2) -> Self {
        Self {
            frame: 0,
            screen: screen.as_vec2(),
        }
    }

    /// Circle the cursor around the screen center, firing in bursts
    fn input(&mut self) -> TickInput {
        self.frame += 1;
        let angle = self.frame as f32 * 0.05;
        let reach = 40.0 + 60.0 * (self.frame as f32 * 0.013).sin().abs();
        TickInput {
            cursor: self.screen / 2.0 + Vec2::new(angle.cos(), angle.sin()) * reach,
            stop: self.frame % 90 < 10,
            fire: self.frame % 20 < 12,
        }
    }

    /// Buy whatever is affordable, then leave
    fn shop(&self, ctrl: &mut RoundController) {
        let economy = ctrl.economy_mut();
        for slot in 0..economy.offers.len() {
            let Some(name) = economy.offers[slot].clone() else {
                continue;
            };
            match economy.purchase(slot) {
                Ok(()) => log::info!("Pilot bought {} ({} left)", name, economy.money),
                Err(e) => log::debug!("Pilot skipped {}: {}", name, e),
            }
        }
        ctrl.close_shop();
    }
}

/// Configured level image, or a walled arena when none is set
///
/// An unreadable image falls back to the arena; an image that decodes but
/// is not a valid level is an error.
fn load_level(settings: &Settings) -> Result<Level, LevelError> {
    if let Some(path) = &settings.level_path {
        match Level::open(path) {
            Ok(level) => return Ok(level),
            Err(LevelError::Image(e)) => {
                log::warn!("Failed to read level {}: {}", path.display(), e)
            }
            Err(e) => return Err(e),
        }
    }
    let enemies = [
        IVec2::new(200, 200),
        IVec2::new(1000, 200),
        IVec2::new(200, 600),
        IVec2::new(1000, 600),
    ];
    Level::arena(1200, 800, &enemies)
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Time Keeper (headless) starting...");

    let path = std::env::args().nth(1).unwrap_or_else(|| SETTINGS_FILE.to_string());
    let settings = Settings::load(&path);
    if let Err(e) = settings.validate() {
        log::error!("Invalid settings in {}: {}", path, e);
        return ExitCode::FAILURE;
    }

    let level = match load_level(&settings) {
        Ok(level) => level,
        Err(e) => {
            log::error!("No usable level: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let catalogue = Catalogue::load_or_builtin(settings.catalogue_path.as_deref());
    log::info!("Catalogue has {} items", catalogue.len());

    let audio = AudioManager::new(Box::new(LogSink));

    let rounds = settings.rounds;
    let snapshot_path = settings.snapshot_path.clone();
    let mut ctrl = match RoundController::new(settings, level, audio, Economy::new(catalogue)) {
        Ok(ctrl) => ctrl,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut pilot = Pilot::new(ctrl.screen());
    let mut finished = 0;
    while finished < rounds {
        if ctrl.phase() == GamePhase::Shop {
            pilot.shop(&mut ctrl);
        }
        let before = ctrl.phase();
        let after = ctrl.step(&pilot.input());
        if before == GamePhase::Playing && after != GamePhase::Playing {
            finished += 1;
        }
    }

    if let Some(summary) = ctrl.last_summary() {
        log::info!(
            "Played {} rounds; last had {} echoes, {} kills, money {}",
            finished,
            summary.echoes,
            summary.kills,
            summary.money
        );
    }

    if let Some(path) = snapshot_path {
        let (w, h) = (ctrl.screen().x as u32, ctrl.screen().y as u32);
        let mut surface = Surface::new(w, h);
        ctrl.draw(&mut surface);
        match surface.to_image().save(&path) {
            Ok(()) => log::info!("Wrote snapshot to {}", path.display()),
            Err(e) => {
                log::error!("Failed to write snapshot {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
