//! Destructible terrain grid
//!
//! The arena is an axis-aligned pixel grid: 0 is open floor, anything above 0
//! is wall. Bullets that hit a wall carve a circular hole into it.
//!
//! Levels are authored as images: black pixels are walls, the first blue
//! pixel (scanning rows top to bottom, left to right) is the player spawn and
//! every red pixel spawns an enemy.

use std::path::Path;

use glam::{IVec2, Vec2};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::renderer::{Rgb, Surface, colors};

/// Occupancy value of an open cell
pub const OPEN: u8 = 0;
/// Occupancy value written for walls parsed from a level image
pub const WALL: u8 = 1;

/// Errors raised while building a level
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no spawn pixel")]
    NoSpawn,

    #[error("level has zero width or height")]
    Empty,

    #[error("pixel buffer holds {got} pixels, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("failed to read level image: {0}")]
    Image(#[from] image::ImageError),
}

/// Occupancy grid plus the spawn points found in the source image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    width: i32,
    height: i32,
    /// Row-major cells (`y * width + x`)
    cells: Vec<u8>,
    spawn: IVec2,
    enemy_spawns: Vec<IVec2>,
}

impl Level {
    /// An all-open level
    pub fn new(width: u32, height: u32, spawn: IVec2) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::Empty);
        }
        let mut level = Self {
            width: width as i32,
            height: height as i32,
            cells: vec![OPEN; width as usize * height as usize],
            spawn: IVec2::ZERO,
            enemy_spawns: Vec::new(),
        };
        level.spawn = level.clamp(spawn);
        Ok(level)
    }

    /// Parse a row-major RGB pixel buffer
    pub fn from_rgb(width: u32, height: u32, pixels: &[[u8; 3]]) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::Empty);
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(LevelError::SizeMismatch {
                expected,
                got: pixels.len(),
            });
        }

        let mut cells = vec![OPEN; expected];
        let mut spawn = None;
        let mut enemy_spawns = Vec::new();

        for (i, px) in pixels.iter().enumerate() {
            let pos = IVec2::new((i % width as usize) as i32, (i / width as usize) as i32);
            match Rgb::from(*px) {
                c if c == colors::LEVEL_WALL => cells[i] = WALL,
                c if c == colors::LEVEL_SPAWN => {
                    spawn.get_or_insert(pos);
                }
                c if c == colors::LEVEL_ENEMY => enemy_spawns.push(pos),
                _ => {}
            }
        }

        let spawn = spawn.ok_or(LevelError::NoSpawn)?;
        log::info!(
            "Level {}x{}: spawn at ({}, {}), {} enemies",
            width,
            height,
            spawn.x,
            spawn.y,
            enemy_spawns.len()
        );

        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells,
            spawn,
            enemy_spawns,
        })
    }

    pub fn from_image(img: &RgbImage) -> Result<Self, LevelError> {
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        Self::from_rgb(img.width(), img.height(), &pixels)
    }

    /// Load a level image from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let img = image::open(path.as_ref())?.to_rgb8();
        Self::from_image(&img)
    }

    /// A walled box with the spawn in the middle, used when no level image
    /// is configured
    pub fn arena(width: u32, height: u32, enemies: &[IVec2]) -> Result<Self, LevelError> {
        let mut level = Self::new(width, height, IVec2::new(width as i32 / 2, height as i32 / 2))?;
        let (w, h) = (level.width, level.height);
        for x in 0..w {
            level.set(IVec2::new(x, 0), WALL);
            level.set(IVec2::new(x, h - 1), WALL);
        }
        for y in 0..h {
            level.set(IVec2::new(0, y), WALL);
            level.set(IVec2::new(w - 1, y), WALL);
        }
        level.enemy_spawns = enemies.iter().map(|&p| level.clamp(p)).collect();
        Ok(level)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn spawn(&self) -> IVec2 {
        self.spawn
    }

    pub fn enemy_spawns(&self) -> &[IVec2] {
        &self.enemy_spawns
    }

    /// Clamp a coordinate into the grid
    #[inline]
    pub fn clamp(&self, p: IVec2) -> IVec2 {
        IVec2::new(p.x.clamp(0, self.width - 1), p.y.clamp(0, self.height - 1))
    }

    #[inline]
    fn flat(&self, p: IVec2) -> usize {
        let p = self.clamp(p);
        p.y as usize * self.width as usize + p.x as usize
    }

    #[inline]
    pub fn get(&self, p: IVec2) -> u8 {
        self.cells[self.flat(p)]
    }

    #[inline]
    pub fn is_solid(&self, p: IVec2) -> bool {
        self.get(p) != OPEN
    }

    #[inline]
    pub fn set(&mut self, p: IVec2, value: u8) {
        let i = self.flat(p);
        self.cells[i] = value;
    }

    /// Occupancy of a batch of cells, in input order
    pub fn occupancy(&self, points: &[IVec2]) -> Vec<u8> {
        points.iter().map(|&p| self.get(p)).collect()
    }

    /// Whether any of the cells is solid; false for an empty batch
    pub fn any_solid<I>(&self, points: I) -> bool
    where
        I: IntoIterator<Item = IVec2>,
    {
        points.into_iter().any(|p| self.is_solid(p))
    }

    /// Overwrite a batch of cells
    pub fn carve(&mut self, points: &[IVec2], value: u8) {
        for &p in points {
            self.set(p, value);
        }
    }

    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != OPEN).count()
    }

    /// Draw the visible part of the level with `camera` at the top-left
    pub fn draw(&self, surface: &mut Surface, camera: Vec2) {
        let origin = camera.floor().as_ivec2();
        for sy in 0..surface.height() as i32 {
            let y = origin.y + sy;
            if y < 0 || y >= self.height {
                continue;
            }
            for sx in 0..surface.width() as i32 {
                let x = origin.x + sx;
                if x < 0 || x >= self.width {
                    continue;
                }
                let color = if self.cells[(y * self.width + x) as usize] != OPEN {
                    colors::WALL
                } else {
                    colors::GROUND
                };
                surface.put(sx, sy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BLACK: [u8; 3] = [0, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];
    const BLUE: [u8; 3] = [0, 0, 255];
    const RED: [u8; 3] = [255, 0, 0];

    fn sample_level() -> Level {
        #[rustfmt::skip]
        let pixels = [
            BLACK, WHITE, WHITE, RED,
            WHITE, BLUE,  WHITE, WHITE,
            RED,   WHITE, BLUE,  BLACK,
        ];
        Level::from_rgb(4, 3, &pixels).unwrap()
    }

    #[test]
    fn test_occupancy_then_carve() {
        let mut level = sample_level();
        assert_eq!(level.occupancy(&[IVec2::new(0, 0)]), vec![1]);

        level.carve(&[IVec2::new(0, 0)], 0);
        assert_eq!(level.occupancy(&[IVec2::new(0, 0)]), vec![0]);
    }

    #[test]
    fn test_empty_batch() {
        let level = sample_level();
        assert!(level.occupancy(&[]).is_empty());
        assert!(!level.any_solid(std::iter::empty()));
    }

    #[test]
    fn test_spawn_scan_is_row_major() {
        let level = sample_level();
        assert_eq!(level.spawn(), IVec2::new(1, 1));
        assert_eq!(level.enemy_spawns(), &[IVec2::new(3, 0), IVec2::new(0, 2)]);
        assert_eq!(level.solid_count(), 2);
    }

    #[test]
    fn test_missing_spawn_is_an_error() {
        let pixels = [BLACK, WHITE, RED, WHITE];
        assert!(matches!(
            Level::from_rgb(2, 2, &pixels),
            Err(LevelError::NoSpawn)
        ));
    }

    #[test]
    fn test_size_mismatch() {
        assert!(matches!(
            Level::from_rgb(3, 3, &[BLUE]),
            Err(LevelError::SizeMismatch { expected: 9, got: 1 })
        ));
    }

    #[test]
    fn test_coordinates_are_clamped() {
        let level = sample_level();
        // (-5, -5) clamps to the black corner, (99, 2) to the black right edge
        assert_eq!(level.occupancy(&[IVec2::new(-5, -5), IVec2::new(99, 2)]), vec![1, 1]);
    }

    #[test]
    fn test_arena_has_walls_and_open_center() {
        let level = Level::arena(20, 10, &[IVec2::new(3, 3)]).unwrap();
        assert!(level.is_solid(IVec2::new(0, 5)));
        assert!(level.is_solid(IVec2::new(19, 9)));
        assert!(!level.is_solid(level.spawn()));
        assert_eq!(level.enemy_spawns(), &[IVec2::new(3, 3)]);
    }

    proptest! {
        #[test]
        fn prop_carve_opens_and_is_idempotent(
            points in prop::collection::vec((0i32..16, 0i32..12), 1..40)
        ) {
            let points: Vec<IVec2> = points.into_iter().map(|(x, y)| IVec2::new(x, y)).collect();
            let mut level = Level::new(16, 12, IVec2::ZERO).unwrap();
            level.carve(&[IVec2::new(0, 0), IVec2::new(5, 5), IVec2::new(15, 11)], WALL);

            level.carve(&points, OPEN);
            prop_assert!(level.occupancy(&points).iter().all(|&v| v == 0));

            let once = level.clone();
            level.carve(&points, OPEN);
            prop_assert_eq!(once, level);
        }
    }
}
