//! Software rendering module
//!
//! Everything is rasterized into CPU-side `Surface`s. Unit silhouettes are
//! rendered here too, which is how the simulation learns each unit's hitzone.

pub mod shapes;
pub mod surface;

pub use surface::Surface;

use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self(c[0], c[1], c[2])
    }
}

/// Colors for game elements
pub mod colors {
    use super::Rgb;

    /// Background key of off-screen silhouettes (never a unit color)
    pub const KEY: Rgb = Rgb::new(0, 0, 0);
    pub const LIVE_PLAYER: Rgb = Rgb::new(0, 255, 255);
    pub const ECHO: Rgb = Rgb::new(255, 255, 255);
    pub const ENEMY: Rgb = Rgb::new(255, 0, 0);
    pub const BURNING: Rgb = Rgb::new(255, 150, 0);
    pub const GROUND: Rgb = Rgb::new(122, 94, 62);
    pub const WALL: Rgb = Rgb::new(235, 235, 235);
    pub const BACKGROUND: Rgb = Rgb::new(255, 255, 255);

    /// Level image legend
    pub const LEVEL_WALL: Rgb = Rgb::new(0, 0, 0);
    pub const LEVEL_SPAWN: Rgb = Rgb::new(0, 0, 255);
    pub const LEVEL_ENEMY: Rgb = Rgb::new(255, 0, 0);
}
