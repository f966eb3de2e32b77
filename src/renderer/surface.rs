//! CPU pixel buffer with an optional transparent color key

use glam::IVec2;
use image::RgbImage;

use super::Rgb;

/// A rectangular RGB pixel buffer
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    /// Pixels of this color are skipped when blitting
    color_key: Option<Rgb>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb::default())
    }

    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
            color_key: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn set_color_key(&mut self, key: Option<Rgb>) {
        self.color_key = key;
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Set a pixel; writes outside the surface are dropped
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Copy `src` onto this surface with its top-left corner at `dst`,
    /// skipping `src`'s color-keyed pixels
    pub fn blit(&mut self, src: &Surface, dst: IVec2) {
        for y in 0..src.height as i32 {
            for x in 0..src.width as i32 {
                let color = src.pixels[y as usize * src.width as usize + x as usize];
                if src.color_key == Some(color) {
                    continue;
                }
                self.put(dst.x + x, dst.y + y, color);
            }
        }
    }

    /// Coordinates of every pixel that differs from `key`, row by row
    pub fn pixels_unlike(&self, key: Rgb) -> Vec<IVec2> {
        let mut out = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self.pixels[y as usize * self.width as usize + x as usize] != key {
                    out.push(IVec2::new(x, y));
                }
            }
        }
        out
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            image::Rgb(self.pixels[y as usize * self.width as usize + x as usize].to_array())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_out_of_bounds_is_dropped() {
        let mut s = Surface::new(4, 4);
        s.put(-1, 0, Rgb::new(1, 2, 3));
        s.put(4, 4, Rgb::new(1, 2, 3));
        assert!(s.pixels_unlike(Rgb::default()).is_empty());
    }

    #[test]
    fn test_blit_respects_color_key() {
        let mut dst = Surface::filled(4, 4, Rgb::new(9, 9, 9));
        let mut src = Surface::new(2, 2);
        src.set_color_key(Some(Rgb::default()));
        src.put(1, 1, Rgb::new(200, 0, 0));

        dst.blit(&src, IVec2::new(1, 1));
        assert_eq!(dst.get(1, 1), Some(Rgb::new(9, 9, 9)));
        assert_eq!(dst.get(2, 2), Some(Rgb::new(200, 0, 0)));
    }
}
