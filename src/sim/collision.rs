//! Collision detection between bullets, unit silhouettes and terrain
//!
//! Units collide through their hitzone: the pixel mask of their last rendered
//! silhouette. Bullets are short line segments covering the distance they
//! travelled this frame.

use glam::{IVec2, Vec2};

use super::bullet::Bullet;
use super::terrain::Level;
use super::unit::Unit;
use crate::cell_of;
use crate::consts::{HIT_LINE_TOLERANCE, HIT_MARGIN};

/// Axis-aligned box around a bullet's travel segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl TravelBox {
    /// Box spanning `pos - vel` to `pos`, grown by `margin` on every side
    pub fn around(pos: Vec2, vel: Vec2, margin: f32) -> Self {
        let back = pos - vel;
        Self {
            min: pos.min(back) - Vec2::splat(margin),
            max: pos.max(back) + Vec2::splat(margin),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Perpendicular distance from `point` to the line through `origin` along `vel`
///
/// A zero velocity degenerates to the plain distance from `origin`.
#[inline]
pub fn line_distance(origin: Vec2, vel: Vec2, point: Vec2) -> f32 {
    let speed = vel.length();
    if speed <= f32::EPSILON {
        return origin.distance(point);
    }
    vel.perp_dot(point - origin).abs() / speed
}

/// Check whether a bullet hits a unit this frame
///
/// Never hits on the bullet's spawn frame, never hits its owner (or, for enemy
/// fire, any enemy), and never hits a unit without a hitzone.
pub fn bullet_hits_unit(bullet: &Bullet, unit: &Unit) -> bool {
    if bullet.is_fresh() || !bullet.parent.may_hit(unit) || unit.hitzone().is_empty() {
        return false;
    }

    let bounds = TravelBox::around(bullet.pos, bullet.vel, HIT_MARGIN);
    unit.hitzone_points().any(|p| {
        bounds.contains(p) && line_distance(bullet.pos, bullet.vel, p) <= HIT_LINE_TOLERANCE
    })
}

/// Integer line between two cells, both endpoints included
pub fn raster_line(from: IVec2, to: IVec2) -> Vec<IVec2> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let mut p = from;
    let mut err = dx + dy;
    loop {
        points.push(p);
        if p == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            p.x += sx;
        }
        if e2 <= dx {
            err += dx;
            p.y += sy;
        }
    }
    points
}

/// Radius of the hole a bullet of `damage` blasts into a wall
#[inline]
pub fn explosion_radius(damage: f32) -> i32 {
    (damage.max(0.0).sqrt() * 3.0).round() as i32
}

/// Every cell within `radius` of `center`
pub fn explosion_points(center: IVec2, radius: i32) -> Vec<IVec2> {
    let r2 = radius * radius;
    let mut points = Vec::new();
    for x in center.x - radius..=center.x + radius {
        for y in center.y - radius..=center.y + radius {
            let d = IVec2::new(x, y) - center;
            if d.x * d.x + d.y * d.y <= r2 {
                points.push(IVec2::new(x, y));
            }
        }
    }
    points
}

/// Find where a bullet's travel segment first enters a wall
///
/// Returns the solid cell closest to the bullet's previous position, or
/// `None` if the whole segment is open.
pub fn wall_impact(bullet: &Bullet, level: &Level) -> Option<IVec2> {
    let back = cell_of(bullet.previous_pos());
    let mut closest: Option<(IVec2, i32)> = None;

    for p in raster_line(cell_of(bullet.pos), back) {
        if !level.is_solid(p) {
            continue;
        }
        let d = (p - back).length_squared();
        if closest.is_none_or(|(_, best)| d < best) {
            closest = Some((p, d));
        }
    }
    closest.map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BULLET_LIFESPAN;
    use crate::renderer::colors;
    use crate::sim::bullet::{BulletKind, ParentRef, Team};

    fn bullet_at(pos: Vec2, vel: Vec2, parent: u32) -> Bullet {
        let mut b = Bullet::new(
            100,
            pos,
            vel,
            ParentRef {
                uid: parent,
                team: Team::Players,
            },
            colors::ECHO,
            4.0,
            BulletKind::Standard,
        );
        b.lifespan = BULLET_LIFESPAN - 1;
        b
    }

    fn drawn_enemy(uid: u32, pos: Vec2) -> Unit {
        let mut unit = Unit::enemy(uid, pos);
        unit.refresh_hitzone();
        unit
    }

    #[test]
    fn test_raster_line_includes_endpoints() {
        let line = raster_line(IVec2::new(0, 0), IVec2::new(4, 2));
        assert_eq!(line.first(), Some(&IVec2::new(0, 0)));
        assert_eq!(line.last(), Some(&IVec2::new(4, 2)));
        assert_eq!(line.len(), 5);

        let single = raster_line(IVec2::new(3, 3), IVec2::new(3, 3));
        assert_eq!(single, vec![IVec2::new(3, 3)]);

        let steep = raster_line(IVec2::new(0, 5), IVec2::new(0, 0));
        assert_eq!(steep.len(), 6);
        assert_eq!(steep[1], IVec2::new(0, 4));
    }

    #[test]
    fn test_explosion_radius() {
        assert_eq!(explosion_radius(4.0), 6);
        assert_eq!(explosion_radius(1.0), 3);
        assert_eq!(explosion_radius(2.0), 4); // 4.24 rounds down
        assert_eq!(explosion_radius(-1.0), 0);
        assert_eq!(explosion_points(IVec2::new(5, 5), 0), vec![IVec2::new(5, 5)]);
    }

    #[test]
    fn test_line_distance() {
        let d = line_distance(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(3.0, 2.0));
        assert!((d - 2.0).abs() < 1e-5);
        let d = line_distance(Vec2::ZERO, Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_bullet_hits_unit_on_path() {
        let enemy = drawn_enemy(7, Vec2::new(50.0, 50.0));
        let bullet = bullet_at(Vec2::new(52.0, 50.5), Vec2::new(12.0, 0.0), 1);
        assert!(bullet_hits_unit(&bullet, &enemy));

        let wide = bullet_at(Vec2::new(52.0, 70.0), Vec2::new(12.0, 0.0), 1);
        assert!(!bullet_hits_unit(&wide, &enemy));
    }

    #[test]
    fn test_bullet_never_hits_its_parent() {
        let mut unit = Unit::player(1, Vec2::new(50.0, 50.0), 0);
        unit.refresh_hitzone();
        let bullet = bullet_at(Vec2::new(50.0, 50.5), Vec2::new(8.0, 0.0), 1);
        assert!(!bullet_hits_unit(&bullet, &unit));
    }

    #[test]
    fn test_fresh_bullet_and_empty_hitzone_never_hit() {
        let enemy = drawn_enemy(7, Vec2::new(50.0, 50.0));
        let mut fresh = bullet_at(Vec2::new(52.0, 50.5), Vec2::new(12.0, 0.0), 1);
        fresh.lifespan = BULLET_LIFESPAN;
        assert!(!bullet_hits_unit(&fresh, &enemy));

        let undrawn = Unit::enemy(8, Vec2::new(50.0, 50.0));
        let bullet = bullet_at(Vec2::new(52.0, 50.5), Vec2::new(12.0, 0.0), 1);
        assert!(!bullet_hits_unit(&bullet, &undrawn));
    }

    #[test]
    fn test_wall_impact_picks_cell_nearest_previous_position() {
        let mut level = Level::new(40, 10, IVec2::new(1, 1)).unwrap();
        level.carve(&[IVec2::new(20, 5), IVec2::new(21, 5), IVec2::new(22, 5)], 1);

        let bullet = bullet_at(Vec2::new(24.5, 5.5), Vec2::new(12.0, 0.0), 1);
        assert_eq!(wall_impact(&bullet, &level), Some(IVec2::new(20, 5)));

        let clear = bullet_at(Vec2::new(14.5, 5.5), Vec2::new(12.0, 0.0), 1);
        assert_eq!(wall_impact(&clear, &level), None);
    }
}
