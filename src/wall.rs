// --- File: wall.rs ---
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Solid axis-aligned obstacle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Wall {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        // Negative extents are normalized so `min <= max` always holds.
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self { x, y, width, height }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    /// Point of the rectangle nearest to `point` (the point itself when inside).
    #[inline]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    #[inline]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        point.distance(self.closest_point(point))
    }

    /// True when a circle of `radius` at `center` overlaps the rectangle.
    #[inline]
    pub fn collides(&self, center: Vec2, radius: f32) -> bool {
        self.distance_to(center) < radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_onto_the_rectangle() {
        let wall = Wall::new(10.0, 10.0, 20.0, 10.0);
        assert_eq!(wall.closest_point(Vec2::new(0.0, 15.0)), Vec2::new(10.0, 15.0));
        assert_eq!(wall.closest_point(Vec2::new(40.0, 40.0)), Vec2::new(30.0, 20.0));
        assert_eq!(wall.closest_point(Vec2::new(15.0, 12.0)), Vec2::new(15.0, 12.0));
    }

    #[test]
    fn collision_uses_distance_to_closest_point() {
        let wall = Wall::new(0.0, 0.0, 10.0, 10.0);
        assert!(wall.collides(Vec2::new(13.0, 5.0), 4.0));
        assert!(!wall.collides(Vec2::new(15.0, 5.0), 4.0));
    }

    #[test]
    fn negative_extents_are_normalized() {
        let wall = Wall::new(10.0, 10.0, -5.0, -5.0);
        assert_eq!(wall.min(), Vec2::new(5.0, 5.0));
        assert_eq!(wall.max(), Vec2::new(10.0, 10.0));
    }
}

// --- End of File: wall.rs ---
