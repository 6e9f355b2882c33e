//! Small geometric helpers shared by the search pipeline.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in image space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a `width x height` image.
    pub fn of_image(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    #[inline]
    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x >= self.x && p.y >= self.y && p.x <= self.x + self.width && p.y <= self.y + self.height
    }
}

/// Unit vector at `degrees` from the +x axis.
#[inline]
pub fn angle_unit_vector(degrees: f32) -> Vector2<f32> {
    let r = degrees.to_radians();
    Vector2::new(r.cos(), r.sin())
}

/// Counter-clockwise perpendicular.
#[inline]
pub fn perpendicular(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(-v.y, v.x)
}

/// Clip the segment `p0 -> p1` to `rect` (Liang-Barsky).
///
/// Returns `None` when the segment misses the rectangle entirely.
pub fn clip_segment(
    p0: Point2<f32>,
    p1: Point2<f32>,
    rect: &Rect,
) -> Option<(Point2<f32>, Point2<f32>)> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    let checks = [
        (-dx, p0.x - rect.x),
        (dx, rect.x + rect.width - p0.x),
        (-dy, p0.y - rect.y),
        (dy, rect.y + rect.height - p0.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    Some((
        Point2::new(p0.x + t0 * dx, p0.y + t0 * dy),
        Point2::new(p0.x + t1 * dx, p0.y + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clip_keeps_interior_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) =
            clip_segment(Point2::new(2.0, 2.0), Point2::new(8.0, 8.0), &rect).expect("clip");
        assert_relative_eq!(a.x, 2.0);
        assert_relative_eq!(b.y, 8.0);
    }

    #[test]
    fn clip_trims_crossing_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let (a, b) =
            clip_segment(Point2::new(-10.0, 5.0), Point2::new(20.0, 5.0), &rect).expect("clip");
        assert_relative_eq!(a.x, 0.0);
        assert_relative_eq!(b.x, 10.0);
    }

    #[test]
    fn clip_rejects_missing_segment() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(clip_segment(Point2::new(-5.0, -5.0), Point2::new(-1.0, -2.0), &rect).is_none());
    }

    #[test]
    fn perpendicular_rotates_ccw() {
        let v = perpendicular(Vector2::new(1.0, 0.0));
        assert_relative_eq!(v.x, 0.0);
        assert_relative_eq!(v.y, 1.0);
    }
}
