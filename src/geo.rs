use glam::DVec2;
use serde::Deserialize;

/// Side length in blocks of a level-0 tile (matches the in-game map size)
pub const BASE_EDGE: f64 = 128.0;

/// Edge length in blocks of a tile at the given zoom level.
/// Each level doubles the linear size of the previous one.
#[inline(always)]
pub fn edge_length(level: u8) -> f64 {
    BASE_EDGE * f64::from(1u32 << level)
}

/// A point in world (block) units
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    #[inline(always)]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Integer key for exact-coordinate indexing (tile origins are
    /// whole multiples of the edge length, so the cast is lossless)
    #[inline(always)]
    pub fn key(&self) -> (i64, i64) {
        (self.x as i64, self.y as i64)
    }

    #[inline(always)]
    pub fn distance(&self, other: Coords) -> f64 {
        DVec2::from(*self).distance(other.into())
    }
}

impl From<Coords> for DVec2 {
    #[inline(always)]
    fn from(c: Coords) -> Self {
        DVec2::new(c.x, c.y)
    }
}

impl From<DVec2> for Coords {
    #[inline(always)]
    fn from(v: DVec2) -> Self {
        Coords::new(v.x, v.y)
    }
}

/// Axis-aligned bounding box in block units.
/// `EMPTY` uses infinite sentinels so that expanding by any point works
/// without a separate "first point" case.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BlockBounds {
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    #[inline(always)]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow to include a point
    pub fn expand(&mut self, point: Coords) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    /// Grow to include another box
    pub fn union(&mut self, other: &BlockBounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    #[inline(always)]
    pub fn contains(&self, point: Coords) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    #[inline(always)]
    pub fn intersects(&self, other: &BlockBounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    #[inline(always)]
    pub fn center(&self) -> Coords {
        Coords::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Closest point to `p` on the segment `a`..`b`
pub fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// A position in collage pixel space (left/top, as the rendering layer uses)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPosition {
    pub left: f64,
    pub top: f64,
}

impl PixelPosition {
    #[inline(always)]
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Pixel dimensions of the full collage or of a viewport
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelDimensions {
    pub width: f64,
    pub height: f64,
}

impl PixelDimensions {
    #[inline(always)]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_length_doubles_per_level() {
        assert_eq!(edge_length(0), 128.0);
        assert_eq!(edge_length(1), 256.0);
        assert_eq!(edge_length(3), 1024.0);
    }

    #[test]
    fn test_empty_bounds_expand() {
        let mut bounds = BlockBounds::EMPTY;
        assert!(bounds.is_empty());
        bounds.expand(Coords::new(5.0, -3.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min_x, 5.0);
        assert_eq!(bounds.max_y, -3.0);
    }

    #[test]
    fn test_bounds_intersects_touching() {
        let a = BlockBounds::new(0.0, 0.0, 128.0, 128.0);
        let b = BlockBounds::new(128.0, 0.0, 256.0, 128.0);
        // Boxes sharing an edge count as intersecting
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_closest_point_on_segment() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        let p = DVec2::new(5.0, 3.0);
        assert_eq!(closest_point_on_segment(p, a, b), DVec2::new(5.0, 0.0));
        // Beyond the endpoint clamps to it
        let q = DVec2::new(15.0, 3.0);
        assert_eq!(closest_point_on_segment(q, a, b), b);
    }
}
