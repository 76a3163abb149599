use glam::DVec2;

use crate::geo::{closest_point_on_segment, Coords};
use crate::island::boundary::{Corner, CornerAngle};

/// A collision line of an island's simplified outline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub a: Coords,
    pub b: Coords,
}

/// The simplified outline of an island: the boundary loop with its concave
/// corners dropped, so notches are cut across by 45° diagonals. Convex
/// corners stay verbatim, so the shape is not necessarily convex.
///
/// This is what map panning is clamped against and what point containment
/// is tested against.
#[derive(Clone, Debug, Default)]
pub struct IslandShape {
    lines: Vec<Line>,
}

impl IslandShape {
    /// Connect the non-concave corners of a closed clockwise loop, wrapping
    /// at the end
    pub(crate) fn from_corners(corners: &[Corner]) -> Self {
        let kept: Vec<Coords> = corners
            .iter()
            .filter(|c| c.angle != CornerAngle::Concave)
            .map(Corner::coords)
            .collect();

        let mut lines = Vec::with_capacity(kept.len());
        for i in 0..kept.len() {
            lines.push(Line {
                a: kept[i],
                b: kept[(i + 1) % kept.len()],
            });
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Even-odd point-in-polygon test: cast a horizontal ray to the right
    /// and count edge crossings
    pub fn contains(&self, point: Coords) -> bool {
        let mut inside = false;
        for line in &self.lines {
            let (a, b) = (line.a, line.b);
            // half-open y range so shared endpoints are counted once
            if (a.y > point.y) != (b.y > point.y) {
                let x_at_y = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x_at_y {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Project a point outside the outline onto the closest point of the
    /// outline; points already inside come back unchanged. Used to keep the
    /// viewport center within an island's bounds.
    pub fn clamp(&self, point: Coords) -> Coords {
        if self.lines.is_empty() || self.contains(point) {
            return point;
        }
        let p = DVec2::from(point);
        let mut best = DVec2::from(self.lines[0].a);
        let mut best_dist = f64::INFINITY;
        for line in &self.lines {
            let candidate = closest_point_on_segment(p, line.a.into(), line.b.into());
            let dist = candidate.distance_squared(p);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::boundary::trace;
    use crate::tile::Tile;
    use std::collections::BTreeMap;

    fn shape_of(origins: &[(f64, f64)]) -> (Vec<Corner>, IslandShape) {
        let tiles: BTreeMap<(i64, i64), Tile> = origins
            .iter()
            .map(|&(x, y)| {
                let tile = Tile::new(x, y, 0);
                (tile.key(), tile)
            })
            .collect();
        let corners = trace(0, 0, &tiles).unwrap();
        let shape = IslandShape::from_corners(&corners);
        (corners, shape)
    }

    #[test]
    fn test_contains_tile_centers() {
        let (_, shape) = shape_of(&[(0.0, 0.0), (128.0, 0.0)]);
        assert!(shape.contains(Coords::new(64.0, 64.0)));
        assert!(shape.contains(Coords::new(192.0, 64.0)));
    }

    #[test]
    fn test_far_outside_is_not_contained() {
        let (_, shape) = shape_of(&[(0.0, 0.0)]);
        assert!(!shape.contains(Coords::new(-1280.0, 64.0)));
        assert!(!shape.contains(Coords::new(64.0, 5000.0)));
    }

    #[test]
    fn test_l_shape_outline_cuts_the_notch() {
        let (corners, shape) = shape_of(&[(0.0, 0.0), (128.0, 0.0), (0.0, 128.0)]);
        // One concave corner dropped
        assert_eq!(shape.lines().len(), corners.len() - 1);
        // The diagonal runs from (256, 128) to (128, 256): the notch side of
        // it is kept, the far side is cut away
        assert!(shape.contains(Coords::new(200.0, 150.0)));
        assert!(!shape.contains(Coords::new(250.0, 250.0)));
        assert!(shape.contains(Coords::new(64.0, 64.0)));
    }

    #[test]
    fn test_clamp_inside_is_identity() {
        let (_, shape) = shape_of(&[(0.0, 0.0)]);
        let p = Coords::new(30.0, 90.0);
        assert_eq!(shape.clamp(p), p);
    }

    #[test]
    fn test_clamp_projects_to_nearest_edge() {
        let (_, shape) = shape_of(&[(0.0, 0.0)]);
        let clamped = shape.clamp(Coords::new(64.0, -50.0));
        assert_eq!(clamped, Coords::new(64.0, 0.0));
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let (_, shape) = shape_of(&[(0.0, 0.0), (128.0, 0.0), (0.0, 128.0)]);
        for p in [
            Coords::new(400.0, 400.0),
            Coords::new(-77.0, 13.0),
            Coords::new(64.0, 64.0),
            Coords::new(300.0, -9.0),
        ] {
            let once = shape.clamp(p);
            let twice = shape.clamp(once);
            assert!(once.distance(twice) < 1e-9);
        }
    }
}
