use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::error::{CollageError, Result};
use crate::geo::{edge_length, Coords};
use crate::tile::Tile;

/// Interior-angle class of a boundary corner, assigned once the full
/// clockwise loop is known
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CornerAngle {
    #[default]
    Unset,
    Straight,
    Convex,
    Concave,
}

/// A vertex of an island's boundary polygon
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub x: f64,
    pub y: f64,
    pub angle: CornerAngle,
}

impl Corner {
    fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            angle: CornerAngle::Unset,
        }
    }

    #[inline(always)]
    pub fn coords(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    // Corner positions are tile corners, so the integer cast is exact
    #[inline(always)]
    fn key(&self) -> (i64, i64) {
        (self.x as i64, self.y as i64)
    }
}

/// Compute the ordered clockwise corner loop of an island's outer boundary.
///
/// For every tile side with no neighboring tile, one boundary edge is
/// emitted using the tile's own corner positions (clockwise from the top
/// left). The edges are then chained start-corner to end-corner into a
/// single closed loop and each corner gets its angle classification.
pub(crate) fn trace(
    island: u32,
    level: u8,
    tiles: &BTreeMap<(i64, i64), Tile>,
) -> Result<Vec<Corner>> {
    let edges = collect_edges(level, tiles);
    if edges.is_empty() {
        return Ok(Vec::new());
    }
    let mut corners = chain_edges(island, &edges)?;
    classify_corners(&mut corners);
    Ok(corners)
}

type Edge = (Corner, Corner);

fn collect_edges(level: u8, tiles: &BTreeMap<(i64, i64), Tile>) -> Vec<Edge> {
    let edge = edge_length(level);

    // Offsets of a tile's corners relative to its origin, clockwise from
    // the top left
    let corner_offsets = [(0.0, 0.0), (edge, 0.0), (edge, edge), (0.0, edge)];

    // For each cardinal side: the offset of the would-be neighbor and the
    // indices into corner_offsets that form that side's boundary edge
    let sides: [((f64, f64), (usize, usize)); 4] = [
        ((0.0, -edge), (0, 1)),
        ((edge, 0.0), (1, 2)),
        ((0.0, edge), (2, 3)),
        ((-edge, 0.0), (3, 0)),
    ];

    let mut edges = Vec::new();
    for tile in tiles.values() {
        for &((dx, dy), (c1, c2)) in &sides {
            let neighbor = Coords::new(tile.x + dx, tile.y + dy);
            if tiles.contains_key(&neighbor.key()) {
                continue;
            }
            let (ox1, oy1) = corner_offsets[c1];
            let (ox2, oy2) = corner_offsets[c2];
            edges.push((
                Corner::new(tile.x + ox1, tile.y + oy1),
                Corner::new(tile.x + ox2, tile.y + oy2),
            ));
        }
    }
    edges
}

/// Chain boundary edges into one closed loop by repeatedly following the
/// edge whose start corner matches the end of the chain so far. Edges are
/// indexed by start corner; when several unused edges share one start
/// corner the first in emission order is taken, which the input data should
/// never produce, so it is reported.
fn chain_edges(island: u32, edges: &[Edge]) -> Result<Vec<Corner>> {
    let mut by_start: HashMap<(i64, i64), Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, (start, _)) in edges.iter().enumerate() {
        by_start.entry(start.key()).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    used[0] = true;
    let mut corners = vec![edges[0].0, edges[0].1];

    while corners.len() < edges.len() {
        let looking_for = corners[corners.len() - 1];
        let candidates = by_start.get(&looking_for.key()).map_or(&[][..], Vec::as_slice);
        let mut remaining = candidates.iter().filter(|&&i| !used[i]);
        let next = remaining.next().copied().ok_or(CollageError::BrokenBoundary {
            island,
            x: looking_for.x,
            y: looking_for.y,
        })?;
        if remaining.next().is_some() {
            warn!(
                "island {island}: multiple boundary edges start at ({}, {})",
                looking_for.x, looking_for.y
            );
        }
        used[next] = true;
        corners.push(edges[next].1);
    }

    Ok(corners)
}

/// Assign every corner its angle class from the directions of the two
/// edges meeting there. Only axis-aligned edges exist at this stage, so a
/// vector's dominant axis is x unless its x-component is zero.
fn classify_corners(corners: &mut [Corner]) {
    let n = corners.len();
    for i in 0..n {
        let prev = corners[(i + n - 1) % n].coords();
        let cur = corners[i].coords();
        let next = corners[(i + 1) % n].coords();
        corners[i].angle = classify(prev, cur, next);
    }
}

fn classify(prev: Coords, cur: Coords, next: Coords) -> CornerAngle {
    let v1 = Coords::new(prev.x - cur.x, prev.y - cur.y);
    let v2 = Coords::new(next.x - cur.x, next.y - cur.y);

    let v1_along_x = v1.x != 0.0;
    let v2_along_x = v2.x != 0.0;
    let sign1 = if v1_along_x { v1.x } else { v1.y }.signum();
    let sign2 = if v2_along_x { v2.x } else { v2.y }.signum();

    // Clockwise winding: which axis pairing with which sign pairing turns
    // inward vs outward
    if v1_along_x == v2_along_x {
        CornerAngle::Straight
    } else if v1_along_x {
        // (x, y) pairing
        if sign1 == sign2 {
            CornerAngle::Concave
        } else {
            CornerAngle::Convex
        }
    } else {
        // (y, x) pairing
        if sign1 != sign2 {
            CornerAngle::Concave
        } else {
            CornerAngle::Convex
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_map(level: u8, origins: &[(f64, f64)]) -> BTreeMap<(i64, i64), Tile> {
        origins
            .iter()
            .map(|&(x, y)| {
                let tile = Tile::new(x, y, level);
                (tile.key(), tile)
            })
            .collect()
    }

    fn count(corners: &[Corner], angle: CornerAngle) -> usize {
        corners.iter().filter(|c| c.angle == angle).count()
    }

    #[test]
    fn test_single_tile_square() {
        let tiles = tile_map(0, &[(0.0, 0.0)]);
        let corners = trace(0, 0, &tiles).unwrap();
        assert_eq!(corners.len(), 4);
        assert_eq!(count(&corners, CornerAngle::Convex), 4);
    }

    #[test]
    fn test_horizontal_domino() {
        let tiles = tile_map(0, &[(0.0, 0.0), (128.0, 0.0)]);
        let corners = trace(0, 0, &tiles).unwrap();
        // 2x1 rectangle: the shared-edge midpoints survive as straight corners
        assert_eq!(corners.len(), 6);
        assert_eq!(count(&corners, CornerAngle::Convex), 4);
        assert_eq!(count(&corners, CornerAngle::Straight), 2);
        assert_eq!(count(&corners, CornerAngle::Concave), 0);
    }

    #[test]
    fn test_l_shape_has_one_concave_corner() {
        // 2x2 block missing the bottom-right tile
        let tiles = tile_map(0, &[(0.0, 0.0), (128.0, 0.0), (0.0, 128.0)]);
        let corners = trace(0, 0, &tiles).unwrap();
        assert_eq!(count(&corners, CornerAngle::Concave), 1);
        // The notch sits at the inner shared corner
        let notch = corners
            .iter()
            .find(|c| c.angle == CornerAngle::Concave)
            .unwrap();
        assert_eq!((notch.x, notch.y), (128.0, 128.0));
    }

    #[test]
    fn test_convex_minus_concave_is_four() {
        // Staircase with several notches
        let tiles = tile_map(
            0,
            &[
                (0.0, 0.0),
                (128.0, 0.0),
                (256.0, 0.0),
                (256.0, 128.0),
                (256.0, 256.0),
                (128.0, 128.0),
            ],
        );
        let corners = trace(0, 0, &tiles).unwrap();
        let convex = count(&corners, CornerAngle::Convex) as i64;
        let concave = count(&corners, CornerAngle::Concave) as i64;
        assert_eq!(convex - concave, 4);
    }

    #[test]
    fn test_loop_is_closed_and_axis_aligned() {
        let tiles = tile_map(3, &[(0.0, 0.0), (1024.0, 0.0), (1024.0, 1024.0)]);
        let corners = trace(0, 3, &tiles).unwrap();
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            // every edge is horizontal or vertical, never degenerate
            assert!((a.x == b.x) != (a.y == b.y));
        }
        assert!(!corners.iter().any(|c| c.angle == CornerAngle::Unset));
    }

    #[test]
    fn test_disconnected_tiles_break_the_chain() {
        // two loops' worth of edges can never chain into one; the caller
        // (flood fill) guarantees this never holds real island data
        let tiles = tile_map(0, &[(0.0, 0.0), (512.0, 512.0)]);
        let err = trace(9, 0, &tiles).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CollageError::BrokenBoundary { island: 9, .. }
        ));
    }

    #[test]
    fn test_level_scales_corner_positions() {
        let tiles = tile_map(3, &[(0.0, 0.0)]);
        let corners = trace(0, 3, &tiles).unwrap();
        assert!(corners.iter().any(|c| (c.x, c.y) == (1024.0, 1024.0)));
    }
}
