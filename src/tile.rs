use std::collections::HashSet;

use rstar::{PointDistance, RTreeObject, AABB};

use crate::error::{CollageError, Result};
use crate::geo::{edge_length, BlockBounds, Coords};
use crate::spatial::SpatialIndex;

/// dx/dy offsets for the four cardinal neighbors: top, right, bottom, left
pub const SIDES: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// One square unit of the displayed surface at a given zoom level.
///
/// `present == false` marks a synthetic placeholder used only to bridge
/// otherwise disjoint islands; placeholders never shadow a real tile at the
/// same coordinate. Identity is (level, x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub x: f64,
    pub y: f64,
    pub level: u8,
    pub present: bool,
}

impl Tile {
    pub fn new(x: f64, y: f64, level: u8) -> Self {
        Self {
            x,
            y,
            level,
            present: true,
        }
    }

    /// Synthetic bridge tile (see `Island::connect`)
    pub fn placeholder(x: f64, y: f64, level: u8) -> Self {
        Self {
            x,
            y,
            level,
            present: false,
        }
    }

    #[inline(always)]
    pub fn edge_length(&self) -> f64 {
        edge_length(self.level)
    }

    /// Top-left corner in block units
    #[inline(always)]
    pub fn origin(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    #[inline(always)]
    pub fn center(&self) -> Coords {
        let half = self.edge_length() / 2.0;
        Coords::new(self.x + half, self.y + half)
    }

    /// The tile's own square footprint
    pub fn bounds(&self) -> BlockBounds {
        let edge = self.edge_length();
        BlockBounds::new(self.x, self.y, self.x + edge, self.y + edge)
    }

    /// Exact-coordinate key of the origin
    #[inline(always)]
    pub fn key(&self) -> (i64, i64) {
        self.origin().key()
    }

    /// Origin of the neighbor `dx` tiles across and `dy` tiles down
    pub fn neighbor_coords(&self, dx: i32, dy: i32) -> Coords {
        let edge = self.edge_length();
        Coords::new(
            self.x + f64::from(dx) * edge,
            self.y + f64::from(dy) * edge,
        )
    }
}

impl RTreeObject for Tile {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let bounds = self.bounds();
        AABB::from_corners([bounds.min_x, bounds.min_y], [bounds.max_x, bounds.max_y])
    }
}

impl PointDistance for Tile {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.center();
        let dx = center.x - point[0];
        let dy = center.y - point[1];
        dx * dx + dy * dy
    }
}

/// Constant-time-ish tile lookup for one zoom level, backed by a spatial
/// index query scoped to the tile's own footprint
#[derive(Debug)]
pub struct TileGrid {
    level: u8,
    index: SpatialIndex<Tile>,
}

impl TileGrid {
    /// Build the grid for one level. Two real tiles with the same identity
    /// are a data-consistency violation, not something to paper over.
    pub fn build(level: u8, tiles: Vec<Tile>) -> Result<Self> {
        let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(tiles.len());
        for tile in &tiles {
            if tile.level != level {
                return Err(CollageError::LevelMismatch {
                    a: level,
                    b: tile.level,
                });
            }
            if tile.present && !seen.insert(tile.key()) {
                return Err(CollageError::DuplicateTile {
                    level,
                    x: tile.x,
                    y: tile.y,
                });
            }
        }
        Ok(Self {
            level,
            index: SpatialIndex::build(tiles),
        })
    }

    #[inline(always)]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline(always)]
    pub fn edge_length(&self) -> f64 {
        edge_length(self.level)
    }

    /// Overall extent of all tiles at this level
    pub fn bounds(&self) -> BlockBounds {
        self.index.bounds()
    }

    /// Fetch the tile whose origin is exactly `coords`. The index query
    /// covers the tile's footprint, so neighbors sharing an edge come back
    /// too; the exact-origin filter drops them.
    pub fn get(&self, coords: Coords) -> Option<&Tile> {
        let edge = self.edge_length();
        let footprint = BlockBounds::new(coords.x, coords.y, coords.x + edge, coords.y + edge);
        self.index
            .search(footprint)
            .into_iter()
            .find(|tile| tile.key() == coords.key())
    }

    pub fn exists(&self, coords: Coords) -> bool {
        self.get(coords).is_some()
    }

    /// Is there a tile directly above (dy == -1), below (dy == 1), left
    /// (dx == -1) or right (dx == 1) of `tile`?
    pub fn has_neighbor(&self, tile: &Tile, dx: i32, dy: i32) -> bool {
        self.exists(tile.neighbor_coords(dx, dy))
    }

    /// Tile whose center is closest to the given point
    pub fn nearest(&self, point: Coords) -> Option<&Tile> {
        self.index.nearest(point)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.index.iter()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
