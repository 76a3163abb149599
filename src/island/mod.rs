mod boundary;
mod shape;

pub use boundary::{Corner, CornerAngle};
pub use shape::{IslandShape, Line};

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use log::warn;

use crate::error::{CollageError, Result};
use crate::geo::{edge_length, BlockBounds, Coords};
use crate::poi::PoiId;
use crate::tile::{Tile, TileGrid, SIDES};

/// Process-unique island identifier
pub type IslandId = u32;

static NEXT_ISLAND_ID: AtomicU32 = AtomicU32::new(0);

/// A maximal contiguous group of same-level tiles.
///
/// Islands hold their tiles and, once `find_edges` has run, the clockwise
/// corner loop of their outer boundary plus the simplified outline used for
/// containment and panning-clamp queries. Tile-to-island ownership lookups
/// go through `IslandRegistry`, not through the islands themselves.
#[derive(Clone, Debug)]
pub struct Island {
    id: IslandId,
    level: u8,
    // keyed and ordered by origin so boundary edge emission is
    // deterministic across rebuilds
    tiles: BTreeMap<(i64, i64), Tile>,
    bounds: BlockBounds,
    corners: Vec<Corner>,
    shape: Option<IslandShape>,
    pois: Vec<PoiId>,
}

impl Island {
    pub fn new(level: u8) -> Self {
        Self {
            id: NEXT_ISLAND_ID.fetch_add(1, Ordering::Relaxed),
            level,
            tiles: BTreeMap::new(),
            bounds: BlockBounds::EMPTY,
            corners: Vec::new(),
            shape: None,
            pois: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> IslandId {
        self.id
    }

    #[inline(always)]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline(always)]
    pub fn edge_length(&self) -> f64 {
        edge_length(self.level)
    }

    /// Add a tile. A real tile silently wins over a placeholder at the same
    /// coordinate; a second real tile there is a data-consistency error.
    pub fn add_tile(&mut self, tile: Tile) -> Result<()> {
        if tile.level != self.level {
            return Err(CollageError::LevelMismatch {
                a: self.level,
                b: tile.level,
            });
        }
        if let Some(existing) = self.tiles.get(&tile.key()) {
            if existing.present && tile.present {
                return Err(CollageError::DuplicateTile {
                    level: self.level,
                    x: tile.x,
                    y: tile.y,
                });
            }
            if existing.present {
                // incoming placeholder loses to the real tile
                return Ok(());
            }
        }
        let bounds = tile.bounds();
        self.bounds.expand(Coords::new(bounds.min_x, bounds.min_y));
        self.bounds.expand(Coords::new(bounds.max_x, bounds.max_y));
        self.tiles.insert(tile.key(), tile);
        Ok(())
    }

    pub fn add_tiles(&mut self, tiles: impl IntoIterator<Item = Tile>) -> Result<()> {
        for tile in tiles {
            self.add_tile(tile)?;
        }
        Ok(())
    }

    /// Constant-time membership check by tile origin
    pub fn contains_tile_at(&self, coords: Coords) -> bool {
        self.tiles.contains_key(&coords.key())
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    #[inline(always)]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline(always)]
    pub fn bounds(&self) -> BlockBounds {
        self.bounds
    }

    /// Compute the boundary corner loop and the simplified outline. Must be
    /// rerun after `connect`, which never carries boundaries over.
    pub fn find_edges(&mut self) -> Result<()> {
        let corners = boundary::trace(self.id, self.level, &self.tiles)?;
        self.shape = Some(IslandShape::from_corners(&corners));
        self.corners = corners;
        Ok(())
    }

    /// Ordered clockwise boundary corners; empty until `find_edges` runs
    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    pub fn has_boundary(&self) -> bool {
        !self.corners.is_empty()
    }

    /// Simplified concave-skipping outline; `None` until `find_edges` runs
    pub fn shape(&self) -> Option<&IslandShape> {
        self.shape.as_ref()
    }

    /// Tile whose center is closest to the given point
    pub fn tile_nearest(&self, point: Coords) -> Option<&Tile> {
        self.tiles.values().min_by(|a, b| {
            let da = a.center().distance(point);
            let db = b.center().distance(point);
            da.total_cmp(&db)
        })
    }

    pub(crate) fn add_poi(&mut self, poi: PoiId) {
        self.pois.push(poi);
    }

    /// Ids of the points of interest that lie on this island's tiles
    pub fn poi_ids(&self) -> &[PoiId] {
        &self.pois
    }

    /// Do the two islands share a tile coordinate or a tile adjacency?
    /// Scans the smaller tile set against the other's coordinate index.
    fn touches(&self, other: &Island) -> bool {
        let (small, large) = if self.tiles.len() <= other.tiles.len() {
            (self, other)
        } else {
            (other, self)
        };
        let edge = edge_length(small.level) as i64;
        for &(x, y) in small.tiles.keys() {
            if large.tiles.contains_key(&(x, y)) {
                return true;
            }
            for (dx, dy) in SIDES {
                let key = (x + i64::from(dx) * edge, y + i64::from(dy) * edge);
                if large.tiles.contains_key(&key) {
                    return true;
                }
            }
        }
        false
    }

    /// Merge two same-level islands into a new island holding the union of
    /// their tiles. Islands that are not already adjacent get bridged by a
    /// path of placeholder tiles running from the tile nearest `a`'s
    /// bounding-box center toward the tile nearest `b`'s, x first, then y.
    ///
    /// The merged island never has a computed boundary; run `find_edges` on
    /// it before using corners or the outline.
    pub fn connect(a: &Island, b: &Island) -> Result<Island> {
        if a.level != b.level {
            return Err(CollageError::LevelMismatch {
                a: a.level,
                b: b.level,
            });
        }
        if a.tiles.is_empty() {
            return Err(CollageError::EmptyIsland { id: a.id });
        }
        if b.tiles.is_empty() {
            return Err(CollageError::EmptyIsland { id: b.id });
        }
        if a.has_boundary() || b.has_boundary() {
            warn!(
                "connecting islands {} and {}: boundaries do not carry over, \
                 rerun find_edges on the result",
                a.id, b.id
            );
        }

        let mut merged = Island::new(a.level);
        merged.add_tiles(a.tiles.values().copied())?;
        merged.add_tiles(b.tiles.values().copied())?;

        if !a.touches(b) {
            let edge = edge_length(a.level);
            let Some(start) = a.tile_nearest(a.bounds.center()) else {
                return Err(CollageError::EmptyIsland { id: a.id });
            };
            let Some(target) = b.tile_nearest(b.bounds.center()) else {
                return Err(CollageError::EmptyIsland { id: b.id });
            };

            let (mut x, mut y) = (start.x, start.y);
            while (target.x - x).abs() > edge / 2.0 {
                x += edge * (target.x - x).signum();
                merged.add_tile(Tile::placeholder(x, y, a.level))?;
            }
            while (target.y - y).abs() > edge / 2.0 {
                y += edge * (target.y - y).signum();
                merged.add_tile(Tile::placeholder(x, y, a.level))?;
            }
        }

        Ok(merged)
    }
}

/// Flood-fill partitioning of a level's tiles into maximal 4-connected
/// components, one island per component
pub struct IslandBuilder<'a> {
    grid: &'a TileGrid,
}

impl<'a> IslandBuilder<'a> {
    pub fn new(grid: &'a TileGrid) -> Self {
        Self { grid }
    }

    /// Discover every connected component. Component order carries no
    /// meaning, but seeds are taken in origin order so identical input
    /// yields identical tile-set partitions on rebuild.
    pub fn build_all(&self) -> Result<Vec<Island>> {
        let mut seeds: Vec<&Tile> = self.grid.tiles().collect();
        seeds.sort_by_key(|tile| tile.key());

        let mut visited: HashSet<(i64, i64)> = HashSet::with_capacity(seeds.len());
        let mut islands = Vec::new();

        for seed in seeds {
            if visited.contains(&seed.key()) {
                continue;
            }
            let mut island = Island::new(self.grid.level());
            // explicit stack: contiguous regions can be deep enough to blow
            // the call stack if traversed recursively
            let mut stack = vec![*seed];
            visited.insert(seed.key());
            while let Some(tile) = stack.pop() {
                island.add_tile(tile)?;
                for (dx, dy) in SIDES {
                    let coords = tile.neighbor_coords(dx, dy);
                    if visited.contains(&coords.key()) {
                        continue;
                    }
                    // a missing neighbor is the expected case at a boundary
                    if let Some(&next) = self.grid.get(coords) {
                        visited.insert(coords.key());
                        stack.push(next);
                    }
                }
            }
            islands.push(island);
        }
        Ok(islands)
    }
}
