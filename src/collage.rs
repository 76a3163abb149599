use std::collections::{BTreeMap, HashMap};

use log::debug;
use rayon::prelude::*;
use rstar::{PointDistance, RTreeObject, AABB};

use crate::data::{ItemsInLevel, PoiRecord, TileRecord};
use crate::error::{CollageError, Result};
use crate::geo::{edge_length, BlockBounds, Coords, PixelDimensions, PixelPosition};
use crate::island::{Island, IslandBuilder, IslandId};
use crate::poi::{PoiId, PoiStorageKey, PointOfInterest};
use crate::registry::IslandRegistry;
use crate::spatial::SpatialIndex;
use crate::tile::{Tile, TileGrid};

/// How many on-screen pixels one tile edge occupies, at which zoom level.
/// Everything block-to-pixel derives from this.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleInfo {
    pub level: u8,
    pub edge_px: f64,
}

/// Point-of-interest entry in the per-level spatial index
#[derive(Clone, Copy, Debug, PartialEq)]
struct PoiMarker {
    id: PoiId,
    position: [f64; 2],
}

impl RTreeObject for PoiMarker {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for PoiMarker {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The fully built collage: tile grids, islands, ownership registry and
/// points of interest for every zoom level, plus the block-to-pixel scale.
///
/// Everything is computed once in [`Collage::new`] and read-only afterward
/// (except `resize`, which only touches the pixel scale). A data reload
/// builds a fresh collage; nothing here supports incremental update.
#[derive(Debug)]
pub struct Collage {
    grids: BTreeMap<u8, TileGrid>,
    islands: BTreeMap<u8, Vec<Island>>,
    island_locations: HashMap<IslandId, (u8, usize)>,
    registry: IslandRegistry,
    pois: Vec<PointOfInterest>,
    poi_index: BTreeMap<u8, SpatialIndex<PoiMarker>>,
    top_level: u8,
    px_per_block: f64,
    /// Origin of the lowest-coordinate top-level tile
    lowest: Coords,
    /// Origin of the highest-coordinate top-level tile
    highest: Coords,
    dimensions: PixelDimensions,
}

impl Collage {
    /// Run the whole batch pipeline: build per-level grids and islands
    /// (levels in parallel, registries partitioned per level and merged
    /// serially), bridge the top level into one connected island, then
    /// assign points of interest to the islands owning their tiles.
    pub fn new(
        tiles: Vec<ItemsInLevel<TileRecord>>,
        pois: Vec<ItemsInLevel<PoiRecord>>,
        sizing: ScaleInfo,
    ) -> Result<Self> {
        // A level may be split across several input groups; collect them
        // before building so the grid sees every tile. A tile repeated
        // across groups still fails the grid's duplicate check.
        let mut tiles_by_level: BTreeMap<u8, Vec<Tile>> = BTreeMap::new();
        for group in tiles {
            let level = group.level;
            tiles_by_level.entry(level).or_default().extend(
                group
                    .items
                    .into_iter()
                    .map(|record| Tile::new(record.x, record.y, level)),
            );
        }
        let mut grids = BTreeMap::new();
        for (level, level_tiles) in tiles_by_level {
            grids.insert(level, TileGrid::build(level, level_tiles)?);
        }

        let top_level = grids
            .iter()
            .filter(|(_, grid)| !grid.is_empty())
            .map(|(&level, _)| level)
            .max()
            .ok_or(CollageError::NoTiles)?;

        // One flood-fill pass per level; the only cross-level state is the
        // registry, built as per-level partitions here and merged below.
        // Boundary computation is deferred for the top level: its islands
        // are about to be merged and would only produce throwaway corners.
        let level_results: Vec<(u8, Vec<Island>, IslandRegistry)> = grids
            .par_iter()
            .map(|(&level, grid)| {
                let mut islands = IslandBuilder::new(grid).build_all()?;
                if level != top_level {
                    for island in &mut islands {
                        island.find_edges()?;
                    }
                }
                let mut partition = IslandRegistry::new();
                for island in &islands {
                    partition.register_island(island);
                }
                Ok((level, islands, partition))
            })
            .collect::<Result<_>>()?;

        let mut registry = IslandRegistry::new();
        let mut islands: BTreeMap<u8, Vec<Island>> = BTreeMap::new();
        for (level, level_islands, partition) in level_results {
            registry.merge(partition);
            islands.insert(level, level_islands);
        }

        // Bridge every top-level island into the largest one so the whole
        // top level pans as a single connected region.
        let mut top_islands = islands.remove(&top_level).unwrap_or_default();
        top_islands.sort_by(|a, b| b.tile_count().cmp(&a.tile_count()));
        debug!(
            "level {top_level}: merging {} islands into one connected region",
            top_islands.len()
        );
        let mut top_iter = top_islands.into_iter();
        let mut combined = top_iter.next().ok_or(CollageError::NoTiles)?;
        for island in top_iter {
            combined = Island::connect(&combined, &island)?;
        }
        combined.find_edges()?;
        // last-write-wins re-points every tile, bridges included
        registry.register_island(&combined);
        islands.insert(top_level, vec![combined]);

        let mut island_locations = HashMap::new();
        for (&level, level_islands) in &islands {
            for (idx, island) in level_islands.iter().enumerate() {
                island_locations.insert(island.id(), (level, idx));
            }
        }

        let top_bounds = grids
            .get(&top_level)
            .map(TileGrid::bounds)
            .unwrap_or(BlockBounds::EMPTY);
        let top_edge = edge_length(top_level);
        let lowest = Coords::new(top_bounds.min_x, top_bounds.min_y);
        let highest = Coords::new(top_bounds.max_x - top_edge, top_bounds.max_y - top_edge);

        let px_per_block = sizing.edge_px / edge_length(sizing.level);

        let mut collage = Self {
            grids,
            islands,
            island_locations,
            registry,
            pois: Vec::new(),
            poi_index: BTreeMap::new(),
            top_level,
            px_per_block,
            lowest,
            highest,
            dimensions: PixelDimensions::default(),
        };
        collage.dimensions = collage.compute_dimensions();
        collage.assign_pois(pois);
        Ok(collage)
    }

    /// Attach every point of interest to the island owning its containing
    /// tile, at every level where such a tile exists. A point with no
    /// owning tile at some level is simply not claimed there.
    fn assign_pois(&mut self, groups: Vec<ItemsInLevel<PoiRecord>>) {
        for group in groups {
            for record in group.items {
                let mut poi = PointOfInterest::new(
                    record.x,
                    record.y,
                    record.text,
                    record.kind,
                    group.level,
                );
                let poi_id = self.pois.len() as PoiId;

                let levels: Vec<u8> = self.grids.keys().copied().collect();
                for level in levels {
                    let edge = edge_length(level);
                    let origin = Coords::new(
                        (poi.x / edge).floor() * edge,
                        (poi.y / edge).floor() * edge,
                    );
                    let Some(island_id) = self.registry.lookup(level, origin) else {
                        continue;
                    };
                    let Some(&(island_level, idx)) = self.island_locations.get(&island_id) else {
                        continue;
                    };
                    if let Some(island) = self
                        .islands
                        .get_mut(&island_level)
                        .and_then(|list| list.get_mut(idx))
                    {
                        island.add_poi(poi_id);
                        poi.claimed_by(island_id, level, self.top_level);
                    }
                }
                self.pois.push(poi);
            }
        }

        // one point index per level, rebuilt with everything else
        let mut markers: BTreeMap<u8, Vec<PoiMarker>> = BTreeMap::new();
        for (id, poi) in self.pois.iter().enumerate() {
            markers.entry(poi.level).or_default().push(PoiMarker {
                id: id as PoiId,
                position: [poi.x, poi.y],
            });
        }
        self.poi_index = markers
            .into_iter()
            .map(|(level, items)| (level, SpatialIndex::build(items)))
            .collect();
    }

    fn compute_dimensions(&self) -> PixelDimensions {
        let edge = edge_length(self.top_level);
        PixelDimensions::new(
            (self.highest.x + edge - self.lowest.x) * self.px_per_block,
            (self.highest.y + edge - self.lowest.y) * self.px_per_block,
        )
    }

    /// Recompute the pixel scale after the on-screen tile size changed.
    /// All block-space state is untouched.
    pub fn resize(&mut self, sizing: ScaleInfo) {
        self.px_per_block = sizing.edge_px / edge_length(sizing.level);
        self.dimensions = self.compute_dimensions();
    }

    #[inline(always)]
    pub fn top_level(&self) -> u8 {
        self.top_level
    }

    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.grids.keys().copied()
    }

    pub fn grid(&self, level: u8) -> Option<&TileGrid> {
        self.grids.get(&level)
    }

    /// The islands at one zoom level (exactly one at the top level)
    pub fn islands(&self, level: u8) -> &[Island] {
        self.islands.get(&level).map_or(&[], Vec::as_slice)
    }

    pub fn island(&self, id: IslandId) -> Option<&Island> {
        let &(level, idx) = self.island_locations.get(&id)?;
        self.islands.get(&level)?.get(idx)
    }

    /// Which island owns the tile whose origin is `tile_coords`?
    pub fn island_containing(&self, level: u8, tile_coords: Coords) -> Option<&Island> {
        self.island(self.registry.lookup(level, tile_coords)?)
    }

    /// Which island owns the tile under an arbitrary world point?
    pub fn island_at(&self, level: u8, point: Coords) -> Option<&Island> {
        let edge = edge_length(level);
        let origin = Coords::new(
            (point.x / edge).floor() * edge,
            (point.y / edge).floor() * edge,
        );
        self.island_containing(level, origin)
    }

    pub fn registry(&self) -> &IslandRegistry {
        &self.registry
    }

    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    pub fn poi(&self, id: PoiId) -> Option<&PointOfInterest> {
        self.pois.get(id as usize)
    }

    /// The points of interest referenced by an island
    pub fn pois_of<'a>(&'a self, island: &'a Island) -> impl Iterator<Item = &'a PointOfInterest> {
        island.poi_ids().iter().filter_map(|&id| self.poi(id))
    }

    /// Points of interest of one level within a block-space region
    pub fn pois_in(&self, level: u8, bounds: BlockBounds) -> Vec<&PointOfInterest> {
        let Some(index) = self.poi_index.get(&level) else {
            return Vec::new();
        };
        index
            .search(bounds)
            .into_iter()
            .filter_map(|marker| self.poi(marker.id))
            .collect()
    }

    /// Keys for the persistence collaborator, one per (point, owning island)
    pub fn poi_storage_keys(&self) -> Vec<PoiStorageKey> {
        self.pois
            .iter()
            .flat_map(PointOfInterest::storage_keys)
            .collect()
    }

    /// Tile of a level whose center is closest to a world point
    pub fn nearest_tile(&self, level: u8, point: Coords) -> Option<&Tile> {
        self.grids.get(&level)?.nearest(point)
    }

    /// The top-level tile at the world origin, if present
    pub fn origin_tile(&self) -> Option<&Tile> {
        self.grids.get(&self.top_level)?.get(Coords::new(0.0, 0.0))
    }

    #[inline(always)]
    pub fn px_per_block(&self) -> f64 {
        self.px_per_block
    }

    /// Pixel size of the full collage
    pub fn full_map_dimensions(&self) -> PixelDimensions {
        self.dimensions
    }

    /// Translate world coords to coords with the collage's top-left tile
    /// corner as origin
    pub fn coords_relative_to_collage(&self, coords: Coords) -> Coords {
        Coords::new(coords.x - self.lowest.x, coords.y - self.lowest.y)
    }

    /// Pixel position of a world coordinate within the collage
    pub fn position_within_collage(&self, coords: Coords) -> PixelPosition {
        let rel = self.coords_relative_to_collage(coords);
        PixelPosition::new(rel.x * self.px_per_block, rel.y * self.px_per_block)
    }

    /// The collage position (left/top offsets) that centers the given tile
    /// coordinate in a viewport
    pub fn position_centered_on(
        &self,
        coords: Coords,
        level: u8,
        viewport: PixelDimensions,
    ) -> PixelPosition {
        let rel = self.coords_relative_to_collage(coords);
        let tile_px = edge_length(level) * self.px_per_block;
        PixelPosition::new(
            -rel.x * self.px_per_block + (viewport.width - tile_px) / 2.0,
            -rel.y * self.px_per_block + (viewport.height - tile_px) / 2.0,
        )
    }

    /// Translate a position within the viewport, given the collage's own
    /// current position, back to world block coords
    pub fn coords_from_viewport_position(
        &self,
        viewport_pos: PixelPosition,
        collage_pos: PixelPosition,
    ) -> Coords {
        let x = (-collage_pos.left + viewport_pos.left) / self.px_per_block;
        let y = (-collage_pos.top + viewport_pos.top) / self.px_per_block;
        Coords::new(x + self.lowest.x, y + self.lowest.y)
    }

    /// The tile of `level` under a viewport position, if one exists there
    pub fn tile_from_viewport_position(
        &self,
        viewport_pos: PixelPosition,
        collage_pos: PixelPosition,
        level: u8,
    ) -> Option<&Tile> {
        let coords = self.coords_from_viewport_position(viewport_pos, collage_pos);
        let edge = edge_length(level);
        let origin = Coords::new(
            (coords.x / edge).floor() * edge,
            (coords.y / edge).floor() * edge,
        );
        self.grids.get(&level)?.get(origin)
    }
}
