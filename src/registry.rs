use std::collections::HashMap;

use crate::geo::Coords;
use crate::island::{Island, IslandId};

/// Tile-to-island ownership mapping for one collage load.
///
/// An explicit context object owned by the pipeline (not ambient global
/// state), so a reload can discard and rebuild it without cross-load
/// leakage. Registration is last-write-wins: the merge step relies on
/// re-registering a merged island to re-point every tile at it.
#[derive(Debug, Default)]
pub struct IslandRegistry {
    map: HashMap<(u8, i64, i64), IslandId>,
}

impl IslandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the tile at (level, coords) belongs to `island`
    pub fn register(&mut self, level: u8, coords: Coords, island: IslandId) {
        let (x, y) = coords.key();
        self.map.insert((level, x, y), island);
    }

    /// Register every tile of an island at once
    pub fn register_island(&mut self, island: &Island) {
        for tile in island.tiles() {
            self.register(island.level(), tile.origin(), island.id());
        }
    }

    /// Which island owns the tile at (level, coords)?
    pub fn lookup(&self, level: u8, coords: Coords) -> Option<IslandId> {
        let (x, y) = coords.key();
        self.map.get(&(level, x, y)).copied()
    }

    /// Absorb a per-level partition built on another thread
    pub fn merge(&mut self, other: IslandRegistry) {
        self.map.extend(other.map);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
