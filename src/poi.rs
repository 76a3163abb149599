use serde::Deserialize;

use crate::geo::Coords;
use crate::island::IslandId;

/// Category of a point of interest, straight from the data tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiKind {
    Normal,
    Village,
    Mining,
    Monsters,
    Biome,
    Spawn,
}

/// Identifier of a point of interest within one collage load
pub type PoiId = u32;

/// A labeled point on the map.
///
/// Islands hold points of interest by id, not by ownership: the same point
/// can be referenced by islands at several zoom levels. The island ids are
/// kept here as a back-reference for the same reason.
#[derive(Clone, Debug)]
pub struct PointOfInterest {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub kind: PoiKind,
    pub level: u8,
    island_ids: Vec<IslandId>,
    only_on_top_level: bool,
}

impl PointOfInterest {
    pub fn new(x: f64, y: f64, text: String, kind: PoiKind, level: u8) -> Self {
        Self {
            x,
            y,
            text,
            kind,
            level,
            island_ids: Vec::new(),
            only_on_top_level: true,
        }
    }

    #[inline(always)]
    pub fn coords(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    /// Record that the island with the given id claims this point. A claim
    /// from any level finer than the top level clears `only_on_top_level`.
    pub fn claimed_by(&mut self, island: IslandId, island_level: u8, top_level: u8) {
        if !self.island_ids.contains(&island) {
            self.island_ids.push(island);
        }
        if island_level != top_level {
            self.only_on_top_level = false;
        }
    }

    /// Ids of every island this point has been associated with
    pub fn island_ids(&self) -> &[IslandId] {
        &self.island_ids
    }

    /// True while no island finer than the top zoom level has claimed this
    /// point
    #[inline(always)]
    pub fn only_on_top_level(&self) -> bool {
        self.only_on_top_level
    }

    /// Keys under which the persistence collaborator stores this point,
    /// one per owning island
    pub fn storage_keys(&self) -> impl Iterator<Item = PoiStorageKey> + '_ {
        self.island_ids.iter().map(move |&island| PoiStorageKey {
            level: self.level,
            x: self.x,
            y: self.y,
            kind: self.kind,
            island,
        })
    }
}

/// Composite key used by the (out-of-scope) local database collaborator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoiStorageKey {
    pub level: u8,
    pub x: f64,
    pub y: f64,
    pub kind: PoiKind,
    pub island: IslandId,
}
