use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::collage::{Collage, ScaleInfo};
use crate::poi::PoiKind;

/// Records grouped by zoom level, mirroring the layout of the data tables
#[derive(Clone, Debug, Deserialize)]
pub struct ItemsInLevel<T> {
    pub level: u8,
    pub items: Vec<T>,
}

/// A tile entry as it appears in the map data file
#[derive(Clone, Debug, Deserialize)]
pub struct TileRecord {
    pub x: f64,
    pub y: f64,
    /// image file drawn by the presentation layer; opaque here
    #[serde(default)]
    pub file: String,
}

/// A point-of-interest entry as it appears in the data file
#[derive(Clone, Debug, Deserialize)]
pub struct PoiRecord {
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
}

/// A record from a mixed data stream. Tile and point records are told apart
/// once, at the parse boundary; nothing downstream branches on record shape.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Poi(PoiRecord),
    Tile(TileRecord),
}

/// Split an already-parsed mixed stream into per-kind level groups
pub fn split_records(
    groups: Vec<ItemsInLevel<Record>>,
) -> (Vec<ItemsInLevel<TileRecord>>, Vec<ItemsInLevel<PoiRecord>>) {
    let mut tiles = Vec::new();
    let mut pois = Vec::new();
    for group in groups {
        let mut tile_items = Vec::new();
        let mut poi_items = Vec::new();
        for record in group.items {
            match record {
                Record::Tile(tile) => tile_items.push(tile),
                Record::Poi(poi) => poi_items.push(poi),
            }
        }
        if !tile_items.is_empty() {
            tiles.push(ItemsInLevel {
                level: group.level,
                items: tile_items,
            });
        }
        if !poi_items.is_empty() {
            pois.push(ItemsInLevel {
                level: group.level,
                items: poi_items,
            });
        }
    }
    (tiles, pois)
}

/// Load the per-level tile lists from a JSON file
pub fn load_tiles(path: &Path) -> Result<Vec<ItemsInLevel<TileRecord>>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing tile data in {}", path.display()))
}

/// Load the per-level point-of-interest lists from a JSON file
pub fn load_pois(path: &Path) -> Result<Vec<ItemsInLevel<PoiRecord>>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing point data in {}", path.display()))
}

/// Load tile and point data from a directory and build the collage.
/// Missing or malformed point data degrades to an empty point list; missing
/// tile data is fatal since there is nothing to build from.
pub fn load_collage(data_dir: &Path, sizing: ScaleInfo) -> Result<Collage> {
    let tiles = load_tiles(&data_dir.join("tiles.json"))?;
    let pois = match load_pois(&data_dir.join("points_of_interest.json")) {
        Ok(pois) => pois,
        Err(err) => {
            warn!("no points of interest loaded: {err:#}");
            Vec::new()
        }
    };
    Ok(Collage::new(tiles, pois, sizing)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tile_groups() {
        let mut raw = br#"[
            {"level": 0, "items": [
                {"x": 0, "y": 0, "file": "map_0_0.png"},
                {"x": 128, "y": 0, "file": "map_128_0.png"}
            ]},
            {"level": 3, "items": [{"x": 0, "y": 0, "file": "map3_0_0.png"}]}
        ]"#
        .to_vec();
        let groups: Vec<ItemsInLevel<TileRecord>> =
            simd_json::serde::from_slice(&mut raw).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].level, 3);
        assert_eq!(groups[0].items[1].x, 128.0);
    }

    #[test]
    fn test_parse_poi_kind() {
        let mut raw = br#"[
            {"level": 0, "items": [
                {"x": 755.12, "y": 625.6, "text": "horsie pasture", "type": "normal"},
                {"x": 98.0, "y": 37.6, "text": "old village", "type": "village"}
            ]}
        ]"#
        .to_vec();
        let groups: Vec<ItemsInLevel<PoiRecord>> =
            simd_json::serde::from_slice(&mut raw).unwrap();
        assert_eq!(groups[0].items[0].kind, PoiKind::Normal);
        assert_eq!(groups[0].items[1].kind, PoiKind::Village);
    }

    #[test]
    fn test_parse_spawn_poi_kind() {
        let mut raw = br#"[
            {"level": 3, "items": [
                {"x": 64.0, "y": 64.0, "text": "World Spawn", "type": "spawn"}
            ]}
        ]"#
        .to_vec();
        let groups: Vec<ItemsInLevel<PoiRecord>> =
            simd_json::serde::from_slice(&mut raw).unwrap();
        assert_eq!(groups[0].items[0].kind, PoiKind::Spawn);
    }

    #[test]
    fn test_mixed_records_are_discriminated_at_parse_time() {
        let mut raw = br#"[
            {"level": 0, "items": [
                {"x": 0, "y": 0, "file": "map_0_0.png"},
                {"x": 64, "y": 64, "text": "spawn", "type": "normal"}
            ]}
        ]"#
        .to_vec();
        let groups: Vec<ItemsInLevel<Record>> = simd_json::serde::from_slice(&mut raw).unwrap();
        let (tiles, pois) = split_records(groups);
        assert_eq!(tiles.len(), 1);
        assert_eq!(pois.len(), 1);
        assert_eq!(tiles[0].items[0].file, "map_0_0.png");
        assert_eq!(pois[0].items[0].text, "spawn");
    }
}
