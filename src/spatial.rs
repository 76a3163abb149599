use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo::{BlockBounds, Coords};

/// Bulk-loaded R-tree over a fixed batch of bounding-box items.
///
/// One index exists per (zoom level, item kind) and is rebuilt wholesale
/// whenever source data changes; there is deliberately no insert/remove
/// API after `build`.
#[derive(Debug)]
pub struct SpatialIndex<T>
where
    T: RTreeObject<Envelope = AABB<[f64; 2]>>,
{
    tree: RTree<T>,
    /// Overall extent of every loaded item
    bounds: BlockBounds,
}

impl<T> SpatialIndex<T>
where
    T: RTreeObject<Envelope = AABB<[f64; 2]>>,
{
    /// Bulk-load all items at once (O(n log n))
    pub fn build(items: Vec<T>) -> Self {
        let mut bounds = BlockBounds::EMPTY;
        for item in &items {
            let envelope = item.envelope();
            bounds.union(&aabb_bounds(&envelope));
        }
        Self {
            tree: RTree::bulk_load(items),
            bounds,
        }
    }

    /// All items whose box intersects the query box, in no particular order.
    /// An empty index (or an empty query box) yields an empty result.
    pub fn search(&self, query: BlockBounds) -> Vec<&T> {
        if query.is_empty() {
            return Vec::new();
        }
        let envelope = AABB::from_corners([query.min_x, query.min_y], [query.max_x, query.max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Overall min/max extent across all loaded items (empty sentinel when
    /// the index holds nothing)
    #[inline(always)]
    pub fn bounds(&self) -> BlockBounds {
        self.bounds
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tree.iter()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl<T> SpatialIndex<T>
where
    T: RTreeObject<Envelope = AABB<[f64; 2]>> + PointDistance,
{
    /// Item closest to the given point, if any
    pub fn nearest(&self, point: Coords) -> Option<&T> {
        self.tree.nearest_neighbor(&[point.x, point.y])
    }
}

#[inline(always)]
fn aabb_bounds(envelope: &AABB<[f64; 2]>) -> BlockBounds {
    let lower = envelope.lower();
    let upper = envelope.upper();
    BlockBounds::new(lower[0], lower[1], upper[0], upper[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    fn index_of(tiles: Vec<Tile>) -> SpatialIndex<Tile> {
        SpatialIndex::build(tiles)
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = index_of(Vec::new());
        assert!(index.is_empty());
        assert!(index
            .search(BlockBounds::new(0.0, 0.0, 1000.0, 1000.0))
            .is_empty());
        assert!(index.bounds().is_empty());
    }

    #[test]
    fn test_search_finds_intersecting_tiles() {
        let index = index_of(vec![
            Tile::new(0.0, 0.0, 0),
            Tile::new(128.0, 0.0, 0),
            Tile::new(1280.0, 1280.0, 0),
        ]);
        let hits = index.search(BlockBounds::new(10.0, 10.0, 200.0, 100.0));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_bounds_span_all_items() {
        let index = index_of(vec![Tile::new(0.0, 0.0, 0), Tile::new(1280.0, 640.0, 0)]);
        let bounds = index.bounds();
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 1280.0 + 128.0);
        assert_eq!(bounds.max_y, 640.0 + 128.0);
    }

    #[test]
    fn test_nearest() {
        let index = index_of(vec![Tile::new(0.0, 0.0, 0), Tile::new(1280.0, 1280.0, 0)]);
        let hit = index.nearest(Coords::new(100.0, 100.0)).unwrap();
        assert_eq!(hit.origin(), Coords::new(0.0, 0.0));
    }
}
