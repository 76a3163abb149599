//! Island geometry core for tiled 2D map collages.
//!
//! A collage is a sparse set of square tiles at several zoom levels
//! (a tile at level `n` is `128 * 2^n` blocks on a side). Contiguous tiles
//! form islands; each island knows its clockwise boundary polygon with
//! convex/concave corner classification and a simplified outline that cuts
//! diagonally across concave notches, used for containment tests and for
//! clamping the viewport center to the island. Disjoint islands at the top
//! zoom level are bridged into one connected region with placeholder tiles.
//!
//! [`Collage::new`] runs the whole batch pipeline over already-loaded data;
//! [`data`] loads the tile and point-of-interest tables from JSON.

pub mod collage;
pub mod data;
pub mod error;
pub mod geo;
pub mod island;
pub mod poi;
pub mod registry;
pub mod spatial;
pub mod tile;

pub use collage::{Collage, ScaleInfo};
pub use data::{ItemsInLevel, PoiRecord, Record, TileRecord};
pub use error::CollageError;
pub use geo::{edge_length, BlockBounds, Coords, PixelDimensions, PixelPosition, BASE_EDGE};
pub use island::{Corner, CornerAngle, Island, IslandBuilder, IslandId, IslandShape, Line};
pub use poi::{PoiId, PoiKind, PoiStorageKey, PointOfInterest};
pub use registry::IslandRegistry;
pub use spatial::SpatialIndex;
pub use tile::{Tile, TileGrid};
