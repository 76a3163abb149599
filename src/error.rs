use thiserror::Error;

/// Failures that indicate malformed input data or misuse of the pipeline.
///
/// Expected absences (no neighbor tile, a point of interest outside every
/// tile) are represented as `Option`/`bool` by the APIs concerned, not as
/// errors. Anything here aborts the construction step it occurred in.
#[derive(Debug, Error, PartialEq)]
pub enum CollageError {
    /// Two real tiles claim the same (level, x, y) identity
    #[error("duplicate tile at level {level} ({x}, {y})")]
    DuplicateTile { level: u8, x: f64, y: f64 },

    /// Boundary chaining found no edge starting at the corner it needed next
    #[error("boundary of island {island} is broken: no edge starts at ({x}, {y})")]
    BrokenBoundary { island: u32, x: f64, y: f64 },

    /// Tiles or islands at different zoom levels were mixed
    #[error("zoom level mismatch: {a} vs {b}")]
    LevelMismatch { a: u8, b: u8 },

    /// An island with no tiles was passed where a nonempty one is required
    #[error("island {id} has no tiles")]
    EmptyIsland { id: u32 },

    /// The collage was constructed with no tiles at any level
    #[error("no tiles in input data")]
    NoTiles,
}

pub type Result<T> = std::result::Result<T, CollageError>;
