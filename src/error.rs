//! Error types for the pindou-mirror crate.

/// Errors that can occur while mirroring a pattern image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The region of interest is empty or inverted (`x1 >= x2` or `y1 >= y2`).
    #[error("invalid region ({x1},{y1})-({x2},{y2}): expected x1 < x2 and y1 < y2")]
    InvalidRegion {
        /// Left edge.
        x1: u32,
        /// Top edge.
        y1: u32,
        /// Right edge (exclusive).
        x2: u32,
        /// Bottom edge (exclusive).
        y2: u32,
    },

    /// The grid has zero columns or zero rows.
    #[error("invalid grid {cols}x{rows}: columns and rows must be at least 1")]
    InvalidGrid {
        /// Column count.
        cols: u32,
        /// Row count.
        rows: u32,
    },

    /// A textual grid specification could not be parsed.
    #[error("invalid grid spec {0:?}: expected COLSxROWS, e.g. 52x47")]
    InvalidGridSpec(String),

    /// A textual region specification could not be parsed.
    #[error("invalid region spec {0:?}: expected x1,y1,x2,y2")]
    InvalidRegionSpec(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
