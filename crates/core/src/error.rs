//! Error types for topografia

use thiserror::Error;

/// Main error type for topografia operations.
///
/// Geometry problems in individual features (empty geometries, too few
/// vertices) are not errors: the survey tools skip and count them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Select at least one calculation type")]
    NoCalculationSelected,

    #[error("No output selected for {0}")]
    MissingOutput(&'static str),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Coordinate transformation failed: {0}")]
    Projection(String),

    #[error("At least {required} points are required, got {found}")]
    InsufficientPoints { required: usize, found: usize },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for topografia operations
pub type Result<T> = std::result::Result<T, Error>;
