//! # Topografía Core
//!
//! Core types, traits and I/O for the topografia surveying tools.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid used as contouring input
//! - `GeoTransform`: affine transformation for georeferencing
//! - `CRS`: coordinate reference system identification
//! - `FeatureCollection`: vector layers with an ordered attribute schema
//! - I/O for GeoTIFF, GeoJSON, CSV and plain-text reports

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection, Field, FieldKind};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, Field, FieldKind};
    pub use crate::Algorithm;
}

/// Core trait for all tools in topografia.
///
/// Tools are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
