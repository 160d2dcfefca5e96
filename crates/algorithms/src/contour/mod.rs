//! Contour line generation
//!
//! Contours are traced with marching squares on cell centres and returned
//! as polylines in map coordinates. Elevation points are first interpolated
//! onto a grid (TIN or IDW) and then contoured the same way.

mod marching;
mod source;

pub use marching::contour_lines;
pub use source::{
    contours_from_points, contours_from_raster, contours_to_features, sample_points_from_layer,
    InterpolatedContours, InterpolationMethod,
};

use geo::LineString;
use topografia_core::raster::Raster;
use topografia_core::{Algorithm, Error, Result};

/// Parameters for contour generation
#[derive(Debug, Clone, PartialEq)]
pub struct ContourParams {
    /// Elevation difference between successive contour lines
    pub interval: f64,
    /// Contours are generated at base + k * interval
    pub base: f64,
    /// Multiplier applied to cell values before contouring
    pub z_factor: f64,
    /// Every n-th level (k divisible by n) is flagged as a major contour
    pub major_every: u32,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            interval: 10.0,
            base: 0.0,
            z_factor: 1.0,
            major_every: 5,
        }
    }
}

impl ContourParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval > 0.0) || !self.interval.is_finite() {
            return Err(Error::InvalidParameter {
                name: "interval",
                value: self.interval.to_string(),
                reason: "contour interval must be > 0".into(),
            });
        }
        if !(self.z_factor > 0.0) || !self.z_factor.is_finite() {
            return Err(Error::InvalidParameter {
                name: "z_factor",
                value: self.z_factor.to_string(),
                reason: "must be > 0".into(),
            });
        }
        if !self.base.is_finite() {
            return Err(Error::InvalidParameter {
                name: "base",
                value: self.base.to_string(),
                reason: "must be finite".into(),
            });
        }
        if self.major_every == 0 {
            return Err(Error::InvalidParameter {
                name: "major_every",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Elevation of level `k`
    pub fn level(&self, k: i64) -> f64 {
        self.base + k as f64 * self.interval
    }

    /// Whether level `k` is a major (index) contour
    pub fn is_major(&self, k: i64) -> bool {
        k.rem_euclid(self.major_every as i64) == 0
    }
}

/// A traced contour polyline
#[derive(Debug, Clone, PartialEq)]
pub struct ContourLine {
    pub geometry: LineString<f64>,
    pub elevation: f64,
    /// Level number k in `base + k * interval`
    pub level_index: i64,
    pub major: bool,
}

impl ContourLine {
    /// First and last vertex coincide
    pub fn is_closed(&self) -> bool {
        self.geometry.0.len() > 2 && self.geometry.0.first() == self.geometry.0.last()
    }
}

/// Contour tracing algorithm
#[derive(Debug, Clone, Default)]
pub struct Contour;

impl Algorithm for Contour {
    type Input = Raster<f64>;
    type Output = Vec<ContourLine>;
    type Params = ContourParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Contour"
    }

    fn description(&self) -> &'static str {
        "Trace contour lines from an elevation raster using marching squares"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        contour_lines(&input, &params)
    }
}
