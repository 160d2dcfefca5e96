//! Survey configuration
//!
//! A [`SurveyConfig`] is built once per run (from command-line flags or a
//! TOML file) and never changes while features are processed.

use serde::{Deserialize, Serialize};
use topografia_core::{Error, Result};

use super::angle::AngleFormat;

/// Largest number of decimals accepted for formatted values
pub const MAX_PRECISION: usize = 10;

/// Unit used to report polygon areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    #[default]
    SquareMeters,
    Hectares,
    SquareKilometers,
}

impl AreaUnit {
    /// Square metres per unit
    pub fn divisor(self) -> f64 {
        match self {
            AreaUnit::SquareMeters => 1.0,
            AreaUnit::Hectares => 10_000.0,
            AreaUnit::SquareKilometers => 1_000_000.0,
        }
    }

    /// Convert an area in square metres
    pub fn convert(self, square_meters: f64) -> f64 {
        square_meters / self.divisor()
    }

    /// Label used in reports
    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "Metros cuadrados",
            AreaUnit::Hectares => "Hectáreas",
            AreaUnit::SquareKilometers => "Kilómetros cuadrados",
        }
    }
}

/// Which quantities to compute and how to format them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Interior angle at each polygon vertex
    pub compute_interior: bool,
    /// Exterior angle at each polygon vertex
    pub compute_exterior: bool,
    pub compute_azimuth: bool,
    pub compute_bearing: bool,
    /// Side or segment length
    pub compute_distance: bool,
    /// Running length within each feature
    pub compute_accumulated_distance: bool,
    pub compute_area: bool,
    pub compute_perimeter: bool,
    pub angle_format: AngleFormat,
    pub area_unit: AreaUnit,
    /// Decimals for angles, bearings and report values (0..=10)
    pub decimal_precision: usize,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            compute_interior: false,
            compute_exterior: false,
            compute_azimuth: false,
            compute_bearing: false,
            compute_distance: false,
            compute_accumulated_distance: false,
            compute_area: false,
            compute_perimeter: false,
            angle_format: AngleFormat::DecimalDegrees,
            area_unit: AreaUnit::SquareMeters,
            decimal_precision: 4,
        }
    }
}

impl SurveyConfig {
    /// Interior angles, area and perimeter in decimal degrees and m²
    pub fn polygon_defaults() -> Self {
        Self {
            compute_interior: true,
            compute_area: true,
            compute_perimeter: true,
            ..Default::default()
        }
    }

    /// Azimuth, bearing, length and accumulated length
    pub fn line_defaults() -> Self {
        Self {
            compute_azimuth: true,
            compute_bearing: true,
            compute_distance: true,
            compute_accumulated_distance: true,
            ..Default::default()
        }
    }

    /// Check the options that apply to the polygon tool
    pub fn validate_polygon(&self) -> Result<()> {
        self.validate_precision()?;
        let any = self.compute_interior
            || self.compute_exterior
            || self.compute_azimuth
            || self.compute_bearing
            || self.compute_distance
            || self.compute_accumulated_distance
            || self.compute_area
            || self.compute_perimeter;
        if !any {
            return Err(Error::NoCalculationSelected);
        }
        Ok(())
    }

    /// Check the options that apply to the line tool
    pub fn validate_line(&self) -> Result<()> {
        self.validate_precision()?;
        let any = self.compute_azimuth
            || self.compute_bearing
            || self.compute_distance
            || self.compute_accumulated_distance;
        if !any {
            return Err(Error::NoCalculationSelected);
        }
        Ok(())
    }

    fn validate_precision(&self) -> Result<()> {
        if self.decimal_precision > MAX_PRECISION {
            return Err(Error::InvalidParameter {
                name: "decimal_precision",
                value: self.decimal_precision.to_string(),
                reason: format!("must be between 0 and {}", MAX_PRECISION),
            });
        }
        Ok(())
    }
}
