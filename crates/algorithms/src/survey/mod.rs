//! Surveying calculations on polygon and line layers
//!
//! The per-vertex math lives in [`azimuth`], [`angle`] and [`geometry`] as
//! pure functions over coordinates. The polygon and line tools drive those
//! functions over a whole layer and produce:
//! - a point layer with one feature per vertex (polygons) or per segment
//!   (lines), whose columns depend on the selected calculations
//! - a plain-text report
//!
//! Features with missing geometry or too few vertices are skipped and
//! counted, never reported as errors. Coordinates that cannot be measured in
//! the layer CRS (projected values in a geographic layer) fail the run.

pub mod angle;
pub mod azimuth;
mod config;
pub mod geometry;
mod line;
mod measure;
mod polygon;
mod report;

pub use angle::{format_angle, AngleFormat, Dms, FormattedAngle};
pub use azimuth::{azimuth, bearing, bearing_from_degrees};
pub use config::{AreaUnit, SurveyConfig, MAX_PRECISION};
pub use geometry::{
    distinct_vertex_count, planar_distance, ring_perimeter, signed_area, vertex_angles, VertexAngles,
};
pub use line::{line_fields, line_survey, line_survey_with_progress, LineParams, LineSurvey};
pub use measure::{DistanceArea, Ellipsoid};
pub use polygon::{
    polygon_fields, polygon_survey, polygon_survey_with_progress, PolygonParams, PolygonSurvey,
};
pub use report::Report;

use topografia_core::{FeatureCollection, CRS};

/// Everything a survey run needs besides the layer and the options
#[derive(Debug, Clone)]
pub struct SurveyContext {
    /// Source layer name, printed in the report header
    pub layer_name: String,
    /// Report date, already formatted; omitted from the report when `None`
    pub timestamp: Option<String>,
    pub measurer: DistanceArea,
}

impl SurveyContext {
    /// Context for a layer in `crs`, measured on WGS84 when the CRS allows it
    pub fn new(layer_name: impl Into<String>, crs: Option<CRS>) -> Self {
        Self {
            layer_name: layer_name.into(),
            timestamp: None,
            measurer: DistanceArea::new(crs),
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

impl Default for SurveyContext {
    fn default() -> Self {
        Self::new("capa", None)
    }
}

/// Input of the survey tools when run through [`topografia_core::Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct SurveyInput {
    pub layer: FeatureCollection,
    pub context: SurveyContext,
}

/// Result of a survey run
#[derive(Debug, Clone)]
pub struct SurveyOutput {
    /// Point layer with the computed attributes
    pub features: FeatureCollection,
    pub report: Report,
    /// Input features visited, skipped ones included
    pub processed: usize,
    /// Input features without usable geometry
    pub skipped: usize,
}
