//! # Topografía Algorithms
//!
//! Surveying and terrain algorithms for topografia.
//!
//! ## Available Algorithm Categories
//!
//! - **survey**: Polygon angles, areas and perimeters; line azimuths, bearings and lengths
//! - **interpolation**: IDW, TIN
//! - **contour**: Marching-squares contour lines from rasters or elevation points

pub mod contour;
pub mod interpolation;
mod maybe_rayon;
pub mod survey;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::contour::{
        contour_lines, contours_from_points, contours_from_raster, contours_to_features,
        sample_points_from_layer, Contour, ContourLine, ContourParams, InterpolationMethod,
    };
    pub use crate::interpolation::{
        idw, tin_interpolation, GridSpec, IdwParams, SamplePoint, TinParams,
    };
    pub use crate::survey::{
        azimuth, bearing, format_angle, line_survey, polygon_survey, AngleFormat, AreaUnit,
        LineParams, LineSurvey, PolygonParams, PolygonSurvey, Report, SurveyConfig,
        SurveyContext, SurveyInput, SurveyOutput,
    };
    pub use topografia_core::prelude::*;
}
