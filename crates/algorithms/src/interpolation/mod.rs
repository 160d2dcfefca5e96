//! Spatial interpolation of scattered elevation points onto a grid
//!
//! - IDW: Inverse Distance Weighting
//! - TIN: Delaunay triangulation with linear (barycentric) interpolation
//!
//! Both write into the grid described by a [`GridSpec`], usually derived
//! from the extent of the input points.

mod idw;
mod tin;

pub use idw::{idw, IdwParams};
pub use tin::{tin_interpolation, TinParams};

use topografia_core::raster::GeoTransform;
use topografia_core::{Error, Result};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }
}

/// Output grid of an interpolation: shape plus georeferencing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            transform: GeoTransform::default(),
        }
    }
}

impl GridSpec {
    /// Square-cell grid covering `(min_x, min_y, max_x, max_y)`
    pub fn from_extent(extent: (f64, f64, f64, f64), pixel_size: f64) -> Result<Self> {
        if !(pixel_size > 0.0) || !pixel_size.is_finite() {
            return Err(Error::InvalidParameter {
                name: "pixel_size",
                value: pixel_size.to_string(),
                reason: "must be a positive number".into(),
            });
        }
        let (transform, rows, cols) = GeoTransform::covering(extent, pixel_size);
        Ok(Self {
            rows,
            cols,
            transform,
        })
    }

    /// Grid covering the bounding box of the points
    pub fn covering_points(points: &[SamplePoint], pixel_size: f64) -> Result<Self> {
        let extent = points_extent(points)
            .ok_or_else(|| Error::Algorithm("No sample points provided".into()))?;
        Self::from_extent(extent, pixel_size)
    }
}

/// Bounding box of the points, `None` when empty
pub fn points_extent(points: &[SamplePoint]) -> Option<(f64, f64, f64, f64)> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    ))
}
