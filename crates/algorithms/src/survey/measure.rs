//! Ellipsoid-aware length and area measurement
//!
//! Measurements are taken on the WGS84 ellipsoid whenever the layer CRS allows
//! it. Geographic layers (degrees) go straight to the geodesic formulas;
//! projected layers are first taken back to longitude/latitude through their
//! PROJ definition. Layers without a CRS, or whose CRS has no known PROJ
//! definition, are measured with planar formulas in CRS units.

use std::fmt;
use std::sync::Arc;

use geo::{Area, Coord, Distance, Geodesic, GeodesicArea, Geometry, MapCoords, Point};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use topografia_core::{Error, Result, CRS};

use super::geometry::planar_distance;

const LON_LAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Reference ellipsoid for geodesic measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ellipsoid {
    #[default]
    Wgs84,
}

/// Inverse projection from layer coordinates to WGS84 longitude/latitude
struct ToLonLat {
    source: Proj,
    target: Proj,
    definition: String,
}

impl ToLonLat {
    fn new(definition: &str) -> Result<Self> {
        let parse = |def: &str| {
            Proj::from_proj_string(def).map_err(|e| Error::Projection(format!("{}: {}", def, e)))
        };
        Ok(Self {
            source: parse(definition)?,
            target: parse(LON_LAT)?,
            definition: definition.to_string(),
        })
    }

    /// Longitude/latitude in degrees
    fn apply(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = (c.x, c.y, 0.0);
        transform(&self.source, &self.target, &mut point)
            .map_err(|e| Error::Projection(format!("({}, {}): {}", c.x, c.y, e)))?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }
}

impl fmt::Debug for ToLonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ToLonLat").field(&self.definition).finish()
    }
}

#[derive(Debug, Clone)]
enum Method {
    Planar,
    Geodesic(Option<Arc<ToLonLat>>),
}

/// Measures segment lengths and polygon areas for one layer
#[derive(Debug, Clone)]
pub struct DistanceArea {
    crs: Option<CRS>,
    method: Method,
}

impl Default for DistanceArea {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DistanceArea {
    /// WGS84 measurer for a layer in `crs`
    pub fn new(crs: Option<CRS>) -> Self {
        let method = match &crs {
            None => Method::Planar,
            Some(c) if c.is_geographic() => Method::Geodesic(None),
            Some(c) => match c.proj_definition().map(|def| ToLonLat::new(&def)) {
                Some(Ok(inverse)) => Method::Geodesic(Some(Arc::new(inverse))),
                Some(Err(e)) => {
                    tracing::warn!("{}; measuring {} in planar units", e, c);
                    Method::Planar
                }
                None => {
                    tracing::warn!("no projection definition for {}; measuring in planar units", c);
                    Method::Planar
                }
            },
        };
        Self { crs, method }
    }

    /// Purely planar measurer regardless of CRS
    pub fn planar() -> Self {
        Self {
            crs: None,
            method: Method::Planar,
        }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Ellipsoid used for measurements, `None` when planar
    pub fn ellipsoid(&self) -> Option<Ellipsoid> {
        match self.method {
            Method::Geodesic(_) => Some(Ellipsoid::Wgs84),
            Method::Planar => None,
        }
    }

    /// Whether measurements go through the ellipsoid
    pub fn will_use_ellipsoid(&self) -> bool {
        self.ellipsoid().is_some()
    }

    /// Length of the segment `a → b`, in metres on the ellipsoid
    pub fn measure_line(&self, a: Coord<f64>, b: Coord<f64>) -> Result<f64> {
        match &self.method {
            Method::Planar => Ok(planar_distance(a, b)),
            Method::Geodesic(inverse) => {
                let a = lon_lat(inverse.as_deref(), a)?;
                let b = lon_lat(inverse.as_deref(), b)?;
                Ok(Geodesic::distance(Point::from(a), Point::from(b)))
            }
        }
    }

    /// Unsigned area of a polygonal geometry, holes subtracted.
    ///
    /// Non-polygonal geometries measure 0.
    pub fn measure_area(&self, geometry: &Geometry<f64>) -> Result<f64> {
        let inverse = match &self.method {
            Method::Planar => return Ok(planar_area(geometry)),
            Method::Geodesic(inverse) => inverse.as_deref(),
        };
        let geometry = geometry.try_map_coords(|c| lon_lat(inverse, c))?;
        Ok(match geometry {
            Geometry::Polygon(p) => p.geodesic_area_unsigned(),
            Geometry::MultiPolygon(mp) => mp.geodesic_area_unsigned(),
            Geometry::Rect(r) => r.to_polygon().geodesic_area_unsigned(),
            Geometry::Triangle(t) => t.to_polygon().geodesic_area_unsigned(),
            _ => 0.0,
        })
    }
}

fn planar_area(geometry: &Geometry<f64>) -> f64 {
    match geometry {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        _ => 0.0,
    }
}

/// Longitude/latitude of `c`, rejecting values outside the valid range.
///
/// Projected coordinates read as degrees would otherwise make the geodesic
/// formulas return NaN.
fn lon_lat(inverse: Option<&ToLonLat>, c: Coord<f64>) -> Result<Coord<f64>> {
    let ll = match inverse {
        Some(inverse) => inverse.apply(c)?,
        None => c,
    };
    if ll.x.abs() > 180.0 || ll.y.abs() > 90.0 || !ll.x.is_finite() || !ll.y.is_finite() {
        return Err(Error::InvalidParameter {
            name: "crs",
            value: format!("({}, {})", c.x, c.y),
            reason: "coordinate outside the longitude/latitude range of a geographic CRS".into(),
        });
    }
    Ok(ll)
}
