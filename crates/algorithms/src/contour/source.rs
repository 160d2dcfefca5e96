//! Contour inputs and outputs: rasters, point layers, line layers

use geo::Geometry;
use serde::{Deserialize, Serialize};
use topografia_core::raster::{Raster, RasterElement};
use topografia_core::vector::{Feature, FeatureCollection, Field, FieldKind};
use topografia_core::{Error, Result, CRS};

use super::{contour_lines, ContourLine, ContourParams};
use crate::interpolation::{idw, tin_interpolation, GridSpec, IdwParams, SamplePoint, TinParams};

/// Surface used to grid elevation points before contouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    #[default]
    Tin,
    Idw,
}

/// Contours traced from points, along with the interpolated surface
#[derive(Debug, Clone)]
pub struct InterpolatedContours {
    pub surface: Raster<f64>,
    pub lines: Vec<ContourLine>,
}

/// Elevation samples from a point layer.
///
/// Point and MultiPoint geometries are used; features without a numeric
/// value in `field` are skipped.
pub fn sample_points_from_layer(layer: &FeatureCollection, field: &str) -> Result<Vec<SamplePoint>> {
    let mut points = Vec::new();
    let mut seen_field = false;

    for (index, feature) in layer.iter().enumerate() {
        let value = match feature.get_property(field) {
            Some(v) => {
                seen_field = true;
                v.as_f64()
            }
            None => None,
        };
        let Some(value) = value.filter(|v| v.is_finite()) else {
            tracing::debug!("feature {}: no numeric '{}' value, skipped", index, field);
            continue;
        };

        match &feature.geometry {
            Some(Geometry::Point(p)) => points.push(SamplePoint::new(p.x(), p.y(), value)),
            Some(Geometry::MultiPoint(mp)) => {
                points.extend(mp.iter().map(|p| SamplePoint::new(p.x(), p.y(), value)))
            }
            _ => tracing::debug!("feature {}: not a point geometry, skipped", index),
        }
    }

    if !layer.is_empty() && !seen_field {
        return Err(Error::InvalidParameter {
            name: "field",
            value: field.to_string(),
            reason: "no feature has this attribute".into(),
        });
    }

    Ok(points)
}

/// Grid elevation points and trace contours over the surface.
///
/// The grid covers the bounding box of the points with square cells of
/// `pixel_size`. TIN leaves cells outside the convex hull empty, so lines
/// stop at the hull.
pub fn contours_from_points(
    points: &[SamplePoint],
    method: InterpolationMethod,
    pixel_size: f64,
    params: &ContourParams,
) -> Result<InterpolatedContours> {
    if points.len() < 3 {
        return Err(Error::InsufficientPoints {
            required: 3,
            found: points.len(),
        });
    }
    params.validate()?;

    let grid = GridSpec::covering_points(points, pixel_size)?;
    tracing::info!(
        "Interpolating {} points ({:?}) onto {}x{} grid",
        points.len(),
        method,
        grid.cols,
        grid.rows
    );

    let surface = match method {
        InterpolationMethod::Tin => tin_interpolation(points, TinParams { grid })?,
        InterpolationMethod::Idw => idw(
            points,
            IdwParams {
                grid,
                ..Default::default()
            },
        )?,
    };

    let lines = contour_lines(&surface, params)?;
    Ok(InterpolatedContours { surface, lines })
}

/// Trace contours over a raster of any cell type
pub fn contours_from_raster<T: RasterElement>(
    dem: &Raster<T>,
    params: &ContourParams,
) -> Result<Vec<ContourLine>> {
    let nodata = dem.nodata();
    let values = dem.data().mapv(|v| {
        if v.is_nodata(nodata) {
            f64::NAN
        } else {
            RasterElement::to_f64(v).unwrap_or(f64::NAN)
        }
    });

    let mut surface = Raster::from_array(values);
    surface.set_transform(*dem.transform());
    surface.set_crs(dem.crs().cloned());
    surface.set_nodata(Some(f64::NAN));

    let lines = contour_lines(&surface, params)?;
    tracing::debug!("{} contour lines traced", lines.len());
    Ok(lines)
}

/// Line layer with `ELEV` and `major` attributes
pub fn contours_to_features(lines: &[ContourLine], crs: Option<CRS>) -> FeatureCollection {
    let mut layer = FeatureCollection::with_fields(
        vec![
            Field::new("ELEV", FieldKind::Real),
            Field::new("major", FieldKind::Boolean),
        ],
        crs,
    );

    for (i, line) in lines.iter().enumerate() {
        let mut feature = Feature::new(Geometry::LineString(line.geometry.clone()))
            .with_id(i.to_string());
        feature.set_property("ELEV", line.elevation);
        feature.set_property("major", line.major);
        layer.push(feature);
    }

    layer
}
