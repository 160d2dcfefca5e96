//! Polygon survey: angles, azimuths, bearings, sides, area and perimeter
//!
//! Each polygon corner becomes a point feature. Rings are walked in their
//! stored order with wrap-around neighbours, so the side leaving the last
//! corner closes back to the first.

use geo::{Coord, Point};
use topografia_core::{Algorithm, Error, Feature, FeatureCollection, Field, FieldKind, Result};

use super::angle::format_angle;
use super::azimuth::{azimuth, bearing};
use super::config::SurveyConfig;
use super::geometry::{
    distinct_vertex_count, planar_distance, polygon_rings, ring_perimeter, vertex_angles,
};
use super::report::Report;
use super::{SurveyContext, SurveyInput, SurveyOutput};

const REPORT_TITLE: &str = "REPORTE DE CÁLCULOS TOPOGRÁFICOS";

/// Parameters for [`PolygonSurvey`]
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonParams {
    pub config: SurveyConfig,
}

impl Default for PolygonParams {
    fn default() -> Self {
        Self {
            config: SurveyConfig::polygon_defaults(),
        }
    }
}

/// Polygon survey tool
#[derive(Debug, Clone, Default)]
pub struct PolygonSurvey;

impl Algorithm for PolygonSurvey {
    type Input = SurveyInput;
    type Output = SurveyOutput;
    type Params = PolygonParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PolygonSurvey"
    }

    fn description(&self) -> &'static str {
        "Interior/exterior angles, azimuths, bearings, sides, area and perimeter of polygons"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        polygon_survey(&input.layer, &params.config, &input.context)
    }
}

/// Output columns for the selected calculations, in table order
pub fn polygon_fields(config: &SurveyConfig) -> Vec<Field> {
    let mut fields = vec![
        Field::new("id_pol", FieldKind::Integer),
        Field::new("vertice", FieldKind::Integer),
        Field::new("x", FieldKind::Real),
        Field::new("y", FieldKind::Real),
    ];
    if config.compute_distance {
        fields.push(Field::new("distancia", FieldKind::Real));
    }
    if config.compute_accumulated_distance {
        fields.push(Field::new("dist_acum", FieldKind::Real));
    }
    if config.compute_area {
        fields.push(Field::new("area", FieldKind::Real));
    }
    if config.compute_perimeter {
        fields.push(Field::new("perimetro", FieldKind::Real));
    }
    let angle_pairs = [
        (config.compute_interior, "ang_int"),
        (config.compute_exterior, "ang_ext"),
        (config.compute_azimuth, "azimut"),
        (config.compute_bearing, "rumbo"),
    ];
    for (enabled, prefix) in angle_pairs {
        if enabled {
            fields.push(Field::new(format!("{}_txt", prefix), FieldKind::Text));
            fields.push(Field::new(format!("{}_num", prefix), FieldKind::Real));
        }
    }
    fields
}

/// Run the polygon survey over a layer
pub fn polygon_survey(
    layer: &FeatureCollection,
    config: &SurveyConfig,
    ctx: &SurveyContext,
) -> Result<SurveyOutput> {
    polygon_survey_with_progress(layer, config, ctx, |_, _| {})
}

/// Run the polygon survey, calling `progress(done, total)` after each feature
pub fn polygon_survey_with_progress<F>(
    layer: &FeatureCollection,
    config: &SurveyConfig,
    ctx: &SurveyContext,
    mut progress: F,
) -> Result<SurveyOutput>
where
    F: FnMut(usize, usize),
{
    config.validate_polygon()?;

    let crs = layer.crs.clone().or_else(|| ctx.measurer.crs().cloned());
    let mut features = FeatureCollection::with_fields(polygon_fields(config), crs);
    let mut report = Report::with_header(REPORT_TITLE, ctx.timestamp.as_deref(), &ctx.layer_name);
    let total = layer.len();
    let mut processed = 0;
    let mut skipped = 0;

    for (index, feature) in layer.iter().enumerate() {
        let id = feature.numeric_id(index as i64);
        match survey_polygon(feature, id, config, ctx)? {
            Some((points, lines)) => {
                features.features.extend(points);
                report.extend(lines);
            }
            None => {
                tracing::debug!("polygon {} skipped: empty or fewer than 3 distinct vertices", id);
                skipped += 1;
            }
        }
        processed += 1;
        progress(processed, total);
    }

    tracing::debug!(
        "polygon survey: {} features, {} vertices, {} skipped",
        processed,
        features.len(),
        skipped
    );

    Ok(SurveyOutput {
        features,
        report,
        processed,
        skipped,
    })
}

/// Vertex features and report section for one polygon, `None` when unusable
fn survey_polygon(
    feature: &Feature,
    id: i64,
    config: &SurveyConfig,
    ctx: &SurveyContext,
) -> Result<Option<(Vec<Feature>, Report)>> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Ok(None);
    };
    let rings = polygon_rings(geometry);
    let vertices: Vec<Coord<f64>> = rings.iter().flatten().copied().collect();
    let n = vertices.len();
    if distinct_vertex_count(&vertices) < 3 {
        return Ok(None);
    }

    let prec = config.decimal_precision;
    let area = if config.compute_area {
        Some(config.area_unit.convert(ctx.measurer.measure_area(geometry)?))
    } else {
        None
    };
    let perimeter = config
        .compute_perimeter
        .then(|| rings.iter().map(|r| ring_perimeter(r)).sum::<f64>());

    let mut report = Report::default();
    report.push(format!("Polígono ID: {}", id));
    if let Some(a) = area {
        report.push(format!("Área: {:.*} {}", prec, a, config.area_unit.label()));
    }
    if let Some(p) = perimeter {
        report.push(format!("Perímetro: {:.*} metros", prec, p));
    }
    report.push("Vértices:");

    let mut points = Vec::with_capacity(n);
    let mut accumulated = 0.0;

    for i in 0..n {
        let p0 = vertices[(i + n - 1) % n];
        let p1 = vertices[i];
        let p2 = vertices[(i + 1) % n];

        let side = planar_distance(p1, p2);
        accumulated += side;
        let angles = vertex_angles(p0, p1, p2);
        let az = azimuth(p1, p2);
        let side_label = format!("{}-{}", i + 1, if i + 2 <= n { i + 2 } else { 1 });

        let mut point = Feature::new(Point::from(p1).into());
        point.set_property("id_pol", id);
        point.set_property("vertice", (i + 1) as i64);
        point.set_property("x", p1.x);
        point.set_property("y", p1.y);

        if config.compute_distance {
            point.set_property("distancia", side);
        }
        if config.compute_accumulated_distance {
            point.set_property("dist_acum", accumulated);
        }
        if config.compute_area {
            point.set_property("area", area.filter(|_| i == 0));
        }
        if config.compute_perimeter {
            point.set_property("perimetro", perimeter.filter(|_| i == 0));
        }

        if config.compute_interior {
            let a = format_angle(angles.interior, config.angle_format, prec);
            report.push(format!("  Vértice {}: Ángulo interno: {}", i + 1, a.text));
            point.set_property("ang_int_txt", a.text);
            point.set_property("ang_int_num", a.value);
        }
        if config.compute_exterior {
            let a = format_angle(angles.exterior, config.angle_format, prec);
            report.push(format!("  Vértice {}: Ángulo externo: {}", i + 1, a.text));
            point.set_property("ang_ext_txt", a.text);
            point.set_property("ang_ext_num", a.value);
        }
        if config.compute_azimuth {
            let a = format_angle(az, config.angle_format, prec);
            report.push(format!("  Lado {}: Azimut: {}", side_label, a.text));
            point.set_property("azimut_txt", a.text);
            point.set_property("azimut_num", a.value);
        }
        if config.compute_bearing {
            let b = bearing(az, prec);
            report.push(format!("  Lado {}: Rumbo: {}", side_label, b));
            point.set_property("rumbo_txt", b);
            point.set_property("rumbo_num", az.to_degrees());
        }
        if config.compute_distance {
            report.push(format!("  Lado {}: Distancia: {:.*} m", side_label, prec, side));
        }
        if config.compute_accumulated_distance {
            report.push(format!(
                "  Distancia acumulada hasta vértice {}: {:.*} m",
                i + 1,
                prec,
                accumulated
            ));
        }

        points.push(point);
    }

    report.blank();
    Ok(Some((points, report)))
}
