//! Line survey: per-segment length, azimuth and bearing
//!
//! Segment lengths go through the layer's [`DistanceArea`](super::DistanceArea),
//! so they are ellipsoidal metres whenever the CRS allows it. Polygon sides,
//! by contrast, are always planar. Multi-part lines are walked part by part:
//! segment numbers and the accumulated length run across the whole feature,
//! but no segment joins two parts.

use geo::{Coord, Point};
use topografia_core::{Algorithm, Error, Feature, FeatureCollection, Field, FieldKind, Result};

use super::angle::format_angle;
use super::azimuth::{azimuth, bearing};
use super::config::SurveyConfig;
use super::geometry::line_parts;
use super::report::Report;
use super::{SurveyContext, SurveyInput, SurveyOutput};

const REPORT_TITLE: &str = "REPORTE DE CÁLCULOS DE LÍNEAS";

/// Parameters for [`LineSurvey`]
#[derive(Debug, Clone, PartialEq)]
pub struct LineParams {
    pub config: SurveyConfig,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            config: SurveyConfig::line_defaults(),
        }
    }
}

/// Line survey tool
#[derive(Debug, Clone, Default)]
pub struct LineSurvey;

impl Algorithm for LineSurvey {
    type Input = SurveyInput;
    type Output = SurveyOutput;
    type Params = LineParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "LineSurvey"
    }

    fn description(&self) -> &'static str {
        "Length, accumulated length, azimuth and bearing of each line segment"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        line_survey(&input.layer, &params.config, &input.context)
    }
}

/// Output columns for the selected calculations, in table order
pub fn line_fields(config: &SurveyConfig) -> Vec<Field> {
    let mut fields = vec![
        Field::new("id_linea", FieldKind::Integer),
        Field::new("segmento", FieldKind::Integer),
        Field::new("x_ini", FieldKind::Real),
        Field::new("y_ini", FieldKind::Real),
        Field::new("x_fin", FieldKind::Real),
        Field::new("y_fin", FieldKind::Real),
    ];
    if config.compute_distance {
        fields.push(Field::new("longitud", FieldKind::Real));
    }
    if config.compute_accumulated_distance {
        fields.push(Field::new("long_acum", FieldKind::Real));
    }
    if config.compute_azimuth {
        fields.push(Field::new("azimut_txt", FieldKind::Text));
        fields.push(Field::new("azimut_num", FieldKind::Real));
    }
    if config.compute_bearing {
        fields.push(Field::new("rumbo_txt", FieldKind::Text));
        fields.push(Field::new("rumbo_num", FieldKind::Real));
    }
    fields
}

/// Run the line survey over a layer
pub fn line_survey(
    layer: &FeatureCollection,
    config: &SurveyConfig,
    ctx: &SurveyContext,
) -> Result<SurveyOutput> {
    line_survey_with_progress(layer, config, ctx, |_, _| {})
}

/// Run the line survey, calling `progress(done, total)` after each feature
pub fn line_survey_with_progress<F>(
    layer: &FeatureCollection,
    config: &SurveyConfig,
    ctx: &SurveyContext,
    mut progress: F,
) -> Result<SurveyOutput>
where
    F: FnMut(usize, usize),
{
    config.validate_line()?;

    if ctx.measurer.will_use_ellipsoid() {
        tracing::debug!("measuring segment lengths on the WGS84 ellipsoid");
    }

    let crs = layer.crs.clone().or_else(|| ctx.measurer.crs().cloned());
    let mut features = FeatureCollection::with_fields(line_fields(config), crs);
    let mut report = Report::with_header(REPORT_TITLE, ctx.timestamp.as_deref(), &ctx.layer_name);
    let total = layer.len();
    let mut processed = 0;
    let mut skipped = 0;

    for (index, feature) in layer.iter().enumerate() {
        let id = feature.numeric_id(index as i64);
        let parts: Vec<Vec<Coord<f64>>> = feature
            .geometry
            .as_ref()
            .map(line_parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|part| part.len() >= 2)
            .collect();

        if parts.is_empty() {
            tracing::debug!("line {} skipped: empty or fewer than 2 vertices", id);
            skipped += 1;
        } else {
            let (points, lines) = survey_line(&parts, id, config, ctx)?;
            features.features.extend(points);
            report.extend(lines);
        }

        processed += 1;
        progress(processed, total);
    }

    Ok(SurveyOutput {
        features,
        report,
        processed,
        skipped,
    })
}

fn survey_line(
    parts: &[Vec<Coord<f64>>],
    id: i64,
    config: &SurveyConfig,
    ctx: &SurveyContext,
) -> Result<(Vec<Feature>, Report)> {
    let prec = config.decimal_precision;
    let segments: Vec<(Coord<f64>, Coord<f64>)> = parts
        .iter()
        .flat_map(|part| part.windows(2).map(|pair| (pair[0], pair[1])))
        .collect();

    let mut report = Report::default();
    report.push(format!("Línea ID: {}", id));
    report.push(format!("Número de segmentos: {}", segments.len()));

    let mut points = Vec::with_capacity(segments.len());
    let mut accumulated = 0.0;

    for (i, &(start, end)) in segments.iter().enumerate() {
        let length = ctx.measurer.measure_line(start, end)?;
        accumulated += length;
        let az = azimuth(start, end);
        let midpoint = Coord {
            x: (start.x + end.x) / 2.0,
            y: (start.y + end.y) / 2.0,
        };

        let mut point = Feature::new(Point::from(midpoint).into());
        point.set_property("id_linea", id);
        point.set_property("segmento", (i + 1) as i64);
        point.set_property("x_ini", start.x);
        point.set_property("y_ini", start.y);
        point.set_property("x_fin", end.x);
        point.set_property("y_fin", end.y);

        report.blank();
        report.push(format!("Segmento {}:", i + 1));
        report.push(format!("  Punto inicio: ({:.*}, {:.*})", prec, start.x, prec, start.y));
        report.push(format!("  Punto fin: ({:.*}, {:.*})", prec, end.x, prec, end.y));

        if config.compute_distance {
            point.set_property("longitud", length);
            report.push(format!("  Longitud: {:.*} m", prec, length));
        }
        if config.compute_accumulated_distance {
            point.set_property("long_acum", accumulated);
            report.push(format!("  Longitud acumulada: {:.*} m", prec, accumulated));
        }
        if config.compute_azimuth {
            let a = format_angle(az, config.angle_format, prec);
            report.push(format!("  Azimut: {}", a.text));
            point.set_property("azimut_txt", a.text);
            point.set_property("azimut_num", az.to_degrees());
        }
        if config.compute_bearing {
            let b = bearing(az, prec);
            report.push(format!("  Rumbo: {}", b));
            point.set_property("rumbo_txt", b);
            point.set_property("rumbo_num", az.to_degrees());
        }

        points.push(point);
    }

    report.blank();
    report.push("=".repeat(50));
    report.blank();
    Ok((points, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::AngleFormat;
    use approx::assert_relative_eq;
    use geo::{Geometry, LineString, MultiLineString};
    use topografia_core::{AttributeValue, CRS};

    fn layer(lines: Vec<Geometry<f64>>) -> FeatureCollection {
        let mut fc = FeatureCollection::new();
        for g in lines {
            fc.push(Feature::new(g));
        }
        fc
    }

    fn num(f: &Feature, key: &str) -> f64 {
        f.get_property(key).and_then(AttributeValue::as_f64).unwrap()
    }

    fn diagonal() -> Geometry<f64> {
        LineString::from(vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0)]).into()
    }

    #[test]
    fn test_segments_and_midpoints() {
        let out = line_survey(
            &layer(vec![diagonal()]),
            &SurveyConfig::line_defaults(),
            &SurveyContext::default(),
        )
        .unwrap();

        assert_eq!(out.features.len(), 2);
        let first = &out.features.features[0];
        assert_eq!(first.geometry, Some(Point::new(5.0, 5.0).into()));
        assert_relative_eq!(num(first, "longitud"), 200f64.sqrt());
        assert_relative_eq!(num(first, "azimut_num"), 45.0, epsilon = 1e-9);
        assert_eq!(
            first.get_property("rumbo_txt"),
            Some(&AttributeValue::from("N 45.0000° E"))
        );

        let second = &out.features.features[1];
        assert_eq!(second.get_property("segmento"), Some(&AttributeValue::Int(2)));
        assert_relative_eq!(num(second, "long_acum"), 200f64.sqrt() + 10.0);
        assert_relative_eq!(num(second, "x_ini"), 10.0);
        assert_relative_eq!(num(second, "y_fin"), 0.0);
    }

    #[test]
    fn test_accumulation_without_length_column() {
        let cfg = SurveyConfig {
            compute_distance: false,
            ..SurveyConfig::line_defaults()
        };
        let out = line_survey(&layer(vec![diagonal()]), &cfg, &SurveyContext::default()).unwrap();

        let names: Vec<&str> = out.features.field_names().collect();
        assert!(!names.contains(&"longitud"));
        assert_relative_eq!(
            num(&out.features.features[1], "long_acum"),
            200f64.sqrt() + 10.0
        );
    }

    #[test]
    fn test_single_point_line_is_skipped() {
        let single: Geometry<f64> = LineString::from(vec![(3.0, 3.0)]).into();
        let out = line_survey(
            &layer(vec![single, diagonal()]),
            &SurveyConfig::line_defaults(),
            &SurveyContext::default(),
        )
        .unwrap();

        assert_eq!(out.processed, 2);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.features.len(), 2);
        // Second feature keeps its positional id
        assert_eq!(
            out.features.features[0].get_property("id_linea"),
            Some(&AttributeValue::Int(1))
        );
    }

    #[test]
    fn test_multilinestring_parts_are_not_joined() {
        let mls = MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            LineString::from(vec![(100.0, 100.0), (101.0, 100.0)]),
        ]);
        let out = line_survey(
            &layer(vec![mls.into()]),
            &SurveyConfig::line_defaults(),
            &SurveyContext::default(),
        )
        .unwrap();

        assert_eq!(out.features.len(), 2);
        let second = &out.features.features[1];
        assert_eq!(second.get_property("segmento"), Some(&AttributeValue::Int(2)));
        assert_relative_eq!(num(second, "x_ini"), 100.0);
        assert_relative_eq!(num(second, "longitud"), 1.0);
        // Accumulated length carries over between parts
        assert_relative_eq!(num(second, "long_acum"), 2.0);
        assert!(out.report.lines().contains(&"Número de segmentos: 2".to_string()));
    }

    #[test]
    fn test_single_vertex_part_is_ignored() {
        let mls = MultiLineString::new(vec![
            LineString::from(vec![(5.0, 5.0)]),
            LineString::from(vec![(0.0, 0.0), (3.0, 4.0)]),
        ]);
        let out = line_survey(
            &layer(vec![mls.into()]),
            &SurveyConfig::line_defaults(),
            &SurveyContext::default(),
        )
        .unwrap();
        assert_eq!(out.skipped, 0);
        assert_eq!(out.features.len(), 1);
        assert_relative_eq!(num(&out.features.features[0], "longitud"), 5.0);
    }

    #[test]
    fn test_utm_layer_lengths_on_ellipsoid() {
        let mut fc = layer(vec![LineString::from(vec![
            (495_000.0, 6_300_000.0),
            (505_000.0, 6_300_000.0),
        ])
        .into()]);
        fc.crs = Some(CRS::from_epsg(32719));
        let ctx = SurveyContext::new("ejes", fc.crs.clone());

        let out = line_survey(&fc, &SurveyConfig::line_defaults(), &ctx).unwrap();
        let length = num(&out.features.features[0], "longitud");
        // Ground distance, longer than the 10 km on the grid
        assert!((10_003.0..10_005.0).contains(&length), "length = {}", length);
        // Azimuths stay on the grid
        assert_relative_eq!(num(&out.features.features[0], "azimut_num"), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projected_coordinates_labelled_geographic_fail() {
        let mut fc = layer(vec![LineString::from(vec![
            (300_000.0, 8_500_000.0),
            (310_000.0, 8_500_000.0),
        ])
        .into()]);
        fc.crs = Some(CRS::wgs84());
        let ctx = SurveyContext::new("caminos", fc.crs.clone());

        let result = line_survey(&fc, &SurveyConfig::line_defaults(), &ctx);
        assert!(matches!(result, Err(Error::InvalidParameter { name: "crs", .. })));
    }

    #[test]
    fn test_geographic_layer_lengths_in_metres() {
        let mut fc = layer(vec![LineString::from(vec![(0.0, 0.0), (0.0, 1.0)]).into()]);
        fc.crs = Some(CRS::wgs84());
        let ctx = SurveyContext::new("caminos", fc.crs.clone());

        let out = line_survey(&fc, &SurveyConfig::line_defaults(), &ctx).unwrap();
        let length = num(&out.features.features[0], "longitud");
        // One degree of latitude at the equator
        assert!((110_500.0..110_650.0).contains(&length), "length = {}", length);
        assert_eq!(out.features.crs.as_ref().and_then(CRS::epsg), Some(4326));
    }

    #[test]
    fn test_report_layout() {
        let cfg = SurveyConfig {
            angle_format: AngleFormat::Dms,
            decimal_precision: 2,
            ..SurveyConfig::line_defaults()
        };
        let ctx = SurveyContext::new("ejes", None).with_timestamp("2024-05-01 10:00:00");
        let out = line_survey(&layer(vec![diagonal()]), &cfg, &ctx).unwrap();
        let lines = out.report.lines();

        assert_eq!(lines[0], "REPORTE DE CÁLCULOS DE LÍNEAS");
        assert_eq!(lines[4], "Línea ID: 0");
        assert_eq!(lines[5], "Número de segmentos: 2");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "Segmento 1:");
        assert_eq!(lines[8], "  Punto inicio: (0.00, 0.00)");
        assert_eq!(lines[9], "  Punto fin: (10.00, 10.00)");
        assert_eq!(lines[10], "  Longitud: 14.14 m");
        assert_eq!(lines[11], "  Longitud acumulada: 14.14 m");
        assert_eq!(lines[12], "  Azimut: 45° 0' 0.00\"");
        assert_eq!(lines[13], "  Rumbo: N 45.00° E");
        assert!(lines.contains(&"=".repeat(50)));
    }

    #[test]
    fn test_area_only_config_rejected() {
        let cfg = SurveyConfig {
            compute_area: true,
            ..Default::default()
        };
        let result = line_survey(&layer(vec![diagonal()]), &cfg, &SurveyContext::default());
        assert!(matches!(result, Err(Error::NoCalculationSelected)));
    }

    #[test]
    fn test_algorithm_trait() {
        let input = SurveyInput {
            layer: layer(vec![diagonal()]),
            context: SurveyContext::default(),
        };
        let out = LineSurvey.execute_default(input).unwrap();
        assert_eq!(out.features.len(), 2);
        assert_eq!(LineSurvey.name(), "LineSurvey");
    }
}
