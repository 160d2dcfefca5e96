//! End-to-end runs of the survey tools: GeoJSON in, GeoJSON/CSV/report out.

use std::fs;

use topografia_algorithms::survey::{
    line_survey, polygon_survey, AngleFormat, AreaUnit, SurveyConfig, SurveyContext,
};
use topografia_core::io::{read_geojson, write_csv, write_geojson, write_report, ExportTargets};
use topografia_core::{AttributeValue, CRS};

const PARCELS: &str = r#"{
  "type": "FeatureCollection",
  "crs": { "type": "name", "properties": { "name": "EPSG:32719" } },
  "features": [
    {
      "type": "Feature",
      "id": 7,
      "properties": { "nombre": "lote 7" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[
          [500000, 6300000], [500000, 6300100], [500100, 6300100], [500100, 6300000], [500000, 6300000]
        ]]
      }
    },
    {
      "type": "Feature",
      "id": 8,
      "properties": { "nombre": "sin geometría" },
      "geometry": null
    }
  ]
}"#;

const ROADS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": 1,
      "properties": {},
      "geometry": { "type": "LineString", "coordinates": [[-70.0, -33.0], [-70.0, -32.0], [-69.0, -32.0]] }
    },
    {
      "type": "Feature",
      "id": 2,
      "properties": {},
      "geometry": { "type": "Point", "coordinates": [-70.0, -33.0] }
    }
  ]
}"#;

#[test]
fn polygon_layer_to_csv_geojson_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("parcelas.geojson");
    fs::write(&input, PARCELS).unwrap();

    let layer = read_geojson(&input).unwrap();
    assert_eq!(layer.crs.as_ref().and_then(CRS::epsg), Some(32719));

    let config = SurveyConfig {
        compute_distance: true,
        area_unit: AreaUnit::Hectares,
        ..SurveyConfig::polygon_defaults()
    };
    let ctx = SurveyContext::new("parcelas", layer.crs.clone()).with_timestamp("2024-05-01 10:00:00");
    let out = polygon_survey(&layer, &config, &ctx).unwrap();
    assert_eq!(out.processed, 2);
    assert_eq!(out.skipped, 1);

    let targets = ExportTargets {
        features: Some(dir.path().join("vertices.geojson")),
        csv: Some(dir.path().join("vertices.csv")),
        report: Some(dir.path().join("reporte.txt")),
        print_report: false,
    };
    targets.validate("polygons").unwrap();

    write_geojson(&out.features, targets.features.as_ref().unwrap()).unwrap();
    write_csv(&out.features, targets.csv.as_ref().unwrap()).unwrap();
    write_report(out.report.lines(), targets.report.as_ref().unwrap()).unwrap();

    // Vertex layer survives the round trip with its CRS
    let vertices = read_geojson(targets.features.as_ref().unwrap()).unwrap();
    assert_eq!(vertices.len(), 4);
    assert_eq!(vertices.crs.as_ref().and_then(CRS::epsg), Some(32719));
    assert_eq!(vertices.features[0].get_property("id_pol"), Some(&AttributeValue::Int(7)));

    let csv = fs::read_to_string(targets.csv.as_ref().unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(
        rows[0],
        "id_pol,vertice,x,y,distancia,area,perimetro,ang_int_txt,ang_int_num"
    );
    assert_eq!(rows.len(), 5);
    // Area on the ellipsoid, sides and perimeter on the UTM grid
    assert!(rows[1].starts_with("7,1,500000,6300000,100,1.0008"), "{}", rows[1]);
    assert!(rows[1].contains(",400,"), "{}", rows[1]);
    // Area and perimeter only on the first vertex
    assert!(rows[2].starts_with("7,2,500000,6300100,100,,,"), "{}", rows[2]);

    let report = fs::read_to_string(targets.report.as_ref().unwrap()).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "REPORTE DE CÁLCULOS TOPOGRÁFICOS");
    assert_eq!(lines[1], "Fecha: 2024-05-01 10:00:00");
    assert_eq!(lines[2], "Capa de origen: parcelas");
    assert_eq!(lines[4], "Polígono ID: 7");
    assert_eq!(lines[5], "Área: 1.0008 Hectáreas");
    assert_eq!(lines[6], "Perímetro: 400.0000 metros");
    // Clockwise ring: the counter-clockwise vertex angle is the inside one
    assert!(report.contains("  Vértice 1: Ángulo interno: 90.0000°"));
    assert!(report.contains("  Lado 4-1: Distancia: 100.0000 m"));
}

#[test]
fn multipart_line_segments_stay_inside_parts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("canales.geojson");
    fs::write(
        &input,
        r#"{
          "type": "FeatureCollection",
          "features": [{
            "type": "Feature",
            "id": 3,
            "properties": {},
            "geometry": {
              "type": "MultiLineString",
              "coordinates": [[[0, 0], [1, 0]], [[100, 100], [101, 100]]]
            }
          }]
        }"#,
    )
    .unwrap();

    let layer = read_geojson(&input).unwrap();
    let ctx = SurveyContext::new("canales", None);
    let out = line_survey(&layer, &SurveyConfig::line_defaults(), &ctx).unwrap();

    assert_eq!(out.features.len(), 2);
    let last = &out.features.features[1];
    assert_eq!(last.get_property("long_acum").and_then(AttributeValue::as_f64), Some(2.0));
    assert_eq!(last.get_property("x_ini").and_then(AttributeValue::as_f64), Some(100.0));
}

#[test]
fn projected_coordinates_without_crs_member_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("utm_sin_crs.geojson");
    fs::write(
        &input,
        r#"{
          "type": "FeatureCollection",
          "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "LineString", "coordinates": [[300000, 8500000], [310000, 8500000]] }
          }]
        }"#,
    )
    .unwrap();

    let layer = read_geojson(&input).unwrap();
    assert!(layer.crs.is_none());
    // GeoJSON without a crs member is read as WGS84
    let ctx = SurveyContext::new("utm_sin_crs", Some(layer.crs.clone().unwrap_or_else(CRS::wgs84)));
    let result = line_survey(&layer, &SurveyConfig::line_defaults(), &ctx);
    assert!(matches!(
        result,
        Err(topografia_core::Error::InvalidParameter { name: "crs", .. })
    ));
}

#[test]
fn line_layer_in_geographic_crs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("caminos.geojson");
    fs::write(&input, ROADS).unwrap();

    let layer = read_geojson(&input).unwrap();
    // No crs member: GeoJSON coordinates are WGS84
    let crs = layer.crs.clone().unwrap_or_else(CRS::wgs84);
    let ctx = SurveyContext::new("caminos", Some(crs));
    let config = SurveyConfig {
        angle_format: AngleFormat::Dms,
        decimal_precision: 2,
        ..SurveyConfig::line_defaults()
    };

    let out = line_survey(&layer, &config, &ctx).unwrap();
    assert_eq!(out.processed, 2);
    assert_eq!(out.skipped, 1);
    assert_eq!(out.features.len(), 2);
    assert_eq!(out.features.crs.as_ref().and_then(CRS::epsg), Some(4326));

    // One degree of latitude is about 111 km, ellipsoidal
    let first = &out.features.features[0];
    let length = first.get_property("longitud").and_then(AttributeValue::as_f64).unwrap();
    assert!((110_000.0..112_000.0).contains(&length), "{}", length);
    assert_eq!(
        first.get_property("rumbo_txt"),
        Some(&AttributeValue::String("N 0.00° E".into()))
    );

    let second = &out.features.features[1];
    let acc = second.get_property("long_acum").and_then(AttributeValue::as_f64).unwrap();
    assert!(acc > length * 1.5, "{}", acc);

    let csv_path = dir.path().join("segmentos.csv");
    write_csv(&out.features, &csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("id_linea,segmento,x_ini,y_ini,x_fin,y_fin,longitud,long_acum,"));
    assert_eq!(csv.lines().count(), 3);

    let text = out.report.to_string();
    assert!(text.contains("Segmento 2:"));
    assert!(text.contains("  Azimut: 90° 0' 0.00\""), "{}", text);
}
